use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use prefix_patcher::{
    classify, list_files, patch_tree, scan_tree, FileKind, PatchOutcome, PrefixPair,
    ProvisionMarker, ScanReport,
};
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "prefix-patcher")]
#[command(about = "Relocate hardcoded path prefixes inside a pre-built bundle", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the prefix in every script and ELF binary under the root
    Apply {
        /// Bundle root directory
        #[arg(short, long)]
        root: PathBuf,

        /// Prefix baked into the bundle
        #[arg(long)]
        old: String,

        /// Prefix the bundle is being relocated to
        #[arg(long)]
        new: String,

        /// Re-run even if this bundle was already provisioned
        #[arg(short, long)]
        force: bool,

        /// Provisioning version recorded after a successful run
        #[arg(long, default_value_t = 1)]
        provision_version: u32,

        /// Show unified diffs of changed text files
        #[arg(short, long)]
        diff: bool,

        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Report what apply would change, without touching any file
    Scan {
        /// Bundle root directory
        #[arg(short, long)]
        root: PathBuf,

        /// Prefix baked into the bundle
        #[arg(long)]
        old: String,

        /// Prefix the bundle is being relocated to
        #[arg(long)]
        new: String,

        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            root,
            old,
            new,
            force,
            provision_version,
            diff,
            json,
        } => cmd_apply(&root, old, new, force, provision_version, diff, json),

        Commands::Scan {
            root,
            old,
            new,
            json,
        } => cmd_scan(&root, old, new, json),
    }
}

fn cmd_apply(
    root: &Path,
    old: String,
    new: String,
    force: bool,
    provision_version: u32,
    show_diff: bool,
    json: bool,
) -> Result<()> {
    let pair = PrefixPair::new(old, new);
    let marker = ProvisionMarker::for_root(root);

    if marker.is_current(provision_version) && !force {
        println!(
            "{}",
            format!(
                "Bundle already provisioned at version {} (use --force to re-run)",
                marker.recorded_version()
            )
            .yellow()
        );
        return Ok(());
    }

    // Capture text-file contents before patching so diffs can be shown
    // afterwards. Only text files: object-file diffs are byte noise.
    let mut contents_before: HashMap<PathBuf, String> = HashMap::new();
    if show_diff {
        for path in list_files(root)? {
            if classify(&path) == FileKind::Text {
                if let Ok(content) = fs::read_to_string(&path) {
                    contents_before.insert(path, content);
                }
            }
        }
    }

    let report = patch_tree(root, &pair)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_report(&report, "Applied");

        if show_diff {
            for outcome in &report.outcomes {
                if !outcome.changed() {
                    continue;
                }
                if let Some(before) = contents_before.get(outcome.path()) {
                    if let Ok(after) = fs::read_to_string(outcome.path()) {
                        display_diff(outcome.path(), before, &after);
                    }
                }
            }
        }
    }

    if !report.success() {
        std::process::exit(1);
    }

    marker.record(provision_version)?;
    Ok(())
}

fn cmd_scan(root: &Path, old: String, new: String, json: bool) -> Result<()> {
    let pair = PrefixPair::new(old, new);
    let report = scan_tree(root, &pair)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_report(&report, "Would patch");
    }

    if !report.success() {
        std::process::exit(1);
    }
    Ok(())
}

fn display_report(report: &ScanReport, patched_verb: &str) {
    let mut unchanged = 0;
    let mut skipped = 0;

    for outcome in &report.outcomes {
        match outcome {
            PatchOutcome::Patched { path, occurrences } => {
                println!(
                    "{} {patched_verb} {} ({occurrences} occurrences)",
                    "✓".green(),
                    path.display()
                );
            }
            PatchOutcome::Unchanged { .. } => unchanged += 1,
            PatchOutcome::SkippedNoSpace { path, occurrences } => {
                println!(
                    "{} Skipped {} ({occurrences} occurrences, insufficient space)",
                    "⊘".yellow(),
                    path.display()
                );
                skipped += 1;
            }
            PatchOutcome::Failed { path, reason } => {
                eprintln!("{} Failed {}: {reason}", "✗".red(), path.display());
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} patched", format!("{}", report.files_patched).green());
    println!("  {} unchanged", format!("{unchanged}").dimmed());
    println!("  {} skipped (no space)", format!("{skipped}").yellow());
    println!("  {} failed", format!("{}", report.files_failed).red());
}

fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{sign}");
    }
}
