//! Whole-tree orchestration: walk the bundle, classify each file, dispatch
//! to the matching patcher, and fold per-file outcomes into a report.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use serde::Serialize;

use crate::classify::{classify, FileKind};
use crate::patch::{
    patch_object_file, patch_text_file, scan_object_file, scan_text_file, ObjectPatch, PatchError,
};
use crate::prefix::PrefixPair;
use crate::walk::{list_files, MissingRootError};

/// Result of patching (or scanning) a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// At least one occurrence of the old prefix was rewritten.
    Patched { path: PathBuf, occurrences: usize },
    /// No occurrence of the old prefix was found; file left untouched.
    Unchanged { path: PathBuf },
    /// Occurrences were found, but none could be rewritten without
    /// overrunning its enclosing string extent. Not a failure.
    SkippedNoSpace { path: PathBuf, occurrences: usize },
    /// The file could not be read or written back.
    Failed { path: PathBuf, reason: String },
}

impl PatchOutcome {
    pub fn path(&self) -> &Path {
        match self {
            PatchOutcome::Patched { path, .. }
            | PatchOutcome::Unchanged { path }
            | PatchOutcome::SkippedNoSpace { path, .. }
            | PatchOutcome::Failed { path, .. } => path,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, PatchOutcome::Patched { .. })
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOutcome::Patched { path, occurrences } => {
                write!(f, "patched {} ({occurrences} occurrences)", path.display())
            }
            PatchOutcome::Unchanged { path } => {
                write!(f, "unchanged {}", path.display())
            }
            PatchOutcome::SkippedNoSpace { path, occurrences } => {
                write!(
                    f,
                    "skipped {} ({occurrences} occurrences, insufficient space)",
                    path.display()
                )
            }
            PatchOutcome::Failed { path, reason } => {
                write!(f, "failed {}: {reason}", path.display())
            }
        }
    }
}

/// Aggregate of one orchestrator invocation. Created fresh per run,
/// reported to the caller, then discarded; holds no persistent state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub files_patched: usize,
    pub files_failed: usize,
    pub outcomes: Vec<PatchOutcome>,
}

impl ScanReport {
    /// Overall success: no per-file failures. Files skipped by design — no
    /// occurrence, or no space for a grown replacement — do not count.
    pub fn success(&self) -> bool {
        self.files_failed == 0
    }

    fn record(&mut self, outcome: PatchOutcome) {
        match &outcome {
            PatchOutcome::Patched { .. } => self.files_patched += 1,
            PatchOutcome::Failed { .. } => self.files_failed += 1,
            PatchOutcome::Unchanged { .. } | PatchOutcome::SkippedNoSpace { .. } => {}
        }
        self.outcomes.push(outcome);
    }
}

/// Rewrite the old prefix to the new one in every text and ELF file under
/// `root`.
///
/// Short-circuits with an empty success report when the prefixes are
/// identical. A missing root is fatal; any per-file error is converted into
/// a `Failed` outcome and never aborts the remaining files.
pub fn patch_tree(root: &Path, pair: &PrefixPair) -> Result<ScanReport, MissingRootError> {
    run_tree(root, pair, Mode::Patch)
}

/// Read-only mirror of [`patch_tree`]: reports what a mutating run would
/// do, without touching any file.
pub fn scan_tree(root: &Path, pair: &PrefixPair) -> Result<ScanReport, MissingRootError> {
    run_tree(root, pair, Mode::Scan)
}

#[derive(Clone, Copy)]
enum Mode {
    Patch,
    Scan,
}

fn run_tree(root: &Path, pair: &PrefixPair, mode: Mode) -> Result<ScanReport, MissingRootError> {
    if pair.is_noop() {
        info!("old and new prefixes match, nothing to patch");
        return Ok(ScanReport::default());
    }

    info!("relocating bundle under {}: {pair}", root.display());

    let files = list_files(root)?;
    debug!("found {} files to check", files.len());

    let mut report = ScanReport::default();
    for path in files {
        match classify(&path) {
            FileKind::Text => {
                let result = match mode {
                    Mode::Patch => patch_text_file(&path, pair),
                    Mode::Scan => scan_text_file(&path, pair),
                };
                report.record(text_outcome(path, result));
            }
            FileKind::ObjectBinary => {
                let result = match mode {
                    Mode::Patch => patch_object_file(&path, pair),
                    Mode::Scan => scan_object_file(&path, pair),
                };
                report.record(object_outcome(path, result));
            }
            FileKind::Unknown => {}
        }
    }

    info!(
        "relocation complete: {} files patched, {} failed",
        report.files_patched, report.files_failed
    );
    Ok(report)
}

fn text_outcome(path: PathBuf, result: Result<usize, PatchError>) -> PatchOutcome {
    match result {
        Ok(0) => PatchOutcome::Unchanged { path },
        Ok(occurrences) => PatchOutcome::Patched { path, occurrences },
        Err(err) => failed(path, err),
    }
}

fn object_outcome(path: PathBuf, result: Result<ObjectPatch, PatchError>) -> PatchOutcome {
    match result {
        Ok(ObjectPatch { replaced, .. }) if replaced > 0 => PatchOutcome::Patched {
            path,
            occurrences: replaced,
        },
        Ok(ObjectPatch { skipped, .. }) if skipped > 0 => PatchOutcome::SkippedNoSpace {
            path,
            occurrences: skipped,
        },
        Ok(_) => PatchOutcome::Unchanged { path },
        Err(err) => failed(path, err),
    }
}

fn failed(path: PathBuf, err: PatchError) -> PatchOutcome {
    error!("{err}");
    PatchOutcome::Failed {
        path,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const OLD: &str = "/data/data/com.termux";
    const NEW_SAME_LEN: &str = "/data/data/com.pocket";

    fn pair() -> PrefixPair {
        PrefixPair::new(OLD, NEW_SAME_LEN)
    }

    #[test]
    fn test_noop_short_circuits_without_walking() {
        // The root does not exist; a no-op pair must not even look at it.
        let noop = PrefixPair::new(OLD, OLD);
        let report = patch_tree(Path::new("/nonexistent/root"), &noop).unwrap();
        assert!(report.success());
        assert_eq!(report.files_patched, 0);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = patch_tree(&dir.path().join("absent"), &pair());
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_files_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let blob = dir.path().join("data.db");
        fs::write(&blob, format!("x{OLD}x")).unwrap();

        let report = patch_tree(dir.path(), &pair()).unwrap();
        assert!(report.outcomes.is_empty());
        assert_eq!(fs::read_to_string(&blob).unwrap(), format!("x{OLD}x"));
    }

    #[test]
    fn test_per_file_failure_does_not_abort_the_run() {
        let dir = tempfile::tempdir().unwrap();
        // Sorts before ok.sh in the walk on most platforms, but the loop
        // must survive it either way.
        fs::write(dir.path().join("broken.txt"), b"\xff\xfe bad utf8").unwrap();
        fs::write(dir.path().join("ok.sh"), format!("PREFIX={OLD}\n")).unwrap();

        let report = patch_tree(dir.path(), &pair()).unwrap();
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.files_patched, 1);
        assert!(!report.success());

        let patched = fs::read_to_string(dir.path().join("ok.sh")).unwrap();
        assert_eq!(patched, format!("PREFIX={NEW_SAME_LEN}\n"));
    }

    #[test]
    fn test_scan_reports_without_mutating() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("env.sh");
        let body = format!("A={OLD}\nB={OLD}\n");
        fs::write(&script, &body).unwrap();

        let report = scan_tree(dir.path(), &pair()).unwrap();
        assert_eq!(report.files_patched, 1);
        assert!(matches!(
            report.outcomes[0],
            PatchOutcome::Patched { occurrences: 2, .. }
        ));
        assert_eq!(fs::read_to_string(&script).unwrap(), body);
    }

    #[test]
    fn test_report_counts_match_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.sh"), format!("{OLD}\n")).unwrap();
        fs::write(dir.path().join("b.sh"), "no occurrence\n").unwrap();

        let report = patch_tree(dir.path(), &pair()).unwrap();
        assert_eq!(report.files_patched, 1);
        assert_eq!(report.files_failed, 0);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.success());
    }
}
