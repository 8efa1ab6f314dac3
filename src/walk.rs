use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;
use walkdir::WalkDir;

/// The bundle root was missing or not a directory. Fatal to the whole run;
/// everything else the walker hits is skipped, not surfaced.
#[derive(Error, Debug)]
#[error("bundle root does not exist or is not a directory: {0}")]
pub struct MissingRootError(pub PathBuf);

/// Eagerly collect every regular file under `root`, recursively.
///
/// Directories are excluded from the result; symlinks are not followed and
/// unreadable entries are skipped. Bundle trees are modest in size, so the
/// full list is materialized up front.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>, MissingRootError> {
    if !root.is_dir() {
        return Err(MissingRootError(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
