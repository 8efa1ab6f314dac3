use std::path::PathBuf;
use thiserror::Error;

/// Per-file patch failures.
///
/// The orchestrator recovers from every variant: a failing file becomes a
/// `Failed` outcome in the report and the run moves on to the next file.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed UTF-8 in a file classified as text. Treated as a read
    /// failure; no reconciliation is attempted.
    #[error("{path} is not valid UTF-8: {source}")]
    Utf8 {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
}
