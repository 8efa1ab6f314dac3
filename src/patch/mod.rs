//! Per-file patchers: UTF-8 text substitution and offset-preserving
//! substitution inside ELF object files.

pub mod binary;
pub mod errors;
pub mod text;

pub use binary::{
    blocked_occurrences, patch_object_file, scan_object_file, BlockedOccurrence, ObjectPatch,
};
pub use errors::PatchError;
pub use text::{patch_text_file, scan_text_file};

use std::io::Write;
use std::path::Path;

/// Atomic file write: tempfile in the same directory + fsync + rename.
///
/// Either the full write lands or the original file is untouched.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<(), PatchError> {
    let write_err = |source| PatchError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().ok_or_else(|| {
        write_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    temp.write_all(content).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}
