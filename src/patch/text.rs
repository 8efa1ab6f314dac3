//! Whole-file substitution for script and config artifacts.
//!
//! Text files are not offset-sensitive, so the old and new prefixes may
//! differ in length and every occurrence is rewritten.

use std::fs;
use std::path::Path;

use log::debug;

use super::{atomic_write, PatchError};
use crate::prefix::PrefixPair;

/// Replace every occurrence of the old prefix in a UTF-8 text file.
///
/// Returns the number of occurrences replaced; `0` means the file did not
/// contain the old prefix and was left untouched. Malformed UTF-8 is a
/// read-class failure.
pub fn patch_text_file(path: &Path, pair: &PrefixPair) -> Result<usize, PatchError> {
    let text = read_text(path)?;

    let occurrences = text.matches(pair.old_str()).count();
    if occurrences == 0 {
        return Ok(0);
    }

    let replaced = text.replace(pair.old_str(), pair.new_str());
    atomic_write(path, replaced.as_bytes())?;

    debug!(
        "patched text file {} ({occurrences} occurrences)",
        path.display()
    );
    Ok(occurrences)
}

/// Read-only counterpart of [`patch_text_file`]: how many occurrences a
/// mutating run would replace.
pub fn scan_text_file(path: &Path, pair: &PrefixPair) -> Result<usize, PatchError> {
    Ok(read_text(path)?.matches(pair.old_str()).count())
}

fn read_text(path: &Path) -> Result<String, PatchError> {
    let raw = fs::read(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(raw).map_err(|source| PatchError::Utf8 {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> PrefixPair {
        PrefixPair::new("/data/data/com.termux", "/data/data/com.example.term")
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.sh");
        fs::write(
            &path,
            "export PREFIX=/data/data/com.termux/files/usr\nexport HOME=/data/data/com.termux/files/home\n",
        )
        .unwrap();

        let replaced = patch_text_file(&path, &pair()).unwrap();
        assert_eq!(replaced, 2);

        let after = fs::read_to_string(&path).unwrap();
        assert!(!after.contains("/data/data/com.termux/"));
        assert_eq!(after.matches("/data/data/com.example.term").count(), 2);
    }

    #[test]
    fn test_untouched_without_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "nothing to see here\n").unwrap();

        assert_eq!(patch_text_file(&path, &pair()).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "nothing to see here\n");
    }

    #[test]
    fn test_lengths_may_differ() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paths.conf");
        fs::write(&path, "root=/abc\n").unwrap();

        let shorter = PrefixPair::new("/abc", "/z");
        patch_text_file(&path, &shorter).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "root=/z\n");
    }

    #[test]
    fn test_malformed_utf8_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        fs::write(&path, b"\xff\xfe/data/data/com.termux").unwrap();

        let result = patch_text_file(&path, &pair());
        assert!(matches!(result, Err(PatchError::Utf8 { .. })));
    }

    #[test]
    fn test_missing_file_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = patch_text_file(&dir.path().join("absent.sh"), &pair());
        assert!(matches!(result, Err(PatchError::Read { .. })));
    }

    #[test]
    fn test_scan_counts_without_mutating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.sh");
        let body = "A=/data/data/com.termux\nB=/data/data/com.termux\n";
        fs::write(&path, body).unwrap();

        assert_eq!(scan_text_file(&path, &pair()).unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), body);
    }
}
