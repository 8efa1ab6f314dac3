use std::fmt;

/// The immutable pair of path prefixes a relocation run operates on: the
/// prefix baked into the bundle (`old`) and the prefix it must become
/// (`new`).
///
/// Both patchers consume the pair; the text patcher as UTF-8 strings, the
/// binary patcher as raw bytes. Taking `&str` at construction keeps the
/// UTF-8 requirement in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixPair {
    old: String,
    new: String,
}

impl PrefixPair {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    /// True when both prefixes are identical; the whole relocation run is a
    /// no-op.
    pub fn is_noop(&self) -> bool {
        self.old == self.new
    }

    /// True when the replacement is strictly longer than the original, so
    /// an in-place binary substitution cannot preserve byte offsets.
    pub fn grows(&self) -> bool {
        self.new.len() > self.old.len()
    }

    pub fn old_str(&self) -> &str {
        &self.old
    }

    pub fn new_str(&self) -> &str {
        &self.new
    }

    pub fn old_bytes(&self) -> &[u8] {
        self.old.as_bytes()
    }

    pub fn new_bytes(&self) -> &[u8] {
        self.new.as_bytes()
    }

    /// Fixed-length replacement for binary patching: the new prefix followed
    /// by zero bytes up to the old prefix's length. Overwriting an
    /// occurrence with this block never shifts a byte, and the first padding
    /// zero terminates the string early for downstream readers.
    ///
    /// `None` when the new prefix is longer than the old one.
    pub fn padded_replacement(&self) -> Option<Vec<u8>> {
        if self.grows() {
            return None;
        }
        let mut padded = vec![0u8; self.old.len()];
        padded[..self.new.len()].copy_from_slice(self.new.as_bytes());
        Some(padded)
    }
}

impl fmt::Display for PrefixPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.old, self.new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_when_identical() {
        let pair = PrefixPair::new("/data/app", "/data/app");
        assert!(pair.is_noop());
        assert!(!pair.grows());
    }

    #[test]
    fn test_grows_only_when_strictly_longer() {
        assert!(PrefixPair::new("/abc", "/abcde").grows());
        assert!(!PrefixPair::new("/abc", "/xyz").grows());
        assert!(!PrefixPair::new("/abcde", "/abc").grows());
    }

    #[test]
    fn test_padded_replacement_layout() {
        let pair = PrefixPair::new("/data/data/com.termux", "/data/data/com.nx");
        let padded = pair.padded_replacement().unwrap();
        assert_eq!(padded.len(), pair.old_bytes().len());
        assert_eq!(&padded[..pair.new_bytes().len()], pair.new_bytes());
        assert!(padded[pair.new_bytes().len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_padded_replacement_equal_length() {
        let pair = PrefixPair::new("/abc", "/xyz");
        assert_eq!(pair.padded_replacement().unwrap(), b"/xyz");
    }

    #[test]
    fn test_no_padded_replacement_when_growing() {
        let pair = PrefixPair::new("/abc", "/abcdef");
        assert!(pair.padded_replacement().is_none());
    }
}
