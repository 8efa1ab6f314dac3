//! Offset-preserving substitution inside ELF object files.
//!
//! Object files reference embedded path strings by fixed offset, so no byte
//! may shift: total file length and the position of every unrelated byte
//! are preserved on every path through this module.
//!
//! When the new prefix fits (same length or shorter), every occurrence is
//! overwritten in place with a zero-padded block of exactly the old
//! prefix's length. When it does not fit, the enclosing null-terminated
//! string extent bounds how much a same-location replacement may grow; that
//! extent ends at the string's own terminator and so never has slack, which
//! makes every grown occurrence unpatchable. Such occurrences are reported
//! and left byte-for-byte unchanged.

use std::fs;
use std::ops::Range;
use std::path::Path;

use log::{debug, warn};
use memchr::{memchr, memmem};

use super::{atomic_write, PatchError};
use crate::prefix::PrefixPair;

/// Outcome of patching a single object file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectPatch {
    /// Occurrences rewritten in place.
    pub replaced: usize,
    /// Occurrences found but left untouched: the rewritten string would
    /// overrun its enclosing extent.
    pub skipped: usize,
}

/// A prefix occurrence that cannot be rewritten in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedOccurrence {
    /// Byte offset of the occurrence within the file.
    pub offset: usize,
    /// Width of the enclosing null-terminated string extent.
    pub available: usize,
    /// Width the rewritten string would need.
    pub needed: usize,
}

/// Rewrite every occurrence of the old prefix in an ELF file, preserving
/// the file's length and every unrelated byte.
///
/// The file is written back once, atomically, and only when at least one
/// occurrence was rewritten; on every other path it is left untouched.
pub fn patch_object_file(path: &Path, pair: &PrefixPair) -> Result<ObjectPatch, PatchError> {
    let mut content = read_bytes(path)?;

    match pair.padded_replacement() {
        Some(padded) => {
            let replaced = overwrite_in_place(&mut content, pair.old_bytes(), &padded);
            if replaced > 0 {
                atomic_write(path, &content)?;
                debug!(
                    "patched object file {} ({replaced} occurrences)",
                    path.display()
                );
            }
            Ok(ObjectPatch {
                replaced,
                skipped: 0,
            })
        }
        None => {
            let blocked = blocked_occurrences(&content, pair);
            for occurrence in &blocked {
                warn!(
                    "cannot patch {}: string at offset {} needs {} bytes, extent holds {}",
                    path.display(),
                    occurrence.offset,
                    occurrence.needed,
                    occurrence.available,
                );
            }
            Ok(ObjectPatch {
                replaced: 0,
                skipped: blocked.len(),
            })
        }
    }
}

/// Read-only counterpart of [`patch_object_file`]: what a mutating run
/// would replace or skip.
pub fn scan_object_file(path: &Path, pair: &PrefixPair) -> Result<ObjectPatch, PatchError> {
    let content = read_bytes(path)?;

    if pair.grows() {
        Ok(ObjectPatch {
            replaced: 0,
            skipped: blocked_occurrences(&content, pair).len(),
        })
    } else {
        Ok(ObjectPatch {
            replaced: memmem::find_iter(&content, pair.old_bytes()).count(),
            skipped: 0,
        })
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, PatchError> {
    fs::read(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrite every occurrence of `old` with `replacement`, which must have
/// the same length. Returns the occurrence count.
fn overwrite_in_place(content: &mut [u8], old: &[u8], replacement: &[u8]) -> usize {
    debug_assert_eq!(old.len(), replacement.len());

    let hits: Vec<usize> = memmem::find_iter(content, old).collect();
    for &start in &hits {
        content[start..start + replacement.len()].copy_from_slice(replacement);
    }
    hits.len()
}

/// Walk every occurrence of the old prefix for a growing replacement and
/// measure it against its enclosing string extent.
///
/// The extent ends at the string's first terminator, so the rewritten
/// string is always strictly wider and every occurrence lands here as
/// blocked. The search resumes at the extent's terminator, never inside an
/// already-measured string.
///
/// # Panics
///
/// Debug-asserts that the pair actually grows; callers with a same-length
/// or shorter replacement take the in-place overwrite path instead.
pub fn blocked_occurrences(content: &[u8], pair: &PrefixPair) -> Vec<BlockedOccurrence> {
    debug_assert!(pair.grows());

    let finder = memmem::Finder::new(pair.old_bytes());
    let growth = pair.new_bytes().len() - pair.old_bytes().len();

    let mut blocked = Vec::new();
    let mut at = 0;
    while let Some(pos) = finder.find(&content[at..]) {
        let start = at + pos;
        let extent = string_extent(content, start);
        let contained = memmem::find_iter(&content[extent.clone()], pair.old_bytes()).count();
        blocked.push(BlockedOccurrence {
            offset: start,
            available: extent.len(),
            needed: extent.len() + contained * growth,
        });
        at = extent.end;
    }
    blocked
}

/// The null-terminated string extent enclosing the occurrence at `start`:
/// from `start` to the first zero byte (exclusive) or end of buffer. Its
/// width is the hard upper bound for any same-location replacement.
fn string_extent(content: &[u8], start: usize) -> Range<usize> {
    let end = memchr(0, &content[start..])
        .map(|offset| start + offset)
        .unwrap_or(content.len());
    start..end
}
