//! Prefix Patcher: path-prefix relocation for pre-built bundles
//!
//! Rewrites a hardcoded filesystem-path prefix embedded throughout a
//! pre-built software distribution — shell scripts, config files, and
//! compiled ELF binaries — so the bundle keeps working when installed under
//! a different root than the one it was built for, without recompiling
//! anything.
//!
//! # Architecture
//!
//! One pass over the tree: [`walk`] enumerates every regular file,
//! [`classify`] tags each as text, ELF object, or neither, and the matching
//! patcher rewrites it. Per-file [`PatchOutcome`]s fold into a
//! [`ScanReport`]; a failing file never aborts the rest of the run.
//!
//! # Safety
//!
//! - Object files are only ever rewritten length-preserving: every
//!   replacement block is exactly as wide as the bytes it overwrites
//! - A replacement that cannot fit leaves the file byte-for-byte unchanged
//! - Atomic file writes (tempfile + fsync + rename)
//! - Re-running a completed relocation changes nothing
//!
//! # Example
//!
//! ```no_run
//! use prefix_patcher::{patch_tree, PrefixPair};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), prefix_patcher::MissingRootError> {
//! let pair = PrefixPair::new("/data/data/com.termux", "/data/data/com.pocket");
//! let report = patch_tree(Path::new("/opt/bundle"), &pair)?;
//!
//! if !report.success() {
//!     eprintln!("{} files failed", report.files_failed);
//! }
//! # Ok(())
//! # }
//! ```

pub mod apply;
pub mod classify;
pub mod marker;
pub mod patch;
pub mod prefix;
pub mod walk;

// Re-exports
pub use apply::{patch_tree, scan_tree, PatchOutcome, ScanReport};
pub use classify::{classify, FileKind};
pub use marker::ProvisionMarker;
pub use patch::{
    blocked_occurrences, patch_object_file, patch_text_file, scan_object_file, scan_text_file,
    BlockedOccurrence, ObjectPatch, PatchError,
};
pub use prefix::PrefixPair;
pub use walk::{list_files, MissingRootError};
