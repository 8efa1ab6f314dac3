//! File classification: decides which patcher, if any, handles a file.
//!
//! Classification is computed once per file and carried with it; nothing
//! downstream re-sniffs. The extension check runs first because it needs no
//! file access; the shebang and ELF signature checks share a single 4-byte
//! header read.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

/// What a file is, as far as patching is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Script or config artifact: whole-file UTF-8 substitution applies.
    Text,
    /// Compiled ELF artifact: only offset-preserving substitution applies.
    ObjectBinary,
    /// Neither; excluded from patching.
    Unknown,
}

/// Extensions that mark a file as a text artifact without opening it.
const TEXT_EXTENSIONS: &[&str] = &[
    "sh", "py", "pl", "rb", "lua", "conf", "cfg", "txt", "json", "xml", "pc", "la", "cmake", "m4",
];

const SHEBANG: &[u8; 2] = b"#!";
const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Classify a file. Never errors: anything unreadable is `Unknown`.
pub fn classify(path: &Path) -> FileKind {
    if has_text_extension(path) {
        return FileKind::Text;
    }

    let mut header = [0u8; 4];
    let read = match File::open(path).and_then(|mut file| read_header(&mut file, &mut header)) {
        Ok(read) => read,
        Err(_) => return FileKind::Unknown,
    };

    if read >= SHEBANG.len() && header[..SHEBANG.len()] == SHEBANG[..] {
        return FileKind::Text;
    }
    if read >= ELF_MAGIC.len() && header == *ELF_MAGIC {
        return FileKind::ObjectBinary;
    }

    FileKind::Unknown
}

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext))
}

/// Read up to 4 header bytes, tolerating files shorter than the buffer.
fn read_header(file: &mut File, header: &mut [u8; 4]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < header.len() {
        let read = file.read(&mut header[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}
