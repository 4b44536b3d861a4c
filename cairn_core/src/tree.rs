//! Tree objects: sorted, named links to other objects.
//!
//! Payload layout, repeated per entry, entries sorted bytewise by name:
//!
//! ```text
//! 1 byte   type (1=blob, 2=tree)
//! 4 bytes  mode (u32 LE)
//! 32 bytes hash
//! 1 byte   name_len
//! N bytes  name (UTF-8)
//! ```

use crate::error::{Error, Result};
use crate::hash::{HASH_SIZE, Hash};
use crate::object::ObjectType;
use serde::Serialize;
use std::cmp::Ordering;
use std::io::Read;

/// POSIX file mode.
pub type FileMode = u32;

pub mod file_modes {
    use super::FileMode;

    pub const REGULAR: FileMode = 0o100644;
    pub const EXECUTABLE: FileMode = 0o100755;
    pub const DIRECTORY: FileMode = 0o040755;
}

/// Longest entry name, bounded by the one-byte length prefix.
pub const MAX_NAME_LEN: usize = 255;

/// A named link inside a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub kind: ObjectType,
    pub mode: FileMode,
    pub hash: Hash,
    pub name: String,
}

impl TreeEntry {
    /// Create an entry, validating the name.
    ///
    /// Names must be 1..=255 bytes and contain neither NUL nor `/`, so every
    /// entry is addressable by exactly one path segment.
    pub fn new(kind: ObjectType, mode: FileMode, hash: Hash, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_tree_entry("Name cannot be empty"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(Error::invalid_tree_entry(format!(
                "Name too long: {} bytes (max {})",
                name.len(),
                MAX_NAME_LEN
            )));
        }
        if name.contains('\0') || name.contains('/') {
            return Err(Error::invalid_tree_entry(format!(
                "Name {:?} contains NUL or '/'",
                name
            )));
        }
        Ok(Self {
            kind,
            mode,
            hash,
            name,
        })
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.kind.to_u8());
        buf.extend_from_slice(&self.mode.to_le_bytes());
        buf.extend_from_slice(self.hash.as_bytes());
        buf.push(self.name.len() as u8);
        buf.extend_from_slice(self.name.as_bytes());
    }

    fn decode_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut fixed = [0u8; 1 + 4 + HASH_SIZE + 1];
        reader.read_exact(&mut fixed)?;

        let kind = ObjectType::from_u8(fixed[0])?;
        let mode = u32::from_le_bytes([fixed[1], fixed[2], fixed[3], fixed[4]]);
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&fixed[5..5 + HASH_SIZE]);
        let name_len = fixed[5 + HASH_SIZE] as usize;

        let mut name = vec![0u8; name_len];
        reader.read_exact(&mut name)?;
        let name = String::from_utf8(name)
            .map_err(|e| Error::invalid_tree_entry(format!("Invalid UTF-8 in name: {}", e)))?;

        Self::new(kind, mode, Hash::from_bytes(hash), name)
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    /// Bytewise by name: the canonical order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.as_bytes().cmp(other.name.as_bytes())
    }
}

/// Encode entries in canonical order.
pub fn encode_tree(mut entries: Vec<TreeEntry>) -> Result<Vec<u8>> {
    entries.sort();
    if let Some(pair) = entries.windows(2).find(|pair| pair[0].name == pair[1].name) {
        return Err(Error::invalid_tree_entry(format!(
            "Duplicate entry name: {}",
            pair[0].name
        )));
    }

    let mut buf = Vec::new();
    for entry in &entries {
        entry.encode_into(&mut buf);
    }
    Ok(buf)
}

/// Decode a tree payload.
pub fn decode_tree(data: &[u8]) -> Result<Vec<TreeEntry>> {
    let mut reader = std::io::Cursor::new(data);
    let mut entries = Vec::new();
    while reader.position() < data.len() as u64 {
        entries.push(TreeEntry::decode_from(&mut reader)?);
    }
    Ok(entries)
}

/// Look up `name` in canonically ordered entries.
pub fn find_entry<'a>(entries: &'a [TreeEntry], name: &str) -> Option<&'a TreeEntry> {
    entries
        .binary_search_by(|entry| entry.name.as_bytes().cmp(name.as_bytes()))
        .ok()
        .map(|index| &entries[index])
}
