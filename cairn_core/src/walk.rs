//! Importing files and directories into the store.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::ObjectType;
use crate::store::Store;
use crate::tree::{TreeEntry, file_modes};
use std::fs;
use std::path::Path;

impl Store {
    /// Add a file or directory to the store.
    ///
    /// Files become blobs. Directories become trees, recursively, honouring
    /// `.gitignore`. Symlinks are rejected.
    pub fn add_path(&self, path: &Path) -> Result<Hash> {
        let metadata = fs::symlink_metadata(path)?;

        let hash = if metadata.is_file() {
            self.put_blob(fs::File::open(path)?)?
        } else if metadata.is_dir() {
            self.add_directory(path)?
        } else {
            return Err(Error::invalid_tree_entry(format!(
                "Unsupported file type: {}",
                path.display()
            )));
        };

        tracing::debug!(path = %path.display(), %hash, "added path");
        Ok(hash)
    }

    fn add_directory(&self, path: &Path) -> Result<Hash> {
        let mut entries = Vec::new();

        let walker = ignore::WalkBuilder::new(path)
            .max_depth(Some(1))
            .hidden(false)
            .git_ignore(true)
            .require_git(false)
            .build();

        for entry in walker {
            let entry = entry?;
            let entry_path = entry.path();
            if entry_path == path {
                continue;
            }

            let name = entry_path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    Error::invalid_tree_entry(format!("Invalid filename: {}", entry_path.display()))
                })?
                .to_string();

            // .git is never content
            if name == ".git" {
                continue;
            }

            let metadata = fs::symlink_metadata(entry_path)?;
            if metadata.is_symlink() {
                return Err(Error::invalid_tree_entry(format!(
                    "Symlinks not supported: {}",
                    entry_path.display()
                )));
            } else if metadata.is_dir() {
                let hash = self.add_directory(entry_path)?;
                entries.push(TreeEntry::new(
                    ObjectType::Tree,
                    file_modes::DIRECTORY,
                    hash,
                    name,
                )?);
            } else if metadata.is_file() {
                let hash = self.put_blob(fs::File::open(entry_path)?)?;
                entries.push(TreeEntry::new(
                    ObjectType::Blob,
                    file_mode(&metadata),
                    hash,
                    name,
                )?);
            }
        }

        self.put_tree(entries)
    }
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    if metadata.permissions().mode() & 0o111 != 0 {
        file_modes::EXECUTABLE
    } else {
        file_modes::REGULAR
    }
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    file_modes::REGULAR
}
