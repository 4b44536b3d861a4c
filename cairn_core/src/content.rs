//! Content resolution: walking a `/content/` path to its terminal object.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::ObjectType;
use crate::path::{Path, Scheme};
use crate::store::Store;
use crate::tree;
use serde::Serialize;
use std::sync::Arc;

/// Walks a content-addressed path to a node.
pub trait ContentResolver: Send + Sync {
    type Node;

    fn resolve_path(&self, ctx: &Context, path: &Path) -> Result<Self::Node>;
}

impl<T: ContentResolver + ?Sized> ContentResolver for &T {
    type Node = T::Node;

    fn resolve_path(&self, ctx: &Context, path: &Path) -> Result<Self::Node> {
        (**self).resolve_path(ctx, path)
    }
}

impl<T: ContentResolver + ?Sized> ContentResolver for Arc<T> {
    type Node = T::Node;

    fn resolve_path(&self, ctx: &Context, path: &Path) -> Result<Self::Node> {
        (**self).resolve_path(ctx, path)
    }
}

/// Terminal object of a walk through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// The content-addressed path that was walked.
    pub path: Path,
    pub hash: Hash,
    pub kind: ObjectType,
    /// Payload size in bytes, as recorded in the object header.
    pub size: u64,
}

impl ContentResolver for Store {
    type Node = Node;

    /// Follow each extension segment through tree entries.
    ///
    /// The context is checked before every object read.
    fn resolve_path(&self, ctx: &Context, path: &Path) -> Result<Node> {
        if path.scheme() != Scheme::Content {
            return Err(Error::malformed_path(
                path.to_string(),
                format!("expected a /{}/ path", Scheme::Content),
            ));
        }

        let ident = path
            .identifier()
            .ok_or_else(|| Error::malformed_path(path.to_string(), "missing content id"))?;
        let mut hash = Hash::from_hex(ident)
            .map_err(|e| Error::malformed_path(path.to_string(), e.to_string()))?;

        ctx.check()?;
        let mut kind = self.object_header(&hash)?.object_type;

        for segment in path.extensions() {
            ctx.check()?;
            if kind != ObjectType::Tree {
                return Err(Error::not_a_tree(hash.to_hex(), segment.as_str()));
            }

            let entries = self.get_tree(&hash)?;
            let entry = tree::find_entry(&entries, segment)
                .ok_or_else(|| Error::link_not_found(hash.to_hex(), segment.as_str()))?;
            hash = entry.hash;
            kind = entry.kind;
        }

        ctx.check()?;
        let header = self.object_header(&hash)?;
        if header.object_type != kind {
            return Err(Error::corrupted_object(
                self.object_path(&hash),
                format!(
                    "linked as {} but stored as {}",
                    kind.as_str(),
                    header.object_type.as_str()
                ),
            ));
        }

        Ok(Node {
            path: path.clone(),
            hash,
            kind,
            size: header.payload_len,
        })
    }
}
