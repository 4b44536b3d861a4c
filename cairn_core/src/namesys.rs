//! Naming services: turning `/named/<name>` into a content path.

use crate::context::Context;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Resolves a name to a path string.
///
/// `name` is the two-segment rendering `/named/<identifier>`; the returned
/// string is expected to be a `/content/` path, possibly with its own trailing
/// segments. Implementations are shared across concurrent resolutions and
/// should honour `ctx` at any point where they may block.
pub trait NameSystem: Send + Sync {
    fn resolve(&self, ctx: &Context, name: &str) -> Result<String>;
}

impl<T: NameSystem + ?Sized> NameSystem for &T {
    fn resolve(&self, ctx: &Context, name: &str) -> Result<String> {
        (**self).resolve(ctx, name)
    }
}

impl<T: NameSystem + ?Sized> NameSystem for Arc<T> {
    fn resolve(&self, ctx: &Context, name: &str) -> Result<String> {
        (**self).resolve(ctx, name)
    }
}

/// In-memory name table.
///
/// Keys are full name strings (`/named/alice`), values are the target path
/// strings handed back verbatim.
#[derive(Debug, Default)]
pub struct StaticNameSystem {
    entries: RwLock<HashMap<String, String>>,
}

impl StaticNameSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `name` to `target`, returning the previous target.
    pub fn insert(&self, name: impl Into<String>, target: impl Into<String>) -> Option<String> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.into(), target.into())
    }

    pub fn remove(&self, name: &str) -> Option<String> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticNameSystem {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

impl NameSystem for StaticNameSystem {
    fn resolve(&self, ctx: &Context, name: &str) -> Result<String> {
        ctx.check()?;
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ref_not_found(name))
    }
}
