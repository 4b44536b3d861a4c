//! Named references: the store's mutable names.
//!
//! Each ref is a file under `refs/`. Updates append a line, so the file is
//! also the ref's history; the last non-empty, non-comment line is current.
//! A line holds a path (`/content/<hash>/...`, or even another `/named/`
//! path) or a bare hex id, which reads as `/content/<id>`.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::namesys::NameSystem;
use crate::path::{Path, Scheme};
use crate::store::Store;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Reads and writes named references in a store.
pub struct RefManager<'a> {
    store: &'a Store,
}

impl<'a> RefManager<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn refs_dir(&self) -> PathBuf {
        self.store.root().join("refs")
    }

    fn ref_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() {
            return Err(Error::invalid_ref("Ref name cannot be empty"));
        }
        if name.starts_with('.') {
            return Err(Error::invalid_ref(format!(
                "Invalid ref name: {} (must not start with .)",
                name
            )));
        }
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(Error::invalid_ref(format!(
                "Invalid ref name: {} (must not contain .. or path separators)",
                name
            )));
        }
        Ok(self.refs_dir().join(name))
    }

    /// Point `name` at `target`.
    pub fn set(&self, name: &str, target: &Path) -> Result<()> {
        let path = self.ref_path(name)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        writeln!(file, "{}", target)?;

        tracing::debug!(name, %target, "updated ref");
        Ok(())
    }

    /// Current target of `name`, or `None` if the ref does not exist.
    pub fn get(&self, name: &str) -> Result<Option<Path>> {
        let path = self.ref_path(name)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let current = content
            .lines()
            .map(str::trim)
            .rev()
            .find(|line| !line.is_empty() && !line.starts_with('#'));

        match current {
            Some(line) => Path::parse(line)
                .map(Some)
                .map_err(|e| Error::invalid_ref(format!("ref {}: {}", name, e))),
            None => Ok(None),
        }
    }

    /// All refs with a current target, sorted by name.
    pub fn list(&self) -> Result<Vec<(String, Path)>> {
        let mut refs = Vec::new();
        let dir = self.refs_dir();
        if !dir.exists() {
            return Ok(refs);
        }

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file()
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
                && !name.starts_with('.')
                && let Some(target) = self.get(name)?
            {
                refs.push((name.to_string(), target));
            }
        }

        refs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(refs)
    }

    /// Delete a ref and its history.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.ref_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::ref_not_found(name)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolves `/named/<ref>` to the ref's current target.
impl NameSystem for RefManager<'_> {
    fn resolve(&self, ctx: &Context, name: &str) -> Result<String> {
        ctx.check()?;

        let path = Path::parse(name)?;
        let ident = match (path.scheme(), path.segments()) {
            (Scheme::Named, [_, ident]) if !ident.is_empty() => ident,
            _ => {
                return Err(Error::malformed_path(
                    name,
                    "expected exactly /named/<ref>",
                ));
            }
        };

        let target = self.get(ident)?.ok_or_else(|| Error::ref_not_found(ident.as_str()))?;
        Ok(target.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Algorithm, Hash};
    use tempfile::TempDir;

    fn new_store() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::init(temp_dir.path(), Algorithm::Blake3).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_set_and_get() {
        let (_dir, store) = new_store();
        let refs = store.refs();
        let target = Path::content(&Hash::hash_bytes(b"v1"), ["docs"]);

        refs.set("alice", &target).unwrap();
        assert_eq!(refs.get("alice").unwrap(), Some(target));
        assert_eq!(refs.get("nobody").unwrap(), None);
    }

    #[test]
    fn test_last_line_wins() {
        let (_dir, store) = new_store();
        let refs = store.refs();
        let v1 = Path::content(&Hash::hash_bytes(b"v1"), Vec::<String>::new());
        let v2 = Path::content(&Hash::hash_bytes(b"v2"), Vec::<String>::new());

        refs.set("alice", &v1).unwrap();
        refs.set("alice", &v2).unwrap();
        assert_eq!(refs.get("alice").unwrap(), Some(v2));

        let history = fs::read_to_string(store.root().join("refs/alice")).unwrap();
        assert_eq!(history.lines().count(), 2);
    }

    #[test]
    fn test_bare_hash_and_comment_lines() {
        let (_dir, store) = new_store();
        let hash = Hash::hash_bytes(b"legacy");
        fs::write(
            store.root().join("refs/old"),
            format!("{}\n# retired\n\n", hash),
        )
        .unwrap();

        let expected = Path::content(&hash, Vec::<String>::new());
        assert_eq!(store.refs().get("old").unwrap(), Some(expected));
    }

    #[test]
    fn test_list_and_remove() {
        let (_dir, store) = new_store();
        let refs = store.refs();
        let target = Path::content(&Hash::hash_bytes(b"x"), Vec::<String>::new());

        refs.set("zed", &target).unwrap();
        refs.set("amy", &target).unwrap();
        let names: Vec<_> = refs.list().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["amy", "zed"]);

        refs.remove("amy").unwrap();
        assert_eq!(refs.get("amy").unwrap(), None);
        assert!(matches!(
            refs.remove("amy").unwrap_err(),
            Error::RefNotFound { .. }
        ));
    }

    #[test]
    fn test_invalid_names() {
        let (_dir, store) = new_store();
        let refs = store.refs();
        let target = Path::named("x");

        assert!(refs.set("../etc/passwd", &target).is_err());
        assert!(refs.set("foo/bar", &target).is_err());
        assert!(refs.set("", &target).is_err());

        for name in [".", ".hidden"] {
            assert!(matches!(refs.set(name, &target), Err(Error::InvalidRef { .. })));
            assert!(matches!(refs.get(name), Err(Error::InvalidRef { .. })));
            assert!(matches!(refs.remove(name), Err(Error::InvalidRef { .. })));
        }
    }

    #[test]
    fn test_dot_name_does_not_reach_refs_dir() {
        let (_dir, store) = new_store();
        let refs = store.refs();
        std::fs::write(store.root().join("refs").join(".stray"), "/named/x\n").unwrap();

        let err = refs.resolve(&Context::background(), "/named/.").unwrap_err();
        assert!(matches!(err, Error::InvalidRef { .. }), "{}", err);
        assert!(refs.list().unwrap().is_empty());
    }

    #[test]
    fn test_name_system_resolves_ref() {
        let (_dir, store) = new_store();
        let refs = store.refs();
        let target = Path::content(&Hash::hash_bytes(b"site"), Vec::<String>::new());
        refs.set("alice", &target).unwrap();

        let ctx = Context::background();
        assert_eq!(refs.resolve(&ctx, "/named/alice").unwrap(), target.to_string());
        assert!(matches!(
            refs.resolve(&ctx, "/named/bob").unwrap_err(),
            Error::RefNotFound { .. }
        ));
        assert!(matches!(
            refs.resolve(&ctx, "/named/alice/extra").unwrap_err(),
            Error::MalformedPath { .. }
        ));
        assert!(matches!(
            refs.resolve(&ctx, &target.to_string()).unwrap_err(),
            Error::MalformedPath { .. }
        ));
    }

    #[test]
    fn test_name_system_observes_cancellation() {
        let (_dir, store) = new_store();
        let ctx = Context::background();
        ctx.cancel();
        assert!(matches!(
            store.refs().resolve(&ctx, "/named/alice").unwrap_err(),
            Error::Cancelled
        ));
    }
}
