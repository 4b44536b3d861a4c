//! Path resolution: peel off a `/named/` prefix, then walk content.
//!
//! ```text
//! /named/alice/docs/readme.txt
//!   -> naming service: /named/alice => /content/<hash>
//!   -> /content/<hash>/docs/readme.txt
//!   -> content resolver => Node
//! ```
//!
//! Exactly one indirection hop is taken. If the naming service answers with
//! another `/named/` path it is handed to the content resolver unchanged.

use crate::content::ContentResolver;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::namesys::NameSystem;
use crate::path::{Path, Scheme};
use tracing::field;

/// Replace a `/named/<id>` prefix with what the naming service maps it to.
///
/// Paths in any other scheme come back unchanged whether or not a naming
/// service is given. Errors from the naming service are wrapped in
/// [`Error::NameResolution`]; nothing is retried.
pub fn resolve_indirection(
    ctx: &Context,
    namesys: Option<&dyn NameSystem>,
    path: Path,
) -> Result<Path> {
    if path.scheme() != Scheme::Named {
        return Ok(path);
    }

    let span = tracing::debug_span!("resolve_indirection", path = %path, error = field::Empty);
    let _enter = span.enter();

    let result = splice(ctx, namesys, &path);
    match &result {
        Ok(resolved) => tracing::debug!(%resolved, "resolved name"),
        Err(err) => {
            span.record("error", field::display(err));
        }
    }
    result
}

fn splice(ctx: &Context, namesys: Option<&dyn NameSystem>, path: &Path) -> Result<Path> {
    let namesys = namesys.ok_or(Error::NoNamingService)?;

    let segments = path.segments();
    let (resolvable, extensions) = match segments {
        [_, ident, ..] if !ident.is_empty() => segments.split_at(2),
        _ => {
            return Err(Error::malformed_path(
                path.to_string(),
                "named path has no identifier",
            ));
        }
    };

    let name = Path::from_segments(resolvable.iter().cloned())?.to_string();
    let target = namesys
        .resolve(ctx, &name)
        .map_err(|source| Error::name_resolution(name.as_str(), source))?;

    let resolved = Path::parse(&target).map_err(|e| {
        Error::malformed_path(target.as_str(), format!("naming service returned: {}", e))
    })?;
    if resolved.identifier().is_none_or(str::is_empty) {
        return Err(Error::malformed_path(
            target.as_str(),
            "naming service returned a path with no identifier",
        ));
    }

    resolved.join(extensions.iter().cloned())
}

/// Resolve `path` to a node: indirection first, then the content walk.
///
/// Errors from either stage are returned as they are.
pub fn resolve<R>(
    ctx: &Context,
    namesys: Option<&dyn NameSystem>,
    resolver: &R,
    path: Path,
) -> Result<R::Node>
where
    R: ContentResolver + ?Sized,
{
    let path = resolve_indirection(ctx, namesys, path)?;
    resolver.resolve_path(ctx, &path)
}

/// The two collaborators of a resolution, bundled.
///
/// Holds borrowed, read-only configuration; share it freely between threads
/// when the collaborators allow it.
pub struct PathResolver<'a, R: ?Sized> {
    namesys: Option<&'a dyn NameSystem>,
    content: &'a R,
}

impl<'a, R> PathResolver<'a, R>
where
    R: ContentResolver + ?Sized,
{
    /// A resolver with no naming service: `/named/` paths fail with
    /// [`Error::NoNamingService`].
    pub fn new(content: &'a R) -> Self {
        Self {
            namesys: None,
            content,
        }
    }

    pub fn with_name_system(mut self, namesys: &'a dyn NameSystem) -> Self {
        self.namesys = Some(namesys);
        self
    }

    pub fn has_name_system(&self) -> bool {
        self.namesys.is_some()
    }

    pub fn resolve_indirection(&self, ctx: &Context, path: Path) -> Result<Path> {
        resolve_indirection(ctx, self.namesys, path)
    }

    pub fn resolve(&self, ctx: &Context, path: Path) -> Result<R::Node> {
        resolve(ctx, self.namesys, self.content, path)
    }
}
