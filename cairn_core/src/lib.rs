//! # Cairn Core
//!
//! Resolve namespace-qualified paths to objects in a BLAKE3 content-addressed store.
//!
//! Two kinds of path are understood:
//!
//! - `/content/<hash>/a/b` names an object by its content id, then walks
//!   tree entries `a` and `b`.
//! - `/named/<name>/a/b` names a mutable pointer. A [`NameSystem`] maps
//!   `/named/<name>` to a content path, `a/b` is reattached, and the result
//!   is walked as above.
//!
//! The pipeline itself ([`resolve_indirection`], [`resolve`]) is stateless
//! and generic over its collaborators. [`Store`] provides both a naming
//! service (through its refs) and a [`ContentResolver`].
//!
//! ## Example
//!
//! ```no_run
//! use cairn_core::{Algorithm, Context, Path, PathResolver, Store};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::init("./my-store", Algorithm::Blake3)?;
//! let root = store.add_path(std::path::Path::new("./site"))?;
//! store.refs().set("site", &Path::content(&root, Vec::<String>::new()))?;
//!
//! let refs = store.refs();
//! let resolver = PathResolver::new(&store).with_name_system(&refs);
//! let node = resolver.resolve(&Context::background(), "/named/site/index.html".parse()?)?;
//! println!("{} {} ({} bytes)", node.kind.as_str(), node.hash, node.size);
//! # Ok(())
//! # }
//! ```

mod content;
mod context;
mod error;
mod hash;
mod namesys;
mod object;
mod path;
mod refs;
mod resolve;
mod store;
mod tree;
mod walk;

pub use content::{ContentResolver, Node};
pub use context::Context;
pub use error::{Error, Result};
pub use hash::{Algorithm, Hash};
pub use namesys::{NameSystem, StaticNameSystem};
pub use object::{ObjectHeader, ObjectType};
pub use path::{Path, Scheme};
pub use refs::RefManager;
pub use resolve::{PathResolver, resolve, resolve_indirection};
pub use store::Store;
pub use tree::{FileMode, TreeEntry, file_modes};
