//! Error types for cairn_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using cairn_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving paths or touching the store.
#[derive(Error, Debug)]
pub enum Error {
    /// A `/named/` path was given but no naming service is configured.
    ///
    /// Not transient: provision a naming service before retrying.
    #[error("no naming service configured: cannot resolve named path")]
    NoNamingService,

    /// Path violates the segment rules (unknown scheme, missing identifier, ...).
    #[error("Malformed path {path:?}: {reason}")]
    MalformedPath { path: String, reason: String },

    /// The naming service failed to resolve a name.
    #[error("Failed to resolve name {name}: {source}")]
    NameResolution {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// The context was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// The context deadline passed.
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Object file is corrupted or invalid.
    #[error("Corrupted object at {path}: {reason}")]
    CorruptedObject { path: PathBuf, reason: String },

    /// Invalid hash format or encoding.
    #[error("Invalid hash: {reason}")]
    InvalidHash { reason: String },

    /// Object not found in store.
    #[error("Object not found: {hash}")]
    ObjectNotFound { hash: String },

    /// Store is invalid or not initialized.
    #[error("Invalid store at {path}: {reason}")]
    InvalidStore { path: PathBuf, reason: String },

    /// Invalid reference name or format.
    #[error("Invalid reference: {reason}")]
    InvalidRef { reason: String },

    /// Reference not found.
    #[error("Reference not found: {name}")]
    RefNotFound { name: String },

    /// Invalid object type.
    #[error("Invalid object type: expected {expected}, got {got}")]
    InvalidObjectType { expected: String, got: String },

    /// Invalid tree entry.
    #[error("Invalid tree entry: {reason}")]
    InvalidTreeEntry { reason: String },

    /// Unsupported algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// A path segment names no entry in its parent tree.
    #[error("No link named {segment:?} under {parent}")]
    LinkNotFound { parent: String, segment: String },

    /// A path segment tried to descend into a blob.
    #[error("Cannot resolve {segment:?}: {hash} is not a tree")]
    NotATree { hash: String, segment: String },
}

impl Error {
    /// Create a MalformedPath error.
    pub fn malformed_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a naming service failure for `name`.
    pub fn name_resolution(name: impl Into<String>, source: Error) -> Self {
        Error::NameResolution {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create a CorruptedObject error.
    pub fn corrupted_object(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptedObject {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(reason: impl Into<String>) -> Self {
        Error::InvalidHash {
            reason: reason.into(),
        }
    }

    /// Create an ObjectNotFound error.
    pub fn object_not_found(hash: impl Into<String>) -> Self {
        Error::ObjectNotFound { hash: hash.into() }
    }

    /// Create an InvalidStore error.
    pub fn invalid_store(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidRef error.
    pub fn invalid_ref(reason: impl Into<String>) -> Self {
        Error::InvalidRef {
            reason: reason.into(),
        }
    }

    /// Create a RefNotFound error.
    pub fn ref_not_found(name: impl Into<String>) -> Self {
        Error::RefNotFound { name: name.into() }
    }

    /// Create an InvalidObjectType error.
    pub fn invalid_object_type(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Error::InvalidObjectType {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create an InvalidTreeEntry error.
    pub fn invalid_tree_entry(reason: impl Into<String>) -> Self {
        Error::InvalidTreeEntry {
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Create a LinkNotFound error.
    pub fn link_not_found(parent: impl Into<String>, segment: impl Into<String>) -> Self {
        Error::LinkNotFound {
            parent: parent.into(),
            segment: segment.into(),
        }
    }

    /// Create a NotATree error.
    pub fn not_a_tree(hash: impl Into<String>, segment: impl Into<String>) -> Self {
        Error::NotATree {
            hash: hash.into(),
            segment: segment.into(),
        }
    }

    /// True for `Cancelled` and `DeadlineExceeded`, including when wrapped
    /// in a `NameResolution` error.
    pub fn is_cancellation(&self) -> bool {
        match self {
            Error::Cancelled | Error::DeadlineExceeded => true,
            Error::NameResolution { source, .. } => source.is_cancellation(),
            _ => false,
        }
    }

    /// True when the failure means "nothing lives at that path or name".
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::RefNotFound { .. } | Error::ObjectNotFound { .. } | Error::LinkNotFound { .. } => {
                true
            }
            Error::NameResolution { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // ignore::Error can wrap an io::Error or be a path error
        match err.io_error() {
            Some(io_err) => Error::Io {
                source: std::io::Error::new(io_err.kind(), io_err.to_string()),
            },
            None => Error::Io {
                source: std::io::Error::other(err.to_string()),
            },
        }
    }
}
