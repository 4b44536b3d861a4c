//! Cancellation and deadline carrier for resolution calls.
//!
//! A [`Context`] is threaded unchanged through every collaborator a
//! resolution touches. Collaborators that block (a name lookup, an object
//! graph walk) call [`Context::check`] at their own suspension points.
//!
//! Contexts form a tree: cancelling a context cancels everything derived
//! from it, never its ancestors. A derived deadline is the earlier of its
//! own and its parent's.
//!
//! ```
//! use cairn_core::Context;
//! use std::time::Duration;
//!
//! let root = Context::background();
//! let call = root.with_timeout(Duration::from_secs(5));
//!
//! assert!(call.check().is_ok());
//! root.cancel();
//! assert!(call.is_cancelled());
//! ```

use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    parent: Option<Arc<Inner>>,
}

/// Cloneable handle carrying cancellation and an optional deadline.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                deadline: None,
                parent: None,
            }),
        }
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        let deadline = match (self.inner.deadline, deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                deadline,
                parent: Some(Arc::clone(&self.inner)),
            }),
        }
    }

    /// A child that can be cancelled independently of this context.
    pub fn child(&self) -> Self {
        self.derive(None)
    }

    /// A child that expires `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.derive(Some(Instant::now() + timeout))
    }

    /// A child that expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        self.derive(Some(deadline))
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        let mut node = Some(&self.inner);
        while let Some(current) = node {
            if current.cancelled.load(Ordering::Acquire) {
                return true;
            }
            node = current.parent.as_ref();
        }
        false
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline; `Some(ZERO)` once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// `Err(Cancelled)` or `Err(DeadlineExceeded)` once the context is done.
    ///
    /// Cancellation wins when both apply.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
