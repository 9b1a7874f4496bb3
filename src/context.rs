//! Cancellation and deadline context bound to repositories and pipelines.
//!
//! A [`Context`] is handed to a repository at construction time and governs
//! every call made through it. Cancelling the context (or letting its
//! deadline pass) makes in-flight and subsequent calls fail promptly with
//! [`Error::Cancelled`] instead of waiting for the store.
//!
//! ```
//! use cache_repository::Context;
//! use std::time::Duration;
//!
//! let ctx = Context::with_timeout(Duration::from_secs(2));
//! let shared = ctx.clone(); // clones share cancellation state
//! shared.cancel();
//! assert!(ctx.is_cancelled());
//! ```

use crate::error::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Clone, Debug)]
pub struct Context {
    cancel: Arc<watch::Sender<bool>>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        let (tx, _rx) = watch::channel(false);
        Context {
            cancel: Arc::new(tx),
            deadline: None,
        }
    }

    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        let mut ctx = Self::background();
        ctx.deadline = Some(deadline);
        ctx
    }

    /// Derive a context that shares this one's cancellation and expires
    /// after `timeout` or at the parent's deadline, whichever comes first.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now().checked_add(timeout);
        let deadline = match (self.deadline, own) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, None) => parent,
            (None, own) => own,
        };
        Context {
            cancel: Arc::clone(&self.cancel),
            deadline,
        }
    }

    /// Cancel this context and every clone or child sharing it.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if the context is already cancelled or expired.
    ///
    /// # Errors
    /// Returns `Error::Cancelled` naming `op`.
    pub fn check(&self, op: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled(format!("{}: context cancelled", op)));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::Cancelled(format!("{}: deadline exceeded", op)));
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context is cancelled or expires first.
    ///
    /// The future is dropped as soon as the context is done, so a hung store
    /// call cannot block the caller past cancellation.
    ///
    /// # Errors
    /// Returns `Error::Cancelled` on cancellation or deadline, otherwise the
    /// future's own result.
    pub async fn run<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(op)?;

        let mut rx = self.cancel.subscribe();
        let cancelled = async move {
            let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
            if closed {
                std::future::pending::<()>().await;
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => {
                warn!("⚠ {} aborted: context cancelled", op);
                Err(Error::Cancelled(format!("{}: context cancelled", op)))
            }
            _ = expired => {
                warn!("⚠ {} aborted: deadline exceeded", op);
                Err(Error::Cancelled(format!("{}: deadline exceeded", op)))
            }
            result = fut => result,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
