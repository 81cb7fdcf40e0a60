//! Caller-supplied cancellation and deadlines.
//!
//! Every network round trip made by a [`Session`](crate::session::Session) or a
//! [`Collection`](crate::collection::Collection) races the caller's [`Context`]. When the
//! context is cancelled, or its deadline elapses first, the in-flight round trip is dropped
//! and the operation fails with
//! [`DocumentStoreError::Cancelled`](crate::error::DocumentStoreError::Cancelled).
//!
//! ```ignore
//! use std::time::Duration;
//! use doclink::context::Context;
//!
//! let ctx = Context::new().with_timeout(Duration::from_secs(5));
//! let users = session.collection("users");
//! users.delete_many(&ctx, doc! { "active": false }).await?;
//! ```

use std::{future::Future, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{CancelReason, DocumentStoreError, DocumentStoreResult};

/// A cancellation token paired with an optional deadline.
///
/// Cloning a context shares its token: cancelling any clone cancels them all.
/// Use [`Context::child`] for a context that can be cancelled independently of its parent.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Creates a context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context driven by an existing cancellation token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token, deadline: None }
    }

    /// Returns a context cancelled together with this one, but which can also be
    /// cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Sets a deadline `timeout` from now, keeping an earlier existing deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline, keeping an earlier existing deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels this context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns a clone of the underlying token, e.g. to cancel from another task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Returns why this context is already done, if it is.
    fn done_reason(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            Some(CancelReason::Cancelled)
        } else if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            Some(CancelReason::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Drives `future` to completion unless the context finishes first.
    ///
    /// The future is not polled at all when the context is already done.
    pub(crate) async fn run<F>(&self, op: &'static str, future: F) -> DocumentStoreResult<F::Output>
    where
        F: Future,
    {
        if let Some(reason) = self.done_reason() {
            return Err(DocumentStoreError::Cancelled { op, reason });
        }

        let reason = match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => CancelReason::Cancelled,
                _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                output = future => return Ok(output),
            },
            None => tokio::select! {
                biased;
                _ = self.token.cancelled() => CancelReason::Cancelled,
                output = future => return Ok(output),
            },
        };

        tracing::debug!(op, %reason, "operation aborted by context");
        Err(DocumentStoreError::Cancelled { op, reason })
    }
}
