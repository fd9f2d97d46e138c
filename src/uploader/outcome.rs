//! The single-resolution outcome of an upload

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use crate::error::{Result, UploadError};
use crate::types::UploadResult;

/// Future resolving once, when the upload reaches a terminal state
///
/// Clones share the same resolution, so every caller of
/// [`Upload::start`](crate::Upload::start) awaits the same outcome.
///
/// - `Ok(UploadResult)` for every terminal event, including failed and
///   cancelled uploads
/// - `Err` only when a native call for this upload failed
///
/// Dropping an `UploadOutcome` does not cancel the upload; use
/// [`Upload::cancel`](crate::Upload::cancel) and keep awaiting.
#[derive(Clone)]
pub struct UploadOutcome {
    inner: Shared<BoxFuture<'static, Result<UploadResult>>>,
}

impl std::fmt::Debug for UploadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOutcome")
            .field("resolved", &self.peek())
            .finish()
    }
}

impl UploadOutcome {
    /// A pending outcome and the sender that resolves it
    pub(crate) fn channel() -> (oneshot::Sender<Result<UploadResult>>, Self) {
        let (tx, rx) = oneshot::channel();
        let fut = rx
            .map(|received| received.unwrap_or_else(|_| Err(UploadError::OutcomeDropped.into())))
            .boxed();
        (tx, Self { inner: fut.shared() })
    }

    /// An outcome that is already resolved
    pub(crate) fn resolved(result: Result<UploadResult>) -> Self {
        let outcome = Self {
            inner: futures::future::ready(result).boxed().shared(),
        };
        // Poll once so `peek` sees the value without anyone awaiting it
        outcome.inner.clone().now_or_never();
        outcome
    }

    /// The resolution, if it is already known and has been polled
    pub fn peek(&self) -> Option<&Result<UploadResult>> {
        self.inner.peek()
    }

    /// The resolution if it is available right now, without waiting
    pub fn try_result(&self) -> Option<Result<UploadResult>> {
        self.inner.clone().now_or_never()
    }

    /// Whether the outcome has resolved
    pub fn is_resolved(&self) -> bool {
        self.try_result().is_some()
    }
}

impl Future for UploadOutcome {
    type Output = Result<UploadResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}
