//! Cancellable generation
//!
//! A dismissed dialog aborts its pending generation; the aborted future
//! resolves to `None` and no draft ever reaches the session.

use futures::future::{abortable, AbortHandle, Abortable, BoxFuture};
use futures::FutureExt;
use std::future::Future;
use tracing::debug;

/// Abort side of a pending generation
#[derive(Debug, Clone)]
pub struct CancelHandle(AbortHandle);

impl CancelHandle {
    /// Abort the generation; a no-op once it has finished
    pub fn cancel(&self) {
        debug!("generation cancelled");
        self.0.abort();
    }
}

/// Generation that may be aborted through its [`CancelHandle`]
pub struct Cancellable<T> {
    inner: Abortable<BoxFuture<'static, T>>,
}

impl<T> std::fmt::Debug for Cancellable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cancellable").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Cancellable<T> {
    /// Wrap a future
    pub fn new<F>(future: F) -> (CancelHandle, Self)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (inner, handle) = abortable(future.boxed());
        (CancelHandle(handle), Self { inner })
    }

    /// Result, or `None` when cancelled
    pub async fn outcome(self) -> Option<T> {
        self.inner.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let (_handle, pending) = Cancellable::new(async { 7 });
        assert_eq!(pending.outcome().await, Some(7));
    }

    #[tokio::test]
    async fn cancelled_yields_nothing() {
        let (handle, pending) = Cancellable::new(futures::future::pending::<u32>());
        handle.cancel();
        assert_eq!(pending.outcome().await, None);
    }
}
