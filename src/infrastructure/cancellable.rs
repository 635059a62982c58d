use crate::types::{Result, SignalingError};
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A spawned unit of work paired with the token that stops it.
///
/// The action receives a clone of the token so nested calls (HTTP requests in
/// particular) can abort themselves. The action is also dropped at its next
/// suspension point once the token fires, so work after that point never runs.
pub struct CancellableTask {
    token: CancellationToken,
    handle: JoinHandle<Result<()>>,
}

impl CancellableTask {
    /// Spawn `action` on the current tokio runtime.
    pub fn run<F, Fut>(action: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::run_with_token(CancellationToken::new(), action)
    }

    /// Spawn `action` bound to an existing token (e.g. a child of a client-wide token).
    pub fn run_with_token<F, Fut>(token: CancellationToken, action: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let work = action(token.clone());
        let guard = token.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = guard.cancelled() => Err(SignalingError::Cancelled),
                result = work => result,
            }
        });

        Self { token, handle }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal cancellation and return immediately.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Signal cancellation and wait until the action has actually stopped.
    ///
    /// Failures caused by the cancellation itself resolve to `Ok(())`; any other
    /// failure of the action (including one that happened before the cancel) is
    /// returned.
    pub async fn cancel_and_wait(self) -> Result<()> {
        self.token.cancel();
        Self::settle(self.handle.await)
    }

    /// Wait for the action to finish on its own.
    pub async fn join(self) -> Result<()> {
        Self::settle(self.handle.await)
    }

    fn settle(outcome: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.is_cancellation() => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(SignalingError::TaskPanicked(e.to_string())),
        }
    }
}

impl std::fmt::Debug for CancellableTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellableTask")
            .field("cancelled", &self.token.is_cancelled())
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}
