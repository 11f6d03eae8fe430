//! Shutdown coordination for the server.

use tokio_util::sync::CancellationToken;

/// Shared cancellation context for graceful shutdown.
///
/// Cloning yields another handle to the same context. Cancellation is
/// monotonic: once triggered it stays triggered.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new, untriggered context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context that is triggered when this one is, but can also be
    /// triggered on its own without affecting the parent.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Trigger the shutdown signal. Repeated calls have no further effect.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    /// Owned variant of [`wait`](Self::wait), for APIs that need a `'static` future.
    pub async fn wait_owned(self) {
        self.token.cancelled_owned().await;
    }
}
