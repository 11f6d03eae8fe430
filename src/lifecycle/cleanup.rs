//! Release actions run once at shutdown.
//!
//! # Responsibilities
//! - Collect release actions from any task while the server is running
//! - Drain them in reverse registration order when the coordinator unwinds
//! - Attempt every action even when earlier ones fail
//!
//! # Design Decisions
//! - Last registered is released first (mirrors nested acquisition)
//! - Failures and panics are logged, never propagated
//! - Draining empties the registry, so a second drain is a no-op unless an
//!   action was registered late (logged as a warning)

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::time::Instant;

use crate::lifecycle::BoxError;

type Action = Box<dyn FnOnce(CleanupContext) -> BoxFuture<'static, Result<(), BoxError>> + Send>;

struct Entry {
    name: String,
    action: Action,
}

/// Ambient context handed to every release action.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupContext {
    deadline: Option<Instant>,
}

impl CleanupContext {
    /// A context with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Time left before the deadline. `None` means unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }
}

/// Process-wide registry of release actions.
#[derive(Default)]
pub struct CleanupManager {
    entries: Mutex<Vec<Entry>>,
    drained: AtomicBool,
}

impl CleanupManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a release action. Safe to call from any task.
    pub fn register<F, Fut>(&self, name: impl Into<String>, action: F)
    where
        F: FnOnce(CleanupContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let name = name.into();
        if self.is_drained() {
            tracing::warn!(action = %name, "Cleanup action registered after drain, runs on the next drain only");
        } else {
            tracing::debug!(action = %name, "Cleanup action registered");
        }

        let action: Action = Box::new(move |ctx| action(ctx).boxed());
        self.entries
            .lock()
            .expect("cleanup registry mutex poisoned")
            .push(Entry { name, action });
    }

    /// Number of actions waiting to run.
    pub fn pending(&self) -> usize {
        self.entries
            .lock()
            .expect("cleanup registry mutex poisoned")
            .len()
    }

    /// Whether `run_all` has drained the registry at least once.
    pub fn is_drained(&self) -> bool {
        self.drained.load(Ordering::SeqCst)
    }

    /// Run every registered action, last registered first.
    ///
    /// Returns the number of actions attempted. Actions registered after a
    /// drain are picked up by the next call.
    pub async fn run_all(&self, ctx: CleanupContext) -> usize {
        let entries = std::mem::take(
            &mut *self
                .entries
                .lock()
                .expect("cleanup registry mutex poisoned"),
        );
        self.drained.store(true, Ordering::SeqCst);

        if entries.is_empty() {
            return 0;
        }

        let total = entries.len();
        tracing::info!(actions = total, "Running cleanup actions");

        let mut failed = 0;
        for Entry { name, action } in entries.into_iter().rev() {
            // The closure itself may panic before yielding a future.
            match AssertUnwindSafe(async move { action(ctx).await })
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => {
                    tracing::debug!(action = %name, "Cleanup action completed");
                }
                Ok(Err(e)) => {
                    failed += 1;
                    tracing::error!(action = %name, error = %e, "Cleanup action failed");
                }
                Err(_) => {
                    failed += 1;
                    tracing::error!(action = %name, "Cleanup action panicked");
                }
            }
        }

        tracing::info!(actions = total, failed, "Cleanup complete");
        total
    }
}

impl std::fmt::Debug for CleanupManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupManager")
            .field("pending", &self.pending())
            .field("drained", &self.is_drained())
            .finish()
    }
}
