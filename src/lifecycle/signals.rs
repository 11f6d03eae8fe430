//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT (and SIGTERM on unix)
//! - Translate the first signal into cancellation of a derived [`Shutdown`]
//! - Stop listening when the returned guard is released
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Cancellation is idempotent: later signals are logged and ignored
//! - Installation cannot fail; a signal kind that cannot be registered is
//!   logged and skipped

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// A process signal that requests shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

/// Keeps the signal listener alive. Dropping it stops listening.
#[derive(Debug)]
pub struct SignalGuard {
    task: Option<JoinHandle<()>>,
}

impl SignalGuard {
    /// Stop listening for signals.
    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Signal listener released");
        }
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Derive a context from `parent` that is triggered by the first OS signal.
pub fn install(parent: &Shutdown) -> (Shutdown, SignalGuard) {
    install_from(parent, os_signals())
}

/// Derive a context from `parent` that is triggered by the first item of `signals`.
pub fn install_from<S>(parent: &Shutdown, signals: S) -> (Shutdown, SignalGuard)
where
    S: Stream<Item = Signal> + Send + 'static,
{
    let shutdown = parent.child();
    let trigger = shutdown.clone();

    let task = tokio::spawn(async move {
        let mut signals = std::pin::pin!(signals);
        while let Some(signal) = signals.next().await {
            if trigger.is_triggered() {
                tracing::debug!(signal = ?signal, "Already shutting down, ignoring signal");
                continue;
            }
            tracing::info!(signal = ?signal, "Shutdown signal received");
            trigger.trigger();
        }
    });

    (shutdown, SignalGuard { task: Some(task) })
}

/// Handlers are registered before this returns, so a signal that arrives
/// before the listener task first runs is still observed.
fn os_signals() -> BoxStream<'static, Signal> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let listen = |kind: SignalKind, as_signal: Signal| match signal(kind) {
            Ok(listener) => Some(
                stream::unfold(listener, move |mut listener| async move {
                    listener.recv().await.map(|()| (as_signal, listener))
                })
                .boxed(),
            ),
            Err(e) => {
                tracing::warn!(error = %e, signal = ?as_signal, "Failed to install signal handler");
                None
            }
        };

        let interrupts = listen(SignalKind::interrupt(), Signal::Interrupt);
        let terminations = listen(SignalKind::terminate(), Signal::Terminate);
        stream::select_all(interrupts.into_iter().chain(terminations)).boxed()
    }

    #[cfg(not(unix))]
    {
        stream::unfold((), |()| async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => Some((Signal::Interrupt, ())),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for interrupt signal");
                    None
                }
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn channel_signals() -> (mpsc::UnboundedSender<Signal>, impl Stream<Item = Signal> + Send + 'static) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signals = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|s| (s, rx)) });
        (tx, signals)
    }

    #[tokio::test]
    async fn test_first_signal_cancels() {
        let parent = Shutdown::new();
        let (tx, signals) = channel_signals();
        let (shutdown, _guard) = install_from(&parent, signals);

        assert!(!shutdown.is_triggered());
        tx.send(Signal::Interrupt).unwrap();

        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .expect("shutdown should be triggered by the signal");
        assert!(!parent.is_triggered(), "parent must not be cancelled by a derived context");
    }

    #[tokio::test]
    async fn test_repeated_signals_are_idempotent() {
        let parent = Shutdown::new();
        let (tx, signals) = channel_signals();
        let (shutdown, guard) = install_from(&parent, signals);

        tx.send(Signal::Interrupt).unwrap();
        tx.send(Signal::Interrupt).unwrap();
        tx.send(Signal::Terminate).unwrap();

        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(shutdown.is_triggered());
        guard.release();
    }

    #[tokio::test]
    async fn test_parent_cancellation_propagates() {
        let parent = Shutdown::new();
        let (_tx, signals) = channel_signals();
        let (shutdown, _guard) = install_from(&parent, signals);

        parent.trigger();
        assert!(shutdown.is_triggered());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_interrupt_right_after_install_is_observed() {
        let (shutdown, guard) = install(&Shutdown::new());

        // Sent before the listener task has had a chance to run.
        let status = std::process::Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .expect("kill should be available");
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown.wait())
            .await
            .expect("interrupt should trigger shutdown");
        guard.release();
    }

    #[tokio::test]
    async fn test_released_guard_stops_listening() {
        let parent = Shutdown::new();
        let (tx, signals) = channel_signals();
        let (shutdown, guard) = install_from(&parent, signals);

        guard.release();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let _ = tx.send(Signal::Interrupt);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!shutdown.is_triggered());
    }
}
