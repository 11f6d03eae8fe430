//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the dependency chain in order: contract → store → controller → server
//! - Start the controller before any traffic is accepted
//! - Run the server's accept loop as the single background task
//! - Block until shutdown, then drain the cleanup registry exactly once
//!
//! # Design Decisions
//! - Fail fast: any construction error aborts the remaining steps
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)
//! - A background server failure triggers the same shutdown path as an
//!   interrupt and is reported as an error, never a crash

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::Instrument;

use crate::config::{ContractOptions, ControllerOptions, LilypadOptions, ServerOptions, StoreOptions};
use crate::lifecycle::cleanup::{CleanupContext, CleanupManager};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::lifecycle::BoxError;

/// Upper bound for the final cleanup drain.
pub const CLEANUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that abort the server lifecycle.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to create contract client: {0}")]
    Contract(#[source] BoxError),

    #[error("failed to create store: {0}")]
    Store(#[source] BoxError),

    #[error("failed to create controller: {0}")]
    Controller(#[source] BoxError),

    #[error("failed to start controller: {0}")]
    ControllerStart(#[source] BoxError),

    #[error("failed to create server: {0}")]
    Server(#[source] BoxError),

    /// The accept loop failed after startup.
    #[error("server stopped unexpectedly: {0}")]
    ServerTask(#[source] BoxError),

    /// The accept loop returned before shutdown was requested.
    #[error("server exited before shutdown was requested")]
    ServerExited,

    #[error("server task panicked: {0}")]
    ServerPanicked(String),
}

/// Builds the handles the sequencer wires together.
///
/// Constructors that acquire an external resource register its release with
/// `cleanup` before returning, so it is released even if a later step fails.
pub trait ServiceFactory {
    type Contract;
    type Store;
    type Controller: ControllerHandle;
    type Server: ServerHandle;

    fn build_contract(
        &self,
        options: ContractOptions,
        cleanup: &CleanupManager,
    ) -> impl Future<Output = Result<Self::Contract, BoxError>>;

    fn build_store(
        &self,
        options: StoreOptions,
        cleanup: &CleanupManager,
    ) -> impl Future<Output = Result<Self::Store, BoxError>>;

    fn build_controller(
        &self,
        options: ControllerOptions,
        contract: Self::Contract,
        store: Self::Store,
    ) -> Result<Self::Controller, BoxError>;

    fn build_server(
        &self,
        options: ServerOptions,
        controller: Self::Controller,
    ) -> Result<Self::Server, BoxError>;
}

/// The domain controller as seen by the sequencer.
pub trait ControllerHandle {
    /// Initialize and return once ready to serve. Returns early if `shutdown`
    /// fires mid-start.
    fn start(&self, shutdown: &Shutdown) -> impl Future<Output = Result<(), BoxError>>;
}

/// The network listener as seen by the sequencer.
pub trait ServerHandle: Send + 'static {
    /// Serve until `shutdown` fires, then return within the server's grace
    /// period. Errors only on an unrecoverable listener failure.
    fn run(
        self,
        shutdown: Shutdown,
        cleanup: Arc<CleanupManager>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send + 'static;
}

/// Build the dependency chain, run the server in the background and wait
/// for shutdown.
///
/// Does not drain `cleanup`; see [`launch`].
pub async fn run<F: ServiceFactory>(
    factory: &F,
    options: LilypadOptions,
    shutdown: Shutdown,
    cleanup: Arc<CleanupManager>,
) -> Result<(), BootstrapError> {
    let LilypadOptions {
        controller: controller_options,
        store: store_options,
        server: server_options,
        contract: contract_options,
    } = options;

    let contract = factory
        .build_contract(contract_options, &cleanup)
        .instrument(tracing::info_span!("contract"))
        .await
        .map_err(BootstrapError::Contract)?;

    let store = factory
        .build_store(store_options, &cleanup)
        .instrument(tracing::info_span!("store"))
        .await
        .map_err(BootstrapError::Store)?;

    let controller = tracing::info_span!("controller")
        .in_scope(|| factory.build_controller(controller_options, contract, store))
        .map_err(BootstrapError::Controller)?;

    controller
        .start(&shutdown)
        .instrument(tracing::info_span!("controller"))
        .await
        .map_err(BootstrapError::ControllerStart)?;

    if shutdown.is_triggered() {
        tracing::info!("Shutdown requested during startup, not starting server");
        return Ok(());
    }

    let bind = format!("{}:{}", server_options.host, server_options.port);
    let server = tracing::info_span!("server")
        .in_scope(|| factory.build_server(server_options, controller))
        .map_err(BootstrapError::Server)?;

    tracing::info!(address = %bind, "lilypad server listening");

    let mut server_task = tokio::spawn(
        server
            .run(shutdown.clone(), cleanup.clone())
            .instrument(tracing::info_span!("server")),
    );

    tokio::select! {
        _ = shutdown.wait() => {
            tracing::info!("Shutting down");
            match server_task.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Server failed during shutdown");
                    Err(BootstrapError::ServerTask(e))
                }
                Err(e) => Err(BootstrapError::ServerPanicked(e.to_string())),
            }
        }
        outcome = &mut server_task => {
            shutdown.trigger();
            match outcome {
                Ok(Ok(())) => {
                    tracing::error!("Server exited before shutdown was requested");
                    Err(BootstrapError::ServerExited)
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Server failed, shutting down");
                    Err(BootstrapError::ServerTask(e))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Server task panicked, shutting down");
                    Err(BootstrapError::ServerPanicked(e.to_string()))
                }
            }
        }
    }
}

/// [`run`], followed by exactly one cleanup drain on every exit path.
pub async fn launch<F: ServiceFactory>(
    factory: &F,
    options: LilypadOptions,
    shutdown: Shutdown,
    cleanup: Arc<CleanupManager>,
) -> Result<(), BootstrapError> {
    let result = run(factory, options, shutdown, cleanup.clone()).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Bootstrap failed");
    }
    cleanup.run_all(CleanupContext::with_timeout(CLEANUP_TIMEOUT)).await;

    result
}

/// Run the server until the process is interrupted.
pub async fn serve<F: ServiceFactory>(factory: &F, options: LilypadOptions) -> Result<(), BootstrapError> {
    let cleanup = Arc::new(CleanupManager::new());
    let (shutdown, signal_guard) = signals::install(&Shutdown::new());

    let result = launch(factory, options, shutdown, cleanup).await;

    signal_guard.release();
    result
}
