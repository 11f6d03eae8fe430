//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → trigger the shared Shutdown context (shutdown.rs)
//!
//! Startup (startup.rs):
//!     contract → store → controller (start) → server → spawn accept loop
//!     → wait for Shutdown → wait for accept loop to return
//!
//! Cleanup (cleanup.rs):
//!     release actions registered during startup and serving
//!     → drained once, last registered first
//! ```
//!
//! # Design Decisions
//! - Ordered startup: each step depends on the handles of the previous one
//! - One background task: the server's accept loop
//! - Cleanup runs on every exit path, including failed startup
//! - Server grace period bounds how long shutdown waits for in-flight requests

pub mod cleanup;
pub mod services;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use cleanup::{CleanupContext, CleanupManager};
pub use services::LilypadServices;
pub use shutdown::Shutdown;
pub use startup::{launch, run, serve, BootstrapError, ControllerHandle, ServerHandle, ServiceFactory};

/// Error type crossing subsystem boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
