//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → http.rs (Axum setup, request id, tracing, timeout)
//!     → handlers.rs (health and status endpoints)
//!     → controller (status snapshot)
//! ```
//!
//! # Shutdown
//! The listener stops accepting as soon as the shared shutdown context fires.
//! In-flight requests get the configured grace period to finish, after which
//! remaining connections are closed.

pub mod handlers;
pub mod http;

pub use http::{AppState, HttpServer, ServerError};
