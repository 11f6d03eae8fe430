//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! StoreOptions
//!     → postgres.rs (pool, optional migrations from migrations/)
//!     → controller (checkpoint reads/writes)
//!     → cleanup registry (pool close on shutdown)
//! ```

pub mod postgres;

pub use postgres::{PostgresStore, StoreError};
