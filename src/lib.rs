//! Lilypad API server.
//!
//! Resolves configuration, builds contract client → store → controller →
//! server in order, serves in the background and shuts down cleanly on
//! interrupt.

pub mod cli;
pub mod config;
pub mod contract;
pub mod controller;
pub mod lifecycle;
pub mod observability;
pub mod server;
pub mod store;

pub use config::LilypadOptions;
pub use lifecycle::{serve, LilypadServices, Shutdown};
