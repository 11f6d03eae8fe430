//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags (cli.rs) + environment variables + defaults (schema.rs)
//!     → loader.rs (single resolution pass, flag > env > default)
//!     → validation.rs (semantic checks)
//!     → LilypadOptions (validated, immutable)
//!     → split into per-subsystem groups by the bootstrap sequencer
//! ```
//!
//! # Design Decisions
//! - Options are immutable once resolved
//! - Each subsystem sees only its own group
//! - Precedence is a pure function, testable without touching the process env

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_options, ConfigError, Environment, ProcessEnv};
pub use schema::{ContractOptions, ControllerOptions, LilypadOptions, ServerOptions, StoreOptions};
