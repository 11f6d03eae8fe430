//! Contract integration subsystem.
//!
//! # Data Flow
//! ```text
//! ContractOptions (address, private key, RPC endpoint, chain id)
//!     → wallet.rs (key parsing, signing identity)
//!     → client.rs (signing provider with timeouts)
//!     → controller (chain checks during start)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or sensitive data
//! - All RPC calls have timeouts
//! - Construction is offline; connectivity is checked when the controller starts

pub mod client;
pub mod types;
pub mod wallet;

pub use client::ContractClient;
pub use types::{ChainId, ContractError, ContractResult};
pub use wallet::Wallet;
