//! Chain-specific types and error definitions.

use alloy::primitives::Address;
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur while creating or using the contract client.
#[derive(Debug, Error)]
pub enum ContractError {
    /// A required option was not provided.
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid contract address: {0}")]
    InvalidAddress(String),

    #[error("invalid chain id: {0}")]
    InvalidChainId(String),

    #[error("invalid RPC endpoint: {0}")]
    InvalidRpcEndpoint(String),

    /// Invalid private key format or derivation error.
    #[error("wallet error: {0}")]
    Wallet(String),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Chain configuration mismatch.
    #[error("chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// No bytecode at the configured address.
    #[error("no contract deployed at {0}")]
    NotDeployed(Address),
}

/// Result type for contract operations.
pub type ContractResult<T> = Result<T, ContractError>;
