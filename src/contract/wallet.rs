//! Signing key management.
//!
//! # Security
//! - Keys are never logged or serialized
//! - Only the derived address appears in log output

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::contract::types::{ChainId, ContractError, ContractResult};

/// Signing identity used for contract transactions.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    chain_id: ChainId,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for EIP-155 replay protection
    pub fn from_private_key(private_key_hex: &str, chain_id: ChainId) -> ContractResult<Self> {
        let key_hex = private_key_hex.trim();
        if key_hex.is_empty() {
            return Err(ContractError::Missing("private key"));
        }
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ContractError::Wallet(format!("Invalid private key format: {}", e)))?;
        let signer = signer.with_chain_id(Some(chain_id.0));

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id.0,
            "Wallet initialized"
        );

        Ok(Self { signer, chain_id })
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID this wallet is configured for.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Network wallet for a signing provider.
    pub fn network_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
