//! Contract RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Parse and validate the contract options
//! - Hold a signing provider for the configured chain
//! - Query chain state (chain id, block number, contract code)
//! - Handle timeouts and network errors gracefully

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::config::ContractOptions;
use crate::contract::types::{ChainId, ContractError, ContractResult};
use crate::contract::wallet::Wallet;

/// Default RPC request timeout.
pub const RPC_TIMEOUT_SECS: u64 = 10;

/// Handle to the deployed contract and its chain.
#[derive(Clone)]
pub struct ContractClient {
    provider: Arc<dyn Provider + Send + Sync>,
    address: Address,
    wallet: Wallet,
    rpc_endpoint: Url,
    timeout_duration: Duration,
}

impl ContractClient {
    /// Create a new contract client.
    ///
    /// Performs no network I/O; the HTTP provider connects on first use.
    /// Fails if any option is missing or malformed.
    pub fn new(options: &ContractOptions) -> ContractResult<Self> {
        let address = required(&options.address, "contract address")?
            .parse::<Address>()
            .map_err(|e| ContractError::InvalidAddress(format!("'{}': {}", options.address, e)))?;

        let chain_id = required(&options.chain_id, "chain id")?
            .parse::<u64>()
            .map(ChainId)
            .map_err(|e| ContractError::InvalidChainId(format!("'{}': {}", options.chain_id, e)))?;

        let rpc_endpoint: Url = required(&options.rpc_endpoint, "RPC endpoint")?
            .parse()
            .map_err(|e| {
                ContractError::InvalidRpcEndpoint(format!("'{}': {}", options.rpc_endpoint, e))
            })?;

        let wallet = Wallet::from_private_key(&options.private_key, chain_id)?;

        let provider = ProviderBuilder::new()
            .wallet(wallet.network_wallet())
            .connect_http(rpc_endpoint.clone());

        tracing::info!(
            contract = %address,
            rpc_endpoint = %rpc_endpoint,
            chain_id = chain_id.0,
            "Contract client initialized"
        );

        Ok(Self {
            provider: Arc::new(provider),
            address,
            wallet,
            rpc_endpoint,
            timeout_duration: Duration::from_secs(RPC_TIMEOUT_SECS),
        })
    }

    /// Override the RPC request timeout.
    pub fn with_timeout(mut self, timeout_duration: Duration) -> Self {
        self.timeout_duration = timeout_duration;
        self
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> ContractResult<()> {
        let actual = self.remote_chain_id().await?;
        let expected = self.wallet.chain_id();
        if actual != expected {
            return Err(ContractError::ChainMismatch {
                expected: expected.0,
                actual: actual.0,
            });
        }
        Ok(())
    }

    /// Verify there is bytecode at the contract address.
    pub async fn verify_deployed(&self) -> ContractResult<()> {
        let code = self.rpc(self.provider.get_code_at(self.address)).await?;
        if code.is_empty() {
            return Err(ContractError::NotDeployed(self.address));
        }
        Ok(())
    }

    /// Get the chain ID reported by the RPC endpoint.
    pub async fn remote_chain_id(&self) -> ContractResult<ChainId> {
        self.rpc(self.provider.get_chain_id()).await.map(ChainId)
    }

    /// Get the latest block number.
    pub async fn block_number(&self) -> ContractResult<u64> {
        self.rpc(self.provider.get_block_number()).await
    }

    async fn rpc<F, T, E>(&self, call: F) -> ContractResult<T>
    where
        F: std::future::IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match timeout(self.timeout_duration, call).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(rpc_endpoint = %self.rpc_endpoint, error = %e, "RPC error");
                Err(ContractError::Rpc(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(rpc_endpoint = %self.rpc_endpoint, "RPC timeout");
                Err(ContractError::Timeout(self.timeout_duration.as_secs()))
            }
        }
    }

    /// The deployed contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The address transactions are signed with.
    pub fn signer_address(&self) -> Address {
        self.wallet.address()
    }

    /// The configured chain ID.
    pub fn chain_id(&self) -> ChainId {
        self.wallet.chain_id()
    }
}

fn required<'a>(value: &'a str, name: &'static str) -> ContractResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(ContractError::Missing(name))
    } else {
        Ok(value)
    }
}

impl std::fmt::Debug for ContractClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractClient")
            .field("address", &self.address)
            .field("rpc_endpoint", &self.rpc_endpoint.as_str())
            .field("chain_id", &self.wallet.chain_id())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
