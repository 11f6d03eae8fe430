//! Domain controller.
//!
//! # Responsibilities
//! - Own the contract client and store handles
//! - Check chain and database reachability when started
//! - Reconcile the stored block checkpoint with the chain head
//! - Expose a status snapshot to the API server
//!
//! # Design Decisions
//! - `start` is synchronous from the caller's view: it returns once ready
//! - Cheap to clone; the API server holds a copy

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::ControllerOptions;
use crate::contract::{ContractClient, ContractError};
use crate::lifecycle::Shutdown;
use crate::store::{PostgresStore, StoreError};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerStatus {
    pub started: bool,
    pub chain_id: u64,
    pub contract_address: String,
    pub signer_address: String,
    /// Last block recorded in the checkpoint, if any.
    pub synced_block: Option<u64>,
}

#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

struct Inner {
    options: ControllerOptions,
    contract: ContractClient,
    store: PostgresStore,
    started: AtomicBool,
    synced_block: AtomicU64,
    has_synced: AtomicBool,
}

impl Controller {
    pub fn new(options: ControllerOptions, contract: ContractClient, store: PostgresStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                contract,
                store,
                started: AtomicBool::new(false),
                synced_block: AtomicU64::new(0),
                has_synced: AtomicBool::new(false),
            }),
        }
    }

    /// Verify collaborators and reconcile state. Returns `Ok` without
    /// finishing if `shutdown` fires first.
    pub async fn start(&self, shutdown: &Shutdown) -> Result<(), ControllerError> {
        tokio::select! {
            biased;
            _ = shutdown.wait() => {
                tracing::info!("Controller start interrupted by shutdown");
                Ok(())
            }
            result = self.initialize() => result,
        }
    }

    async fn initialize(&self) -> Result<(), ControllerError> {
        let inner = &self.inner;

        inner.contract.verify_chain_id().await?;
        inner.contract.verify_deployed().await?;
        inner.store.ping().await?;

        let name = &inner.options.checkpoint_name;
        let head = inner.contract.block_number().await?;
        let block = match inner.store.load_checkpoint(name).await? {
            Some(block) => {
                tracing::info!(
                    checkpoint = block,
                    head,
                    behind = head.saturating_sub(block),
                    "Resuming from checkpoint"
                );
                block
            }
            None => {
                inner.store.save_checkpoint(name, head).await?;
                tracing::info!(head, "No checkpoint found, starting at chain head");
                head
            }
        };

        inner.synced_block.store(block, Ordering::SeqCst);
        inner.has_synced.store(true, Ordering::SeqCst);
        inner.started.store(true, Ordering::SeqCst);

        tracing::info!(
            contract = %inner.contract.address(),
            chain_id = inner.contract.chain_id().0,
            "Controller started"
        );
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> ControllerStatus {
        let inner = &self.inner;
        ControllerStatus {
            started: self.is_started(),
            chain_id: inner.contract.chain_id().0,
            contract_address: inner.contract.address().to_string(),
            signer_address: inner.contract.signer_address().to_string(),
            synced_block: inner
                .has_synced
                .load(Ordering::SeqCst)
                .then(|| inner.synced_block.load(Ordering::SeqCst)),
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("contract", &self.inner.contract)
            .field("started", &self.is_started())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{ContractOptions, StoreOptions};
    use std::time::Duration;

    pub(crate) fn offline_controller() -> Controller {
        let contract = ContractClient::new(&ContractOptions {
            address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".into(),
            private_key: "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".into(),
            rpc_endpoint: "http://127.0.0.1:9".into(),
            chain_id: "31337".into(),
        })
        .unwrap()
        .with_timeout(Duration::from_secs(2));
        let store = PostgresStore::connect_lazy(&StoreOptions::default());

        Controller::new(ControllerOptions::default(), contract, store)
    }

    #[tokio::test]
    async fn test_status_before_start() {
        let controller = offline_controller();
        let status = controller.status();

        assert!(!status.started);
        assert_eq!(status.chain_id, 31337);
        assert_eq!(status.synced_block, None);
        assert_eq!(
            status.signer_address.to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[tokio::test]
    async fn test_start_fails_without_rpc() {
        let controller = offline_controller();
        let err = controller.start(&Shutdown::new()).await.unwrap_err();

        assert!(matches!(err, ControllerError::Contract(_)));
        assert!(!controller.is_started());
    }

    #[tokio::test]
    async fn test_start_returns_on_shutdown() {
        let controller = offline_controller();
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(1), controller.start(&shutdown))
            .await
            .expect("start should return promptly once shut down");
        assert!(result.is_ok());
        assert!(!controller.is_started());
    }
}
