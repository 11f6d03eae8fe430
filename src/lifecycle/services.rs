//! Production wiring of the dependency chain.

use std::sync::Arc;

use crate::config::{ContractOptions, ControllerOptions, ServerOptions, StoreOptions};
use crate::contract::ContractClient;
use crate::controller::Controller;
use crate::lifecycle::cleanup::{CleanupContext, CleanupManager};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::startup::{ControllerHandle, ServerHandle, ServiceFactory};
use crate::lifecycle::BoxError;
use crate::server::HttpServer;
use crate::store::PostgresStore;

/// Builds the real contract client, Postgres store, controller and HTTP server.
#[derive(Debug, Clone, Copy, Default)]
pub struct LilypadServices;

impl ServiceFactory for LilypadServices {
    type Contract = ContractClient;
    type Store = PostgresStore;
    type Controller = Controller;
    type Server = HttpServer;

    async fn build_contract(
        &self,
        options: ContractOptions,
        _cleanup: &CleanupManager,
    ) -> Result<ContractClient, BoxError> {
        // The HTTP provider holds no resource that needs an explicit release.
        Ok(ContractClient::new(&options)?)
    }

    async fn build_store(&self, options: StoreOptions, cleanup: &CleanupManager) -> Result<PostgresStore, BoxError> {
        let store = PostgresStore::connect(&options).await?;

        let pool = store.clone();
        cleanup.register("postgres-pool", move |ctx: CleanupContext| async move {
            match ctx.remaining() {
                Some(left) => tokio::time::timeout(left, pool.close())
                    .await
                    .map_err(|_| BoxError::from("postgres pool did not close before the cleanup deadline")),
                None => {
                    pool.close().await;
                    Ok(())
                }
            }
        });

        if options.auto_migrate {
            store.migrate().await?;
        }

        Ok(store)
    }

    fn build_controller(
        &self,
        options: ControllerOptions,
        contract: ContractClient,
        store: PostgresStore,
    ) -> Result<Controller, BoxError> {
        Ok(Controller::new(options, contract, store))
    }

    fn build_server(&self, options: ServerOptions, controller: Controller) -> Result<HttpServer, BoxError> {
        Ok(HttpServer::new(options, controller)?)
    }
}

impl ControllerHandle for Controller {
    async fn start(&self, shutdown: &Shutdown) -> Result<(), BoxError> {
        Ok(Controller::start(self, shutdown).await?)
    }
}

impl ServerHandle for HttpServer {
    fn run(
        self,
        shutdown: Shutdown,
        cleanup: Arc<CleanupManager>,
    ) -> impl std::future::Future<Output = Result<(), BoxError>> + Send + 'static {
        async move { Ok(self.serve(shutdown, cleanup).await?) }
    }
}
