//! Shared fakes for lifecycle and server tests.
#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lilypad::config::{ContractOptions, ControllerOptions, ServerOptions, StoreOptions};
use lilypad::contract::ContractClient;
use lilypad::controller::Controller;
use lilypad::lifecycle::{BoxError, CleanupManager, ControllerHandle, ServerHandle, ServiceFactory, Shutdown};
use lilypad::store::PostgresStore;
use tokio::sync::Notify;

/// A construction step that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Contract,
    Store,
    Controller,
    ControllerStart,
    Server,
}

/// How the fake server's accept loop behaves once running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunBehavior {
    UntilShutdown,
    Fail,
    Exit,
    Panic,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} unavailable")]
pub struct FakeError(pub &'static str);

/// Invocation counters shared by every fake.
#[derive(Debug, Default)]
pub struct Calls {
    pub contract: AtomicUsize,
    pub store: AtomicUsize,
    pub controller: AtomicUsize,
    pub start: AtomicUsize,
    pub server: AtomicUsize,
    pub run: AtomicUsize,
    pub store_released: AtomicUsize,
    pub listener_released: AtomicUsize,
    running: Notify,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Wait until the fake accept loop is running.
    pub async fn wait_for_run(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.running.notified())
            .await
            .expect("server never started running");
    }
}

pub struct FakeServices {
    pub fail_at: Option<Step>,
    pub behavior: RunBehavior,
    pub calls: Arc<Calls>,
}

impl FakeServices {
    pub fn new() -> Self {
        Self {
            fail_at: None,
            behavior: RunBehavior::UntilShutdown,
            calls: Arc::new(Calls::default()),
        }
    }

    pub fn failing_at(step: Step) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::new()
        }
    }

    pub fn with_behavior(behavior: RunBehavior) -> Self {
        Self {
            behavior,
            ..Self::new()
        }
    }

    fn check(&self, step: Step, name: &'static str) -> Result<(), BoxError> {
        if self.fail_at == Some(step) {
            Err(Box::new(FakeError(name)))
        } else {
            Ok(())
        }
    }
}

pub struct FakeContract;
pub struct FakeStore;

pub struct FakeController {
    fail_start: bool,
    calls: Arc<Calls>,
}

pub struct FakeServer {
    behavior: RunBehavior,
    calls: Arc<Calls>,
}

impl ServiceFactory for FakeServices {
    type Contract = FakeContract;
    type Store = FakeStore;
    type Controller = FakeController;
    type Server = FakeServer;

    async fn build_contract(&self, _options: ContractOptions, _cleanup: &CleanupManager) -> Result<FakeContract, BoxError> {
        self.calls.contract.fetch_add(1, Ordering::SeqCst);
        self.check(Step::Contract, "contract")?;
        Ok(FakeContract)
    }

    async fn build_store(&self, _options: StoreOptions, cleanup: &CleanupManager) -> Result<FakeStore, BoxError> {
        self.calls.store.fetch_add(1, Ordering::SeqCst);

        let calls = self.calls.clone();
        cleanup.register("fake-store", move |_ctx| async move {
            calls.store_released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        self.check(Step::Store, "store")?;
        Ok(FakeStore)
    }

    fn build_controller(
        &self,
        _options: ControllerOptions,
        _contract: FakeContract,
        _store: FakeStore,
    ) -> Result<FakeController, BoxError> {
        self.calls.controller.fetch_add(1, Ordering::SeqCst);
        self.check(Step::Controller, "controller")?;
        Ok(FakeController {
            fail_start: self.fail_at == Some(Step::ControllerStart),
            calls: self.calls.clone(),
        })
    }

    fn build_server(&self, _options: ServerOptions, _controller: FakeController) -> Result<FakeServer, BoxError> {
        self.calls.server.fetch_add(1, Ordering::SeqCst);
        self.check(Step::Server, "server")?;
        Ok(FakeServer {
            behavior: self.behavior,
            calls: self.calls.clone(),
        })
    }
}

impl ControllerHandle for FakeController {
    async fn start(&self, _shutdown: &Shutdown) -> Result<(), BoxError> {
        self.calls.start.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(Box::new(FakeError("controller start")));
        }
        Ok(())
    }
}

impl ServerHandle for FakeServer {
    fn run(
        self,
        shutdown: Shutdown,
        cleanup: Arc<CleanupManager>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send + 'static {
        async move {
            self.calls.run.fetch_add(1, Ordering::SeqCst);

            let calls = self.calls.clone();
            cleanup.register("fake-listener", move |_ctx| async move {
                calls.listener_released.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            self.calls.running.notify_one();

            match self.behavior {
                RunBehavior::UntilShutdown => {
                    shutdown.wait().await;
                    Ok(())
                }
                RunBehavior::Fail => Err(Box::new(FakeError("listener")) as BoxError),
                RunBehavior::Exit => Ok(()),
                RunBehavior::Panic => panic!("accept loop crashed"),
            }
        }
    }
}

// Well-known test private key (Anvil's first account)
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// A controller whose collaborators never touch the network until used.
pub fn offline_controller() -> Controller {
    let contract = ContractClient::new(&ContractOptions {
        address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".into(),
        private_key: TEST_PRIVATE_KEY.into(),
        rpc_endpoint: "http://127.0.0.1:9".into(),
        chain_id: "31337".into(),
    })
    .unwrap();
    let store = PostgresStore::connect_lazy(&StoreOptions::default());

    Controller::new(ControllerOptions::default(), contract, store)
}
