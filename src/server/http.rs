//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Resolve the bind address and public URL
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind the listener and register its release with the cleanup registry
//! - Serve until shutdown, bounded by the grace period

use std::future::IntoFuture;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::ServerOptions;
use crate::controller::Controller;
use crate::lifecycle::{BoxError, CleanupContext, CleanupManager, Shutdown};
use crate::server::handlers::{get_status, healthz};

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid bind address {host}:{port}: {reason}")]
    InvalidBind { host: String, port: u16, reason: String },

    #[error("invalid server url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Binding failed once the accept loop was launched.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Controller,
    pub public_url: Arc<Url>,
}

/// HTTP API server.
pub struct HttpServer {
    router: Router,
    addr: SocketAddr,
    public_url: Arc<Url>,
    grace: Duration,
}

impl HttpServer {
    /// Create a server for `controller`. Fails if the bind address or public
    /// URL cannot be resolved.
    pub fn new(options: ServerOptions, controller: Controller) -> Result<Self, ServerError> {
        let addr = resolve_bind(&options.host, options.port)?;
        let public_url = Arc::new(public_url(&options)?);

        let state = AppState {
            controller,
            public_url: public_url.clone(),
        };

        Ok(Self {
            router: Self::build_router(state),
            addr,
            public_url,
            grace: Duration::from_secs(options.shutdown_grace_secs),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(healthz))
            .route("/api/v1/status", get(get_status))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
            )
    }

    /// Bind and serve until `shutdown` fires.
    ///
    /// Registers a `server-listener` release action with `cleanup`. After
    /// shutdown, in-flight requests get the grace period to complete.
    pub async fn serve(self, shutdown: Shutdown, cleanup: Arc<CleanupManager>) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind { addr: self.addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr: self.addr, source })?;

        tracing::info!(
            address = %local_addr,
            public_url = %self.public_url,
            "HTTP server starting"
        );

        let stop = shutdown.child();
        let closed = Shutdown::new();
        register_listener_release(&cleanup, stop.clone(), closed.clone());

        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(stop.clone().wait_owned())
            .into_future();

        let grace = self.grace;
        let result = tokio::select! {
            result = serve => result.map_err(ServerError::Serve),
            _ = async {
                stop.wait().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed, closing remaining connections");
                Ok(())
            }
        };

        closed.trigger();
        tracing::info!("HTTP server stopped");
        result
    }

    /// Address the listener will bind to.
    pub fn bind_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn public_url(&self) -> &Url {
        &self.public_url
    }
}

fn register_listener_release(cleanup: &CleanupManager, stop: Shutdown, closed: Shutdown) {
    cleanup.register("server-listener", move |ctx: CleanupContext| async move {
        stop.trigger();
        match ctx.remaining() {
            Some(left) => tokio::time::timeout(left, closed.wait())
                .await
                .map_err(|_| BoxError::from("listener still open at cleanup deadline"))?,
            None => closed.wait().await,
        }
        Ok::<(), BoxError>(())
    });
}

fn resolve_bind(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let invalid = |reason: String| ServerError::InvalidBind {
        host: host.to_string(),
        port,
        reason,
    };

    (host, port)
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("no addresses resolved".to_string()))
}

fn public_url(options: &ServerOptions) -> Result<Url, ServerError> {
    let raw = if options.url.is_empty() {
        format!("http://{}:{}", options.host, options.port)
    } else {
        options.url.clone()
    };

    Url::parse(&raw).map_err(|e| ServerError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })
}
