//! Configuration schema definitions.
//!
//! This module defines the resolved option groups handed to each subsystem.
//! The defaults here are the lowest precedence layer; `loader.rs` applies
//! environment variables and command-line flags on top of them.

use serde::Serialize;
use std::fmt;

/// Default Postgres port.
pub const DEFAULT_STORE_PORT: u16 = 5432;

/// Default server bind port.
pub const DEFAULT_SERVER_PORT: u16 = 80;

/// Default grace period for in-flight requests after shutdown is requested.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

/// Root options aggregate for `lilypad serve`.
///
/// Immutable once resolved. Each subsystem receives only its own group.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LilypadOptions {
    /// Controller settings.
    pub controller: ControllerOptions,

    /// Postgres connection settings.
    pub store: StoreOptions,

    /// HTTP listener settings.
    pub server: ServerOptions,

    /// Contract endpoint and credentials.
    pub contract: ContractOptions,
}

/// Postgres connection parameters.
#[derive(Clone, Serialize)]
pub struct StoreOptions {
    /// Database host. Empty means `localhost`.
    pub host: String,

    /// Database port.
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Database user. Empty means `postgres`.
    pub username: String,

    /// Database password.
    #[serde(skip_serializing)]
    pub password: String,

    /// Run embedded migrations on startup.
    pub auto_migrate: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_STORE_PORT,
            database: "lilypad".to_string(),
            username: String::new(),
            password: String::new(),
            auto_migrate: true,
        }
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("auto_migrate", &self.auto_migrate)
            .finish()
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerOptions {
    /// Public URL the API is reachable on. Empty means `http://host:port`.
    pub url: String,

    /// Host to bind to.
    pub host: String,

    /// Port to bind to.
    pub port: u16,

    /// Seconds in-flight requests may drain after shutdown is requested.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_SERVER_PORT,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

/// On-chain contract configuration.
///
/// Values are kept as strings; the contract client parses and validates them.
#[derive(Clone, Default, Serialize)]
pub struct ContractOptions {
    /// Deployed contract address (hex).
    pub address: String,

    /// Signing key (hex, with or without 0x prefix).
    #[serde(skip_serializing)]
    pub private_key: String,

    /// JSON-RPC endpoint URL.
    pub rpc_endpoint: String,

    /// Chain identifier.
    pub chain_id: String,
}

impl fmt::Debug for ContractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractOptions")
            .field("address", &self.address)
            .field("private_key", &redacted(&self.private_key))
            .field("rpc_endpoint", &self.rpc_endpoint)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// Controller-specific settings.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerOptions {
    /// Key under which the controller stores its block checkpoint.
    pub checkpoint_name: String,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            checkpoint_name: "lilypad".to_string(),
        }
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}
