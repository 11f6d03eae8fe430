//! Option resolution.
//!
//! A single pass turns command-line flags, environment variables and
//! hardcoded defaults into a validated [`LilypadOptions`]. Precedence per
//! field is flag, then environment, then default.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

use crate::cli::ServeArgs;
use crate::config::schema::{
    ContractOptions, ControllerOptions, LilypadOptions, ServerOptions, StoreOptions,
};
use crate::config::validation::{validate_options, ValidationError};

pub const POSTGRES_HOST: &str = "POSTGRES_HOST";
pub const POSTGRES_PORT: &str = "POSTGRES_PORT";
pub const POSTGRES_DATABASE: &str = "POSTGRES_DATABASE";
pub const POSTGRES_USER: &str = "POSTGRES_USER";
pub const POSTGRES_PASSWORD: &str = "POSTGRES_PASSWORD";
pub const POSTGRES_AUTO_MIGRATE: &str = "POSTGRES_AUTO_MIGRATE";
pub const SERVER_URL: &str = "SERVER_URL";
pub const SERVER_HOST: &str = "SERVER_HOST";
pub const SERVER_PORT: &str = "SERVER_PORT";
pub const SERVER_SHUTDOWN_GRACE_SECS: &str = "SERVER_SHUTDOWN_GRACE_SECS";
pub const CONTRACT_ADDRESS: &str = "CONTRACT_ADDRESS";
pub const WALLET_PRIVATE_KEY: &str = "WALLET_PRIVATE_KEY";
pub const RPC_ENDPOINT: &str = "RPC_ENDPOINT";
pub const CHAIN_ID: &str = "CHAIN_ID";
pub const CONTROLLER_CHECKPOINT_NAME: &str = "CONTROLLER_CHECKPOINT_NAME";

/// Error type for option resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// The resolved options failed semantic validation.
    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of environment variables.
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Resolve one field: flag, then environment, then default.
///
/// An empty environment value counts as unset. Values are parsed as given,
/// exactly like flag values.
pub fn resolve<T>(
    key: &'static str,
    flag: Option<T>,
    env: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(value) = flag {
        return Ok(value);
    }

    match env.filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Resolve the full options aggregate and validate it.
pub fn load_options(args: &ServeArgs, env: &impl Environment) -> Result<LilypadOptions, ConfigError> {
    let field = |key: &'static str| env.var(key);
    let args = args.clone();

    let store_defaults = StoreOptions::default();
    let store = StoreOptions {
        host: resolve(POSTGRES_HOST, args.postgres_host, field(POSTGRES_HOST), store_defaults.host)?,
        port: resolve(POSTGRES_PORT, args.postgres_port, field(POSTGRES_PORT), store_defaults.port)?,
        database: resolve(
            POSTGRES_DATABASE,
            args.postgres_database,
            field(POSTGRES_DATABASE),
            store_defaults.database,
        )?,
        username: resolve(POSTGRES_USER, args.postgres_username, field(POSTGRES_USER), store_defaults.username)?,
        password: resolve(
            POSTGRES_PASSWORD,
            args.postgres_password,
            field(POSTGRES_PASSWORD),
            store_defaults.password,
        )?,
        auto_migrate: resolve(
            POSTGRES_AUTO_MIGRATE,
            args.postgres_auto_migrate,
            field(POSTGRES_AUTO_MIGRATE),
            store_defaults.auto_migrate,
        )?,
    };

    let server_defaults = ServerOptions::default();
    let server = ServerOptions {
        url: resolve(SERVER_URL, args.server_url, field(SERVER_URL), server_defaults.url)?,
        host: resolve(SERVER_HOST, args.server_host, field(SERVER_HOST), server_defaults.host)?,
        port: resolve(SERVER_PORT, args.server_port, field(SERVER_PORT), server_defaults.port)?,
        shutdown_grace_secs: resolve(
            SERVER_SHUTDOWN_GRACE_SECS,
            args.server_shutdown_grace_secs,
            field(SERVER_SHUTDOWN_GRACE_SECS),
            server_defaults.shutdown_grace_secs,
        )?,
    };

    let contract_defaults = ContractOptions::default();
    let contract = ContractOptions {
        address: resolve(
            CONTRACT_ADDRESS,
            args.contract_address,
            field(CONTRACT_ADDRESS),
            contract_defaults.address,
        )?,
        private_key: resolve(
            WALLET_PRIVATE_KEY,
            args.private_key,
            field(WALLET_PRIVATE_KEY),
            contract_defaults.private_key,
        )?,
        rpc_endpoint: resolve(RPC_ENDPOINT, args.rpc_endpoint, field(RPC_ENDPOINT), contract_defaults.rpc_endpoint)?,
        chain_id: resolve(CHAIN_ID, args.chain_id, field(CHAIN_ID), contract_defaults.chain_id)?,
    };

    let controller_defaults = ControllerOptions::default();
    let controller = ControllerOptions {
        checkpoint_name: resolve(
            CONTROLLER_CHECKPOINT_NAME,
            args.checkpoint_name,
            field(CONTROLLER_CHECKPOINT_NAME),
            controller_defaults.checkpoint_name,
        )?,
    };

    let options = LilypadOptions {
        controller,
        store,
        server,
        contract,
    };

    validate_options(&options).map_err(ConfigError::Validation)?;

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_precedence() {
        assert_eq!(resolve::<u16>("K", None, None, 80).unwrap(), 80);
        assert_eq!(resolve::<u16>("K", None, Some("8080".into()), 80).unwrap(), 8080);
        assert_eq!(resolve::<u16>("K", Some(9000), Some("8080".into()), 80).unwrap(), 9000);
    }

    #[test]
    fn test_resolve_empty_env_is_unset() {
        assert_eq!(resolve::<u16>("K", None, Some(String::new()), 80).unwrap(), 80);
    }

    #[test]
    fn test_resolve_invalid_env() {
        let err = resolve::<u16>(SERVER_PORT, None, Some("eighty".into()), 80).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: SERVER_PORT, .. }));
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn test_env_values_are_not_trimmed() {
        let vars = env(&[(POSTGRES_PASSWORD, "  padded secret "), (SERVER_PORT, " 8080")]);
        assert_eq!(
            resolve::<String>(POSTGRES_PASSWORD, None, vars.var(POSTGRES_PASSWORD), String::new()).unwrap(),
            "  padded secret "
        );
        assert!(matches!(
            load_options(&ServeArgs::default(), &vars),
            Err(ConfigError::InvalidValue { key: SERVER_PORT, .. })
        ));
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let options = load_options(&ServeArgs::default(), &env(&[])).unwrap();
        assert_eq!(options.server.port, 80);
        assert_eq!(options.store.port, 5432);
        assert!(options.store.auto_migrate);
        assert_eq!(options.store.database, "lilypad");
    }

    #[test]
    fn test_env_then_flag_override() {
        let vars = env(&[
            (SERVER_PORT, "8080"),
            (POSTGRES_HOST, "db.internal"),
            (POSTGRES_AUTO_MIGRATE, "false"),
            (WALLET_PRIVATE_KEY, "0xabc"),
        ]);

        let options = load_options(&ServeArgs::default(), &vars).unwrap();
        assert_eq!(options.server.port, 8080);
        assert_eq!(options.store.host, "db.internal");
        assert!(!options.store.auto_migrate);
        assert_eq!(options.contract.private_key, "0xabc");

        let args = ServeArgs {
            server_port: Some(9090),
            postgres_auto_migrate: Some(true),
            ..ServeArgs::default()
        };
        let options = load_options(&args, &vars).unwrap();
        assert_eq!(options.server.port, 9090);
        assert!(options.store.auto_migrate);
        assert_eq!(options.store.host, "db.internal");
    }

    #[test]
    fn test_validation_errors_surface() {
        let args = ServeArgs {
            server_url: Some("not a url".into()),
            postgres_port: Some(0),
            ..ServeArgs::default()
        };

        match load_options(&args, &env(&[])) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}
