//! Command-line surface.
//!
//! Every flag is optional. Absent flags fall through to the environment and
//! then to the defaults in `config::schema`; see `config::loader`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lilypad")]
#[command(version, about = "Lilypad API server", long_about = None)]
pub struct Cli {
    /// Tracing filter directives (overrides RUST_LOG).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the lilypad api server.
    Serve(ServeArgs),
}

/// Flags for `lilypad serve`.
#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// The host to connect to the postgres server.
    #[arg(long = "postgres-host")]
    pub postgres_host: Option<String>,

    /// The port to connect to the postgres server.
    #[arg(long = "postgres-port")]
    pub postgres_port: Option<u16>,

    /// The database to connect to on the postgres server.
    #[arg(long = "postgres-database")]
    pub postgres_database: Option<String>,

    /// The username to connect to the postgres server.
    #[arg(long = "postgres-username")]
    pub postgres_username: Option<String>,

    /// The password to connect to the postgres server.
    #[arg(long = "postgres-password")]
    pub postgres_password: Option<String>,

    /// Automatically run the migrations on startup.
    #[arg(
        long = "postgres-auto-migrate",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub postgres_auto_migrate: Option<bool>,

    /// The URL the api server is reachable on.
    #[arg(long = "server-url")]
    pub server_url: Option<String>,

    /// The host to bind the api server to.
    #[arg(long = "server-host")]
    pub server_host: Option<String>,

    /// The port to bind the api server to.
    #[arg(long = "server-port")]
    pub server_port: Option<u16>,

    /// Seconds in-flight requests may drain after an interrupt.
    #[arg(long = "server-shutdown-grace-secs")]
    pub server_shutdown_grace_secs: Option<u64>,

    /// The address of the deployed contract.
    #[arg(long = "contract-address")]
    pub contract_address: Option<String>,

    /// The private key used to sign contract transactions.
    #[arg(long = "private-key")]
    pub private_key: Option<String>,

    /// The JSON-RPC endpoint of the chain.
    #[arg(long = "rpc-endpoint")]
    pub rpc_endpoint: Option<String>,

    /// The chain id the contract is deployed on.
    #[arg(long = "chainid")]
    pub chain_id: Option<String>,

    /// Key the controller stores its block checkpoint under.
    #[arg(long = "checkpoint-name")]
    pub checkpoint_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::try_parse_from([
            "lilypad",
            "serve",
            "--postgres-port",
            "6543",
            "--server-host",
            "127.0.0.1",
            "--chainid",
            "31337",
        ])
        .unwrap();

        let Command::Serve(args) = cli.command;
        assert_eq!(args.postgres_port, Some(6543));
        assert_eq!(args.server_host.as_deref(), Some("127.0.0.1"));
        assert_eq!(args.chain_id.as_deref(), Some("31337"));
        assert_eq!(args.server_port, None);
        assert_eq!(args.postgres_auto_migrate, None);
    }

    #[test]
    fn test_auto_migrate_flag_forms() {
        let parse = |extra: &[&str]| {
            let mut argv = vec!["lilypad", "serve"];
            argv.extend_from_slice(extra);
            let Command::Serve(args) = Cli::try_parse_from(argv).unwrap().command;
            args.postgres_auto_migrate
        };

        assert_eq!(parse(&["--postgres-auto-migrate"]), Some(true));
        assert_eq!(parse(&["--postgres-auto-migrate=false"]), Some(false));
        assert_eq!(parse(&[]), None);
    }

    #[test]
    fn test_rejects_invalid_port() {
        let result = Cli::try_parse_from(["lilypad", "serve", "--server-port", "not-a-port"]);
        assert!(result.is_err());
    }
}
