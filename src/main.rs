//! Lilypad API server
//!
//! # Architecture Overview
//!
//! ```text
//!   flags + env + defaults
//!            │
//!            ▼
//!   ┌─────────────────┐     ┌──────────────────────────────────────────────────┐
//!   │ config::loader  │────▶│              lifecycle::startup                  │
//!   └─────────────────┘     │                                                  │
//!                           │  contract ──▶ store ──▶ controller ──▶ server     │
//!   ┌─────────────────┐     │  client       (pg)      (start)        (spawned) │
//!   │ lifecycle::     │────▶│                                                  │
//!   │ signals         │     │  wait for Shutdown ─▶ cleanup drain (reverse)    │
//!   └─────────────────┘     └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use lilypad::cli::{Cli, Command};
use lilypad::config::{load_options, ProcessEnv};
use lilypad::lifecycle::{serve, LilypadServices};
use lilypad::observability::logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    match cli.command {
        Command::Serve(args) => {
            let options = load_options(&args, &ProcessEnv)?;

            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                store = ?options.store,
                server = ?options.server,
                contract = ?options.contract,
                "lilypad starting"
            );

            serve(&LilypadServices, options).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
