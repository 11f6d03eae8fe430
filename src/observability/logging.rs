//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Resolve the filter from the CLI, then RUST_LOG, then the default
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Only `main` installs the subscriber; library code logs through spans
//!   attached by the bootstrap sequencer and never configures output

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `--log-level` nor RUST_LOG is set.
pub const DEFAULT_FILTER: &str = "lilypad=info,tower_http=info";

/// Build the filter: explicit directives, then RUST_LOG, then [`DEFAULT_FILTER`].
pub fn build_filter(directives: Option<&str>) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    match directives {
        Some(directives) => EnvFilter::try_new(directives),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber.
pub fn init_logging(directives: Option<&str>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = build_filter(directives)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_directives() {
        let filter = build_filter(Some("lilypad=debug")).unwrap();
        assert!(filter.to_string().contains("lilypad=debug"));
    }

    #[test]
    fn test_invalid_directives() {
        assert!(build_filter(Some("lilypad=notalevel")).is_err());
    }
}
