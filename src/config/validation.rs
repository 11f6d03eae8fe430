//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of resolved options (parsing is done by the loader)
//! - Validate value ranges (ports valid, names non-empty)
//! - Validate the public server URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LilypadOptions → Result<(), Vec<ValidationError>>
//! - Contract fields are left to the contract client so construction order
//!   decides which failure surfaces first

use thiserror::Error;

use crate::config::schema::LilypadOptions;

/// A single semantic problem with the resolved options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must not be 0")]
    ZeroPort { field: &'static str },

    #[error("server url {url:?} is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },
}

pub fn validate_options(options: &LilypadOptions) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if options.store.port == 0 {
        errors.push(ValidationError::ZeroPort { field: "postgres port" });
    }
    if options.store.database.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "postgres database" });
    }
    if options.server.host.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "server host" });
    }
    if options.controller.checkpoint_name.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "checkpoint name" });
    }

    if !options.server.url.is_empty() {
        match url::Url::parse(&options.server.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::InvalidUrl {
                url: options.server.url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidUrl {
                url: options.server.url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
