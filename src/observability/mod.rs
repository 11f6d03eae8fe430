//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events inside their lifecycle span (contract, store, controller, server)
//!     → logging.rs subscriber (fmt output, filtered)
//!
//! HTTP requests:
//!     → x-request-id assigned and propagated by the server middleware
//! ```

pub mod logging;
