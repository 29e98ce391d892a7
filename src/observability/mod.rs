//! # Observability
//!
//! Observability modules for logging and metrics.
//!
//! - `logging`: `tracing` subscriber initialisation
//! - `metrics`: Prometheus metrics collection

pub mod logging;
pub mod metrics;

// Re-export for convenience
pub use logging::{init_logging, LogFormat};
pub use metrics::*;
