//! # Logging
//!
//! `tracing` subscriber setup shared by the controller and `psctl`.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// Parse `LOG_FORMAT`; anything other than `text` is JSON
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("text") {
            LogFormat::Text
        } else {
            LogFormat::Json
        }
    }
}

/// Build the env filter: `RUST_LOG` wins, otherwise `parameter_store_controller=<level>`
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "parameter_store_controller={}",
            log_level.trim().to_ascii_lowercase()
        )
        .into()
    })
}

/// Install the global subscriber
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn init_logging(log_level: &str, format: LogFormat) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(log_level));
    match format {
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize tracing subscriber: {e}")),
        LogFormat::Text => builder
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize tracing subscriber: {e}")),
    }
}
