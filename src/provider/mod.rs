//! # Provider Modules
//!
//! Parameter backends the controller resolves references against.
//!
//! Each backend implements [`ParameterBackend`]. A single instance is shared by
//! every reconciliation pass, so implementations hold no per-call mutable state.

use crate::config::ControllerConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// Common utilities shared across providers
pub mod common;

// Provider implementations
pub mod aws;
pub mod azure;

pub use common::normalize_key;

/// One resolved parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    /// Field name in the synthesized Secret
    pub output_name: String,
    pub value: String,
}

impl ResolvedValue {
    pub fn new(output_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            output_name: output_name.into(),
            value: value.into(),
        }
    }
}

/// A backend call failed
///
/// Covers network, authentication, not-found and malformed-response failures.
/// Client timeouts surface here as well.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("parameter {0} not found")]
    NotFound(String),
    #[error("{0}")]
    Request(String),
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
}

/// Capability set of a parameter backend
#[async_trait]
pub trait ParameterBackend: Send + Sync {
    /// Backend name used for metrics labels and log fields
    fn name(&self) -> &'static str;

    /// Resolve one parameter by exact name
    ///
    /// The output name is the store's own name for the parameter, not normalized.
    async fn resolve_by_name(&self, name: &str) -> Result<ResolvedValue, TransportError>;

    /// Resolve every parameter under `prefix`, following pagination
    ///
    /// Output names are normalized; when two entries normalize to the same
    /// name the first one encountered wins. A failure on any page discards
    /// everything collected so far.
    async fn resolve_by_prefix(
        &self,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ResolvedValue>, TransportError>;
}

/// Which backend the controller talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// AWS Systems Manager Parameter Store
    #[default]
    Aws,
    /// Azure App Configuration
    Azure,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" | "ssm" => Ok(BackendKind::Aws),
            "azure" | "appconfig" => Ok(BackendKind::Azure),
            other => Err(anyhow::anyhow!("Unknown parameter backend: {other}")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Aws => f.write_str("aws"),
            BackendKind::Azure => f.write_str("azure"),
        }
    }
}

/// Construct the configured backend
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub async fn build_backend(config: &ControllerConfig) -> Result<Arc<dyn ParameterBackend>> {
    match config.backend {
        BackendKind::Aws => {
            let backend = aws::AwsParameterStore::new(config)
                .await
                .context("Failed to create AWS Parameter Store backend")?;
            Ok(Arc::new(backend))
        }
        BackendKind::Azure => {
            let backend = azure::AzureAppConfiguration::new(config)
                .context("Failed to create Azure App Configuration backend")?;
            Ok(Arc::new(backend))
        }
    }
}
