//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::*;
use crate::provider::BackendKind;
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Parameter backend shared by every pass (`aws` or `azure`)
    pub backend: BackendKind,
    /// AWS region; falls back to the SDK default provider chain when unset
    pub aws_region: Option<String>,
    /// Azure App Configuration store name (`https://{name}.azconfig.io`)
    pub azure_app_config_name: Option<String>,
    /// Explicit Azure App Configuration endpoint, takes precedence over the store name
    pub azure_app_config_endpoint: Option<String>,
    /// Client ID for Azure Workload Identity; Managed Identity is used when unset
    pub azure_client_id: Option<String>,
    /// Local/test endpoint; substitutes static credentials when set
    pub endpoint_override: Option<String>,
    /// Page size for path/prefix listings
    pub page_size: i32,
    /// Number of list items resolved concurrently within one pass
    pub list_resolve_concurrency: usize,
    /// Periodic resync interval after a successful pass (seconds)
    pub resync_interval_secs: u64,
    /// Reconciliation error requeue interval (seconds)
    /// How long to wait before retrying a failed reconciliation
    pub reconciliation_error_requeue_secs: u64,
    /// Maximum concurrent reconciliations
    pub max_concurrent_reconciliations: u16,
    /// Port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE), used when `RUST_LOG` is unset
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Aws,
            aws_region: None,
            azure_app_config_name: None,
            azure_app_config_endpoint: None,
            azure_client_id: None,
            endpoint_override: None,
            page_size: DEFAULT_PAGE_SIZE,
            list_resolve_concurrency: DEFAULT_LIST_RESOLVE_CONCURRENCY,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            metrics_port: DEFAULT_METRICS_PORT,
            log_level: "INFO".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            backend: non_empty("PARAMETER_BACKEND")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backend),
            aws_region: non_empty("AWS_REGION"),
            azure_app_config_name: non_empty("AZURE_APP_CONFIG_NAME"),
            azure_app_config_endpoint: non_empty("AZURE_APP_CONFIG_ENDPOINT"),
            azure_client_id: non_empty("AZURE_CLIENT_ID"),
            endpoint_override: non_empty(LOCAL_STACK_ENDPOINT_ENV),
            page_size: parse_or(&lookup, "PARAMETER_PAGE_SIZE", defaults.page_size),
            list_resolve_concurrency: parse_or(
                &lookup,
                "LIST_RESOLVE_CONCURRENCY",
                defaults.list_resolve_concurrency,
            )
            .max(1),
            resync_interval_secs: parse_or(
                &lookup,
                "RESYNC_INTERVAL_SECS",
                defaults.resync_interval_secs,
            ),
            reconciliation_error_requeue_secs: parse_or(
                &lookup,
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                defaults.reconciliation_error_requeue_secs,
            ),
            max_concurrent_reconciliations: parse_or(
                &lookup,
                "MAX_CONCURRENT_RECONCILIATIONS",
                defaults.max_concurrent_reconciliations,
            ),
            metrics_port: parse_or(&lookup, "METRICS_PORT", defaults.metrics_port),
            log_level: non_empty("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: non_empty("LOG_FORMAT").unwrap_or(defaults.log_format),
        }
    }

    /// Get periodic resync duration
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    /// Get reconciliation error requeue duration
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }
}

/// Read a value through `lookup` or return the default
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
