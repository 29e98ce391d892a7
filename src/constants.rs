//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Annotation/label domain owned by this controller
pub const ANNOTATION_DOMAIN: &str = "ssm.aws";

/// Annotation stamped on every synthesized Secret with the RFC 3339 time of the last successful sync
pub const UPDATED_ANNOTATION: &str = "ssm.aws/updated";

/// Annotation written by `psctl reconcile` to request an immediate pass
pub const RECONCILE_REQUEST_ANNOTATION: &str = "ssm.aws/reconcile-requested";

/// Field manager used for status patches
pub const FIELD_MANAGER: &str = "parameter-store-controller";

/// Value of the `app.kubernetes.io/managed-by` label on synthesized Secrets
pub const MANAGED_BY: &str = "parameter-store-controller";

/// Condition reason for a successful pass
pub const REASON_RECONCILIATION_SUCCEEDED: &str = "ReconciliationSucceeded";

/// Condition reason for a failed pass
pub const REASON_RECONCILIATION_FAILED: &str = "ReconciliationFailed";

/// Message returned when a `parameterStoreRef` has neither `name` nor `path`
pub const INVALID_REFERENCE_MESSAGE: &str =
    "Invalid ParameterStoreRef provided: at least name or path has to be set";

/// Default page size for path/prefix listings (`MaxResults` on SSM)
pub const DEFAULT_PAGE_SIZE: i32 = 10;

/// Default number of list items resolved concurrently within one pass
pub const DEFAULT_LIST_RESOLVE_CONCURRENCY: usize = 4;

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 60;

/// Default periodic resync interval after a successful pass (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default maximum number of concurrent reconciliations
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Environment variable that redirects backend clients to a local/test endpoint
pub const LOCAL_STACK_ENDPOINT_ENV: &str = "LOCAL_STACK_ENDPOINT";

/// Region used together with the local endpoint override
pub const LOCAL_STACK_REGION: &str = "us-east-1";

/// OAuth scope for Azure App Configuration data-plane tokens
pub const AZURE_APP_CONFIG_SCOPE: &str = "https://appconfig.azure.net/.default";

/// Azure App Configuration REST API version
pub const AZURE_APP_CONFIG_API_VERSION: &str = "1.0";
