//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `parameter_store_reconciliations_total` - Total number of reconciliation passes
//! - `parameter_store_reconciliation_errors_total` - Failed passes by error kind
//! - `parameter_store_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `parameter_store_backend_operations_total` - Backend calls by backend and operation
//! - `parameter_store_backend_operation_duration_seconds` - Duration of backend calls
//! - `parameter_store_backend_operation_errors_total` - Failed backend calls by backend
//! - `parameter_store_parameters_resolved_total` - Values resolved into Secrets
//! - `parameter_store_status_updates_total` - Status subresource writes
//! - `parameter_store_secret_writes_total` - Secret writes by operation (create, update)

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "parameter_store_reconciliations_total",
        "Total number of reconciliation passes",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "parameter_store_reconciliation_errors_total",
            "Total number of failed reconciliation passes by error kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "parameter_store_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static BACKEND_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "parameter_store_backend_operations_total",
            "Total number of backend operations by backend and operation",
        ),
        &["backend", "operation"],
    )
    .expect("Failed to create BACKEND_OPERATIONS_TOTAL metric - this should never happen")
});

static BACKEND_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "parameter_store_backend_operation_duration_seconds",
            "Duration of backend operations in seconds by backend",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["backend"],
    )
    .expect("Failed to create BACKEND_OPERATION_DURATION metric - this should never happen")
});

static BACKEND_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "parameter_store_backend_operation_errors_total",
            "Total number of backend operation errors by backend",
        ),
        &["backend"],
    )
    .expect("Failed to create BACKEND_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static PARAMETERS_RESOLVED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "parameter_store_parameters_resolved_total",
        "Total number of parameter values written into Secrets",
    )
    .expect("Failed to create PARAMETERS_RESOLVED_TOTAL metric - this should never happen")
});

static STATUS_UPDATES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "parameter_store_status_updates_total",
        "Total number of ParameterStore status writes",
    )
    .expect("Failed to create STATUS_UPDATES_TOTAL metric - this should never happen")
});

static SECRET_WRITES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "parameter_store_secret_writes_total",
            "Total number of Secret writes by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create SECRET_WRITES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(BACKEND_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BACKEND_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(BACKEND_OPERATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PARAMETERS_RESOLVED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_UPDATES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRET_WRITES_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

/// Record a completed backend call
pub fn record_backend_operation(backend: &str, operation: &str, duration: f64) {
    BACKEND_OPERATIONS_TOTAL
        .with_label_values(&[backend, operation])
        .inc();
    BACKEND_OPERATION_DURATION
        .with_label_values(&[backend])
        .observe(duration);
}

pub fn increment_backend_operation_errors(backend: &str) {
    BACKEND_OPERATION_ERRORS_TOTAL
        .with_label_values(&[backend])
        .inc();
}

pub fn increment_parameters_resolved(count: usize) {
    PARAMETERS_RESOLVED_TOTAL.inc_by(count as u64);
}

pub fn increment_status_updates() {
    STATUS_UPDATES_TOTAL.inc();
}

pub fn increment_secret_writes(operation: &str) {
    SECRET_WRITES_TOTAL.with_label_values(&[operation]).inc();
}
