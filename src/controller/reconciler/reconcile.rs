//! # Reconciliation
//!
//! One pass: resolve, decide, persist.
//!
//! [`decide`] is the pure state machine step. [`run_pass`] wraps it with the
//! backend and storage calls, and [`reconcile`]/[`error_policy`] adapt it to
//! the kube-rs controller.

use crate::controller::reconciler::error::{ReconcilerError, ResolveError};
use crate::controller::reconciler::resolve::{resolve_value_from, Resolved};
use crate::controller::reconciler::secret::OutputRecord;
use crate::controller::reconciler::status::{failure_status, status_changed, success_status};
use crate::controller::reconciler::store::{SecretStore, StatusStore};
use crate::controller::reconciler::types::Reconciler;
use crate::crd::{ParameterStore, ParameterStoreStatus, SecretStatus};
use crate::observability::metrics;
use crate::provider::ParameterBackend;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::controller::Action;
use kube::{Resource, ResourceExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

/// Result of the state machine for one pass
#[derive(Debug, Clone)]
pub struct Decision {
    /// Status to persist (if it differs from the previous one)
    pub status: ParameterStoreStatus,
    /// Secret to upsert; `None` on a failed pass
    pub record: Option<OutputRecord>,
    /// Failure to report to the host
    pub error: Option<ResolveError>,
}

impl Decision {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Pure state machine step: `(spec outcome, previous status) -> (next status, record, failed)`
pub fn decide(
    name: &str,
    namespace: &str,
    previous: &ParameterStoreStatus,
    generation: Option<i64>,
    outcome: Result<Resolved, ResolveError>,
    now: DateTime<Utc>,
) -> Decision {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    match outcome {
        Ok(resolved) => {
            let record = OutputRecord::synthesize(name, namespace, resolved, now);
            let secret = SecretStatus {
                name: record.name.clone(),
                namespace: record.namespace.clone(),
            };
            Decision {
                status: success_status(previous, secret, generation, &timestamp),
                record: Some(record),
                error: None,
            }
        }
        Err(error) => Decision {
            status: failure_status(previous, &error, generation, &timestamp),
            record: None,
            error: Some(error),
        },
    }
}

/// Whether the Secret was created or updated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretWrite {
    Created,
    Updated,
}

impl SecretWrite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretWrite::Created => "create",
            SecretWrite::Updated => "update",
        }
    }
}

/// What a successful pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub secret_write: SecretWrite,
    pub values: usize,
    pub status_written: bool,
}

async fn upsert_secret(store: &dyn SecretStore, mut secret: Secret) -> anyhow::Result<SecretWrite> {
    let name = secret.name_any();
    let namespace = secret.namespace().unwrap_or_default();
    match store.get(&name, &namespace).await? {
        Some(current) => {
            secret.metadata.resource_version = current.metadata.resource_version;
            store.update(&secret).await?;
            Ok(SecretWrite::Updated)
        }
        None => {
            store.create(&secret).await?;
            Ok(SecretWrite::Created)
        }
    }
}

/// Run one reconciliation pass against explicit collaborators
///
/// Status is written at most once, and only when it differs from the status
/// carried by `parameter_store`. A failed resolution leaves any existing Secret
/// untouched.
pub async fn run_pass(
    parameter_store: &ParameterStore,
    backend: &dyn ParameterBackend,
    secrets: &dyn SecretStore,
    statuses: &dyn StatusStore,
    concurrency: usize,
) -> Result<PassReport, ReconcilerError> {
    let name = parameter_store.name_any();
    let namespace = parameter_store
        .namespace()
        .context("ParameterStore has no namespace")?;
    let previous = parameter_store.status.clone().unwrap_or_default();

    let outcome = resolve_value_from(backend, &parameter_store.spec.value_from, concurrency).await;
    let decision = decide(
        &name,
        &namespace,
        &previous,
        parameter_store.metadata.generation,
        outcome,
        Utc::now(),
    );

    let mut written = None;
    let mut values = 0;
    if let Some(record) = decision.record.clone() {
        values = record.data.len();
        let secret = record.into_secret(parameter_store.controller_owner_ref(&()));
        let write = upsert_secret(secrets, secret).await?;
        metrics::increment_secret_writes(write.as_str());
        metrics::increment_parameters_resolved(values);
        info!(
            secret.operation = write.as_str(),
            values = values,
            "Secret {}/{} synchronized",
            namespace,
            name
        );
        written = Some(write);
    }

    let status_written = status_changed(&previous, &decision.status);
    if status_written {
        statuses
            .update_status(parameter_store, &decision.status)
            .await?;
        metrics::increment_status_updates();
    }

    match (decision.error, written) {
        (Some(error), _) => {
            for (annotation, cause) in error.failure_annotations() {
                warn!(annotation = %annotation, "{}", cause);
            }
            Err(ReconcilerError::Resolution(error))
        }
        (None, Some(secret_write)) => Ok(PassReport {
            secret_write,
            values,
            status_written,
        }),
        (None, None) => Err(ReconcilerError::ReconciliationFailed(anyhow::anyhow!(
            "successful pass produced no Secret"
        ))),
    }
}

/// kube-rs reconcile entry point
pub async fn reconcile(
    parameter_store: Arc<ParameterStore>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = parameter_store.name_any();
    let namespace = parameter_store.namespace().unwrap_or_default();

    if parameter_store.meta().deletion_timestamp.is_some() {
        info!("ParameterStore {}/{} is being deleted, skipping", namespace, name);
        return Ok(Action::await_change());
    }

    let span = info_span!(
        "reconcile",
        resource.name = %name,
        resource.namespace = %namespace,
        backend = ctx.backend.name()
    );
    let start = Instant::now();
    metrics::increment_reconciliations();

    let result = run_pass(
        &parameter_store,
        ctx.backend.as_ref(),
        &ctx.secrets,
        &ctx.statuses,
        ctx.config.list_resolve_concurrency,
    )
    .instrument(span)
    .await;

    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    result.map(|_| Action::requeue(ctx.config.resync_interval()))
}

/// kube-rs error policy: log, count by kind, requeue after the configured delay
pub fn error_policy(
    parameter_store: Arc<ParameterStore>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    error!(
        error.kind = error.kind_label(),
        "Reconciliation error for {}/{}: {}",
        parameter_store.namespace().unwrap_or_default(),
        parameter_store.name_any(),
        error
    );
    metrics::increment_reconciliation_errors(error.kind_label());
    Action::requeue(ctx.config.reconciliation_error_requeue_duration())
}
