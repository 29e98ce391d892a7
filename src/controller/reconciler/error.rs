//! # Errors
//!
//! Error taxonomy for resolution and reconciliation.

use crate::constants::{ANNOTATION_DOMAIN, INVALID_REFERENCE_MESSAGE};
use crate::crd::{BackendStatus, ConditionType, KeyStatus};
use crate::provider::TransportError;
use std::collections::BTreeMap;
use thiserror::Error;

/// One list item that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{output_name} {cause}")]
pub struct ParameterError {
    /// Output name the item would have been stored under
    pub output_name: String,
    pub cause: TransportError,
}

/// Discriminant of [`ResolveError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidReference,
    Transport,
    Aggregate,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidReference => "invalid_reference",
            ErrorKind::Transport => "transport",
            ErrorKind::Aggregate => "aggregate",
        }
    }

    /// Condition type a failure of this kind is reported under
    #[must_use]
    pub fn condition_type(&self) -> ConditionType {
        match self {
            ErrorKind::Aggregate => ConditionType::ParamMissing,
            ErrorKind::InvalidReference | ErrorKind::Transport => ConditionType::BackendError,
        }
    }
}

/// Why a reference could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Single reference with neither `name` nor `path`; never reaches the backend
    #[error("{}", INVALID_REFERENCE_MESSAGE)]
    InvalidReference,
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// At least one list item failed; holds every failure in list order
    #[error("{}", join_parameter_errors(.0))]
    Aggregate(Vec<ParameterError>),
}

fn join_parameter_errors(errors: &[ParameterError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ResolveError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::InvalidReference => ErrorKind::InvalidReference,
            ResolveError::Transport(_) => ErrorKind::Transport,
            ResolveError::Aggregate(_) => ErrorKind::Aggregate,
        }
    }

    /// Per-item failure annotations (`ssm.aws/<outputName>_error`)
    ///
    /// Empty for anything but an aggregate failure.
    #[must_use]
    pub fn failure_annotations(&self) -> BTreeMap<String, String> {
        match self {
            ResolveError::Aggregate(errors) => errors
                .iter()
                .map(|e| {
                    (
                        format!("{ANNOTATION_DOMAIN}/{}_error", e.output_name),
                        e.cause.to_string(),
                    )
                })
                .collect(),
            _ => BTreeMap::new(),
        }
    }

    /// Backend status recorded for this failure
    #[must_use]
    pub fn backend_status(&self) -> BackendStatus {
        match self {
            ResolveError::Aggregate(errors) => BackendStatus {
                error: None,
                keys: errors
                    .iter()
                    .map(|e| KeyStatus {
                        name: e.output_name.clone(),
                        error: e.cause.to_string(),
                    })
                    .collect(),
            },
            other => BackendStatus {
                error: Some(other.to_string()),
                keys: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolveError),
    #[error("Reconciliation failed: {0}")]
    ReconciliationFailed(#[from] anyhow::Error),
}

impl ReconcilerError {
    /// Metrics label for `error_policy`
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            ReconcilerError::Resolution(e) => e.kind().as_str(),
            ReconcilerError::ReconciliationFailed(_) => "host",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(name: &str, key: &str) -> ParameterError {
        ParameterError {
            output_name: name.to_string(),
            cause: TransportError::NotFound(key.to_string()),
        }
    }

    #[test]
    fn test_invalid_reference_message_is_fixed() {
        let err = ResolveError::InvalidReference;
        assert_eq!(
            err.to_string(),
            "Invalid ParameterStoreRef provided: at least name or path has to be set"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        assert_eq!(err.kind().condition_type(), ConditionType::BackendError);
    }

    #[test]
    fn test_aggregate_formatting_and_annotations() {
        let err = ResolveError::Aggregate(vec![missing("DB", "/app/db"), missing("API", "/x/api")]);
        assert_eq!(
            err.to_string(),
            "DB parameter /app/db not found; API parameter /x/api not found"
        );
        assert_eq!(err.kind().condition_type(), ConditionType::ParamMissing);

        let annotations = err.failure_annotations();
        assert_eq!(
            annotations.get("ssm.aws/DB_error").map(String::as_str),
            Some("parameter /app/db not found")
        );
        assert_eq!(annotations.len(), 2);
    }

    #[test]
    fn test_backend_status_by_kind() {
        let aggregate = ResolveError::Aggregate(vec![missing("DB", "/app/db")]);
        let status = aggregate.backend_status();
        assert!(status.error.is_none());
        assert_eq!(status.keys.len(), 1);
        assert_eq!(status.keys[0].name, "DB");
        assert_eq!(status.keys[0].error, "parameter /app/db not found");

        let transport = ResolveError::Transport(TransportError::Request("timeout".to_string()));
        let status = transport.backend_status();
        assert_eq!(status.error.as_deref(), Some("timeout"));
        assert!(status.keys.is_empty());
        assert!(transport.failure_annotations().is_empty());
    }

    #[test]
    fn test_reconciler_error_kind_label() {
        let err = ReconcilerError::from(ResolveError::InvalidReference);
        assert_eq!(err.kind_label(), "invalid_reference");
        let err = ReconcilerError::from(anyhow::anyhow!("api down"));
        assert_eq!(err.kind_label(), "host");
    }
}
