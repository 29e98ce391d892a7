//! # ParameterStore Status
//!
//! Status types for tracking reconciliation state and conditions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of the ParameterStore resource
///
/// `None` fields serialize as `null` so a merge patch of the whole status clears them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParameterStoreStatus {
    /// Secret synthesized by the last successful pass
    #[serde(default)]
    pub secret: Option<SecretStatus>,
    /// Backend failure details from the last failed pass
    #[serde(default)]
    pub backend: Option<BackendStatus>,
    /// Conditions represent the latest available observations, at most one per type
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Reference to the synthesized Secret
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretStatus {
    pub name: String,
    pub namespace: String,
}

/// Backend failure details
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    /// Transport or invalid-reference error message
    #[serde(default)]
    pub error: Option<String>,
    /// One entry per list item that could not be resolved
    #[serde(default)]
    pub keys: Vec<KeyStatus>,
}

impl BackendStatus {
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.keys.is_empty()
    }
}

/// Per-key failure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatus {
    /// Output name of the failed item
    pub name: String,
    pub error: String,
}

/// Condition types reported by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ConditionType {
    Ready,
    ParamMissing,
    BackendError,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Ready => "Ready",
            ConditionType::ParamMissing => "ParamMissing",
            ConditionType::BackendError => "BackendError",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a condition (True, False, Unknown)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: ConditionType,
    pub status: ConditionStatus,
    /// Last transition time (RFC3339)
    #[serde(default)]
    pub last_transition_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub observed_generation: Option<i64>,
}

impl Condition {
    /// Equality that ignores `last_transition_time`
    pub fn same_as(&self, other: &Condition) -> bool {
        self.r#type == other.r#type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
            && self.observed_generation == other.observed_generation
    }
}

/// State derived from the stored conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    /// No pass has completed yet
    Unknown,
    /// Last pass failed with the given classification
    Failing(ConditionType),
    Ready,
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileState::Unknown => f.write_str("Unknown"),
            ReconcileState::Failing(kind) => write!(f, "Failing({kind})"),
            ReconcileState::Ready => f.write_str("Ready"),
        }
    }
}

impl ParameterStoreStatus {
    pub fn condition(&self, r#type: ConditionType) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == r#type)
    }

    /// Current state machine position
    pub fn state(&self) -> ReconcileState {
        match self.condition(ConditionType::Ready).map(|c| c.status) {
            Some(ConditionStatus::True) => ReconcileState::Ready,
            Some(ConditionStatus::False) => [ConditionType::ParamMissing, ConditionType::BackendError]
                .into_iter()
                .find(|t| {
                    self.condition(*t)
                        .is_some_and(|c| c.status == ConditionStatus::True)
                })
                .map_or(ReconcileState::Unknown, ReconcileState::Failing),
            _ => ReconcileState::Unknown,
        }
    }

    /// Structural equality that ignores condition timestamps and condition order
    pub fn equivalent(&self, other: &ParameterStoreStatus) -> bool {
        self.secret == other.secret
            && self.backend == other.backend
            && self.conditions.len() == other.conditions.len()
            && self.conditions.iter().all(|c| {
                other
                    .condition(c.r#type)
                    .is_some_and(|o| o.same_as(c))
            })
    }
}
