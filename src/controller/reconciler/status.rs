//! # Status Management
//!
//! Computes the next `ParameterStore` status from the outcome of a pass.
//!
//! The state machine is recomputed from scratch on every pass; only the
//! previous status is consulted, to preserve transition times and to skip
//! writes that would not change anything.

use crate::constants::{REASON_RECONCILIATION_FAILED, REASON_RECONCILIATION_SUCCEEDED};
use crate::controller::reconciler::error::ResolveError;
use crate::crd::{
    Condition, ConditionStatus, ConditionType, ParameterStoreStatus, SecretStatus,
};

/// Insert or replace the condition of the same type
///
/// `last_transition_time` is kept when the status did not change.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition, now: &str) {
    match conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
        Some(existing) => {
            condition.last_transition_time = if existing.status == condition.status {
                existing
                    .last_transition_time
                    .clone()
                    .or_else(|| Some(now.to_string()))
            } else {
                Some(now.to_string())
            };
            *existing = condition;
        }
        None => {
            condition.last_transition_time = Some(now.to_string());
            conditions.push(condition);
        }
    }
}

pub fn remove_condition(conditions: &mut Vec<Condition>, r#type: ConditionType) {
    conditions.retain(|c| c.r#type != r#type);
}

fn condition(
    r#type: ConditionType,
    status: ConditionStatus,
    reason: &str,
    message: String,
    generation: Option<i64>,
) -> Condition {
    Condition {
        r#type,
        status,
        last_transition_time: None,
        reason: Some(reason.to_string()),
        message: Some(message),
        observed_generation: generation,
    }
}

/// Status after a failed pass
///
/// The last good Secret reference is left as it was.
pub fn failure_status(
    previous: &ParameterStoreStatus,
    error: &ResolveError,
    generation: Option<i64>,
    now: &str,
) -> ParameterStoreStatus {
    let classified = error.kind().condition_type();
    let message = error.to_string();

    let mut conditions = previous.conditions.clone();
    set_condition(
        &mut conditions,
        condition(
            ConditionType::Ready,
            ConditionStatus::False,
            classified.as_str(),
            message.clone(),
            generation,
        ),
        now,
    );
    set_condition(
        &mut conditions,
        condition(
            classified,
            ConditionStatus::True,
            REASON_RECONCILIATION_FAILED,
            message,
            generation,
        ),
        now,
    );
    let other = match classified {
        ConditionType::ParamMissing => ConditionType::BackendError,
        _ => ConditionType::ParamMissing,
    };
    remove_condition(&mut conditions, other);

    ParameterStoreStatus {
        secret: previous.secret.clone(),
        backend: Some(error.backend_status()),
        conditions,
    }
}

/// Status after a successful pass
pub fn success_status(
    previous: &ParameterStoreStatus,
    secret: SecretStatus,
    generation: Option<i64>,
    now: &str,
) -> ParameterStoreStatus {
    let mut conditions = previous.conditions.clone();
    set_condition(
        &mut conditions,
        condition(
            ConditionType::Ready,
            ConditionStatus::True,
            REASON_RECONCILIATION_SUCCEEDED,
            format!("Secret {} in ready state", secret.name),
            generation,
        ),
        now,
    );
    remove_condition(&mut conditions, ConditionType::ParamMissing);
    remove_condition(&mut conditions, ConditionType::BackendError);

    ParameterStoreStatus {
        secret: Some(secret),
        backend: None,
        conditions,
    }
}

/// Whether `next` must be written, ignoring timestamps
pub fn status_changed(previous: &ParameterStoreStatus, next: &ParameterStoreStatus) -> bool {
    !previous.equivalent(next)
}
