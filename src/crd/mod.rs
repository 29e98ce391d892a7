//! # Custom Resource Definitions
//!
//! CRD types for the Parameter Store Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `ParameterStore` specification and reference types
//! - `status.rs` - Status types for tracking reconciliation state

mod spec;
mod status;

// Re-export all public types
pub use spec::{
    default_true, ParameterStore, ParameterStoreRef, ParameterStoreSpec, ParametersStoreRef,
    ValueFrom,
};
pub use status::{
    BackendStatus, Condition, ConditionStatus, ConditionType, KeyStatus, ParameterStoreStatus,
    ReconcileState, SecretStatus,
};
