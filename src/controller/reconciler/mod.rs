//! # Reconciler
//!
//! Resolution and reconciliation engine for `ParameterStore` resources.
//!
//! - `error` - error taxonomy
//! - `resolve` - single and list reference resolution
//! - `secret` - Secret synthesis
//! - `status` - condition handling and status computation
//! - `store` - Secret and status storage boundary
//! - `reconcile` - pass orchestration and kube-rs entry points

pub mod error;
pub mod reconcile;
pub mod resolve;
pub mod secret;
pub mod status;
pub mod store;
mod types;

pub use error::{ErrorKind, ParameterError, ReconcilerError, ResolveError};
pub use reconcile::{decide, error_policy, reconcile, run_pass, Decision, PassReport, SecretWrite};
pub use resolve::{resolve_list_refs, resolve_single_ref, resolve_value_from, Resolved};
pub use secret::OutputRecord;
pub use store::{KubeSecretStore, KubeStatusStore, SecretStore, StatusStore};
pub use types::Reconciler;
