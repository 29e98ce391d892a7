//! Parameter Store Controller Library
//!
//! Resolves `ParameterStore` references against AWS Systems Manager Parameter
//! Store or Azure App Configuration and keeps a Kubernetes Secret in sync.
//! Tests are included in the module files and under `tests/`.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod provider;
pub mod server;

pub use config::ControllerConfig;
pub use crd::{ParameterStore, ParameterStoreSpec, ParameterStoreStatus};
pub use provider::{ParameterBackend, ResolvedValue, TransportError};
