//! # Types
//!
//! Shared reconciler context.

use crate::config::ControllerConfig;
use crate::controller::reconciler::store::{KubeSecretStore, KubeStatusStore};
use crate::provider::ParameterBackend;
use kube::Client;
use std::sync::Arc;

/// Context handed to every reconciliation
///
/// One backend instance is shared by all passes.
#[derive(Clone)]
pub struct Reconciler {
    pub backend: Arc<dyn ParameterBackend>,
    pub config: ControllerConfig,
    pub secrets: KubeSecretStore,
    pub statuses: KubeStatusStore,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(client: Client, backend: Arc<dyn ParameterBackend>, config: ControllerConfig) -> Self {
        Self {
            secrets: KubeSecretStore::new(client.clone()),
            statuses: KubeStatusStore::new(client),
            backend,
            config,
        }
    }
}
