//! # Storage Boundary
//!
//! Where synthesized Secrets and `ParameterStore` status are persisted.
//!
//! The reconciler only talks to these traits; the kube implementations below
//! are used in-cluster and tests substitute in-memory ones.

use crate::constants::FIELD_MANAGER;
use crate::crd::{ParameterStore, ParameterStoreStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use tracing::{debug, info};

/// Secret storage: `get`, `create`, `update`
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// `None` when the Secret does not exist
    async fn get(&self, name: &str, namespace: &str) -> Result<Option<Secret>>;

    async fn create(&self, secret: &Secret) -> Result<()>;

    async fn update(&self, secret: &Secret) -> Result<()>;
}

/// Status storage for `ParameterStore` objects
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn update_status(
        &self,
        parameter_store: &ParameterStore,
        status: &ParameterStoreStatus,
    ) -> Result<()>;
}

/// Secrets through the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn secret_coordinates(secret: &Secret) -> Result<(String, String)> {
    let name = secret
        .metadata
        .name
        .clone()
        .context("Secret has no name")?;
    let namespace = secret
        .metadata
        .namespace
        .clone()
        .context("Secret has no namespace")?;
    Ok((name, namespace))
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, name: &str, namespace: &str) -> Result<Option<Secret>> {
        self.api(namespace)
            .get_opt(name)
            .await
            .with_context(|| format!("Failed to get Secret {namespace}/{name}"))
    }

    async fn create(&self, secret: &Secret) -> Result<()> {
        let (name, namespace) = secret_coordinates(secret)?;
        info!("Creating Secret {}/{}", namespace, name);
        self.api(&namespace)
            .create(&PostParams::default(), secret)
            .await
            .with_context(|| format!("Failed to create Secret {namespace}/{name}"))?;
        Ok(())
    }

    async fn update(&self, secret: &Secret) -> Result<()> {
        let (name, namespace) = secret_coordinates(secret)?;
        info!("Updating Secret {}/{}", namespace, name);
        self.api(&namespace)
            .replace(&name, &PostParams::default(), secret)
            .await
            .with_context(|| format!("Failed to update Secret {namespace}/{name}"))?;
        Ok(())
    }
}

/// `ParameterStore` status through a merge patch on the status subresource
#[derive(Clone)]
pub struct KubeStatusStore {
    client: Client,
}

impl std::fmt::Debug for KubeStatusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStatusStore").finish_non_exhaustive()
    }
}

impl KubeStatusStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusStore for KubeStatusStore {
    async fn update_status(
        &self,
        parameter_store: &ParameterStore,
        status: &ParameterStoreStatus,
    ) -> Result<()> {
        let name = parameter_store.name_any();
        let namespace = parameter_store
            .namespace()
            .context("ParameterStore has no namespace")?;
        let api: Api<ParameterStore> = Api::namespaced(self.client.clone(), &namespace);

        let patch = serde_json::json!({
            "status": status
        });

        match api
            .patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(patch))
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                // Deleted while the pass was running; the Secret is garbage-collected
                debug!(
                    "ParameterStore {}/{} no longer exists, skipping status update",
                    namespace, name
                );
                Ok(())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to update status of ParameterStore {namespace}/{name}")),
        }
    }
}
