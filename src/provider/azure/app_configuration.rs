//! # Azure App Configuration Client
//!
//! Resolves key-values from the Azure App Configuration REST API.
//!
//! - `GET /kv/{key}` for references by name
//! - `GET /revisions?key={prefix}*` for references by path, following `@nextLink`
//! - Workload Identity or Managed Identity in-cluster, a static token against a local endpoint
//!
//! The revision listing returns every revision of a key, so the same key can
//! appear more than once across pages. The first one seen is kept.

use crate::config::ControllerConfig;
use crate::constants::{AZURE_APP_CONFIG_API_VERSION, AZURE_APP_CONFIG_SCOPE};
use crate::provider::common::{record_backend_metrics, FirstWins};
use crate::provider::{ParameterBackend, ResolvedValue, TransportError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use azure_core::credentials::{AccessToken, Secret, TokenCredential, TokenRequestOptions};
use azure_identity::{ManagedIdentityCredential, WorkloadIdentityCredential};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

const BACKEND: &str = "azure";

/// TokenCredential returning a fixed bearer token
///
/// Used with a local/test endpoint where no real Azure authentication happens.
#[derive(Debug)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Default for StaticTokenCredential {
    fn default() -> Self {
        Self::new("test-token")
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(
        &self,
        _scopes: &[&str],
        _options: Option<TokenRequestOptions<'_>>,
    ) -> azure_core::Result<AccessToken> {
        use typespec_client_core::time::{Duration, OffsetDateTime};

        Ok(AccessToken::new(
            Secret::new(self.token.clone()),
            OffsetDateTime::now_utc() + Duration::seconds(3600),
        ))
    }
}

/// Azure App Configuration backend implementation
pub struct AzureAppConfiguration {
    client: Client,
    endpoint: Url,
    credential: Arc<dyn TokenCredential>,
}

impl std::fmt::Debug for AzureAppConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureAppConfiguration")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

/// Single key-value as returned by `/kv/{key}` and `/revisions`
#[derive(Debug, Deserialize)]
struct KeyValue {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

/// One page of `/revisions`
#[derive(Debug, Deserialize)]
struct RevisionPage {
    #[serde(default)]
    items: Vec<KeyValue>,
    #[serde(rename = "@nextLink", default)]
    next_link: Option<String>,
}

impl AzureAppConfiguration {
    /// Create a client from controller configuration
    ///
    /// Endpoint precedence: endpoint override, `AZURE_APP_CONFIG_ENDPOINT`,
    /// then `https://{AZURE_APP_CONFIG_NAME}.azconfig.io`.
    #[allow(
        clippy::missing_errors_doc,
        reason = "Error documentation is provided in doc comments"
    )]
    pub fn new(config: &ControllerConfig) -> Result<Self> {
        if let Some(endpoint) = config.endpoint_override.as_deref() {
            info!("Redirecting Azure App Configuration client to {}", endpoint);
            return Self::with_credential(endpoint, Arc::new(StaticTokenCredential::default()));
        }

        let endpoint = match (
            config.azure_app_config_endpoint.as_deref(),
            config.azure_app_config_name.as_deref(),
        ) {
            (Some(endpoint), _) => endpoint.to_string(),
            (None, Some(name)) => format!("https://{name}.azconfig.io"),
            (None, None) => {
                return Err(anyhow::anyhow!(
                    "AZURE_APP_CONFIG_NAME or AZURE_APP_CONFIG_ENDPOINT must be set for the azure backend"
                ))
            }
        };

        // Only support Workload Identity or Managed Identity
        // Note: Credential constructors return Arc<dyn TokenCredential>
        let credential: Arc<dyn TokenCredential> = match config.azure_client_id.as_deref() {
            Some(client_id) => {
                info!(
                    "Using Azure Workload Identity authentication with client ID: {}",
                    client_id
                );
                let options = azure_identity::WorkloadIdentityCredentialOptions {
                    client_id: Some(client_id.to_string()),
                    ..Default::default()
                };
                WorkloadIdentityCredential::new(Some(options))
                    .context("Failed to create WorkloadIdentityCredential")?
            }
            None => {
                info!("AZURE_CLIENT_ID not set, using Managed Identity");
                ManagedIdentityCredential::new(None)
                    .context("Failed to create ManagedIdentityCredential")?
            }
        };

        Self::with_credential(&endpoint, credential)
    }

    /// Create a client for `endpoint` with an explicit credential
    #[allow(
        clippy::missing_errors_doc,
        reason = "Error documentation is provided in doc comments"
    )]
    pub fn with_credential(endpoint: &str, credential: Arc<dyn TokenCredential>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))
            .with_context(|| format!("Invalid Azure App Configuration endpoint: {endpoint}"))?;
        if endpoint.cannot_be_a_base() {
            return Err(anyhow::anyhow!(
                "Azure App Configuration endpoint must be an http(s) URL: {endpoint}"
            ));
        }
        info!("Azure App Configuration endpoint: {}", endpoint);

        // Create HTTP client with rustls
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            credential,
        })
    }

    /// Get access token for Azure App Configuration
    async fn get_token(&self) -> Result<String, TransportError> {
        let token_response = self
            .credential
            .get_token(&[AZURE_APP_CONFIG_SCOPE], Some(TokenRequestOptions::default()))
            .await
            .map_err(|e| {
                TransportError::Request(format!(
                    "Failed to get Azure App Configuration access token: {e}"
                ))
            })?;
        Ok(token_response.token.secret().to_string())
    }

    /// `{endpoint}/{segment}/{key}?api-version=...` with the key percent-encoded
    fn kv_url(&self, key: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("kv").push(key);
        }
        url.query_pairs_mut()
            .append_pair("api-version", AZURE_APP_CONFIG_API_VERSION);
        url
    }

    fn revisions_url(&self, prefix: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("revisions");
        }
        url.query_pairs_mut()
            .append_pair("key", &format!("{prefix}*"))
            .append_pair("api-version", AZURE_APP_CONFIG_API_VERSION);
        url
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: Url,
        token: &str,
    ) -> Result<(StatusCode, Option<T>), TransportError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept", "application/vnd.microsoft.appconfig.kv+json, application/json")
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok((status, None));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TransportError::Request(format!(
                "Azure App Configuration returned HTTP {status}: {error_text}"
            )));
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        Ok((status, Some(body)))
    }
}

#[async_trait]
impl ParameterBackend for AzureAppConfiguration {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn resolve_by_name(&self, name: &str) -> Result<ResolvedValue, TransportError> {
        let span = info_span!(
            "azure.appconfig.get",
            key.name = name,
            endpoint = self.endpoint.as_str()
        );
        let start = Instant::now();

        let result = async {
            let token = self.get_token().await?;
            let (_, body) = self.get_json::<KeyValue>(self.kv_url(name), &token).await?;

            let kv = body.ok_or_else(|| TransportError::NotFound(name.to_string()))?;
            let key = kv
                .key
                .ok_or_else(|| TransportError::InvalidResponse("Key not found".to_string()))?;
            Ok(ResolvedValue::new(key, kv.value.unwrap_or_default()))
        }
        .instrument(span)
        .await;

        record_backend_metrics(BACKEND, "get_key_value", start, &result);
        result
    }

    async fn resolve_by_prefix(
        &self,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ResolvedValue>, TransportError> {
        // Key filters are prefix wildcards; nesting is not distinguished
        let span = info_span!(
            "azure.appconfig.list_revisions",
            key.prefix = prefix,
            recursive = recursive,
            endpoint = self.endpoint.as_str()
        );
        let start = Instant::now();

        let result = async {
            let token = self.get_token().await?;
            let mut collected = FirstWins::new();
            let mut next = Some(self.revisions_url(prefix));
            let mut page_number = 0usize;

            while let Some(url) = next.take() {
                let (status, body) = self.get_json::<RevisionPage>(url.clone(), &token).await?;
                // An empty match is a 200 with no items; a 404 here is a failed listing
                let Some(page) = body else {
                    return Err(TransportError::Request(format!(
                        "Azure App Configuration returned HTTP {status} listing {url}"
                    )));
                };
                page_number += 1;
                debug!(
                    page = page_number,
                    retrieved = page.items.len(),
                    "Fetched App Configuration revisions page"
                );

                for kv in page.items {
                    if let Some(key) = kv.key.as_deref() {
                        if !collected.push(key, kv.value.unwrap_or_default()) {
                            debug!(key.name = key, "Dropping duplicate output name");
                        }
                    }
                }

                next = match page.next_link.as_deref().filter(|l| !l.is_empty()) {
                    Some(link) => Some(self.endpoint.join(link).map_err(|e| {
                        TransportError::InvalidResponse(format!("invalid @nextLink {link}: {e}"))
                    })?),
                    None => None,
                };
            }

            Ok(collected.into_values())
        }
        .instrument(span)
        .await;

        record_backend_metrics(BACKEND, "list_revisions", start, &result);
        result
    }
}
