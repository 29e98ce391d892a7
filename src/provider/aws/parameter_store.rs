//! # AWS Parameter Store Client
//!
//! Resolves parameters from AWS Systems Manager Parameter Store.
//!
//! - `GetParameter` (with decryption) for references by name
//! - `GetParametersByPath` (paginated, with decryption) for references by path
//! - IRSA / default credential chain in-cluster, static credentials against a local endpoint

use crate::config::ControllerConfig;
use crate::constants::LOCAL_STACK_REGION;
use crate::provider::common::{record_backend_metrics, FirstWins};
use crate::provider::{ParameterBackend, ResolvedValue, TransportError};
use anyhow::Result;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::Client as SsmClient;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

const BACKEND: &str = "aws";

/// AWS Parameter Store backend implementation
pub struct AwsParameterStore {
    client: SsmClient,
    page_size: i32,
}

impl std::fmt::Debug for AwsParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsParameterStore")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl AwsParameterStore {
    /// Create a client from controller configuration
    ///
    /// With an endpoint override the client talks to that endpoint using static
    /// `test`/`test` credentials in `us-east-1`.
    #[allow(
        clippy::missing_errors_doc,
        reason = "Error documentation is provided in doc comments"
    )]
    pub async fn new(config: &ControllerConfig) -> Result<Self> {
        if let Some(endpoint) = config.endpoint_override.as_deref() {
            return Ok(Self::local(endpoint, config.page_size).await);
        }

        info!("Using default AWS credential chain (IRSA when running in EKS)");
        let sdk_config = Self::create_default_config(config.aws_region.as_deref()).await;
        Ok(Self::from_client(SsmClient::new(&sdk_config), config.page_size))
    }

    /// Client for a local/test endpoint with static credentials
    pub async fn local(endpoint: &str, page_size: i32) -> Self {
        info!("Redirecting AWS Parameter Store client to {}", endpoint);
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(LOCAL_STACK_REGION))
            .credentials_provider(Credentials::new("test", "test", None, None, "static"))
            .load()
            .await;

        let ssm_config = aws_sdk_ssm::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint)
            .build();
        Self::from_client(SsmClient::from_conf(ssm_config), page_size)
    }

    /// Wrap an existing SSM client
    pub fn from_client(client: SsmClient, page_size: i32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    /// Create AWS SDK config using default credential chain
    async fn create_default_config(region: Option<&str>) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        loader.load().await
    }
}

/// Stable description of an SDK failure
///
/// Service errors are reduced to code and message so that repeated failures
/// read the same; the request id the SDK attaches would differ on every call.
fn describe_sdk_error<E>(err: &SdkError<E>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match err.as_service_error() {
        Some(service) => match (service.code(), service.message()) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code.to_string(),
            _ => service.to_string(),
        },
        None => DisplayErrorContext(err).to_string(),
    }
}

#[async_trait]
impl ParameterBackend for AwsParameterStore {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn resolve_by_name(&self, name: &str) -> Result<ResolvedValue, TransportError> {
        let span = info_span!("aws.ssm.get_parameter", parameter.name = name);
        let start = Instant::now();

        let result = async {
            let response = self
                .client
                .get_parameter()
                .name(name)
                .with_decryption(true)
                .send()
                .await
                .map_err(|e| {
                    if e.as_service_error()
                        .is_some_and(|se| se.is_parameter_not_found())
                    {
                        TransportError::NotFound(name.to_string())
                    } else {
                        TransportError::Request(describe_sdk_error(&e))
                    }
                })?;

            let parameter = response.parameter().ok_or_else(|| {
                TransportError::InvalidResponse(format!("no parameter returned for {name}"))
            })?;
            let value = parameter.value().ok_or_else(|| {
                TransportError::InvalidResponse(format!("parameter {name} has no value"))
            })?;
            // Trust the store's own name for the parameter
            let output_name = parameter.name().unwrap_or(name);

            Ok(ResolvedValue::new(output_name, value))
        }
        .instrument(span)
        .await;

        record_backend_metrics(BACKEND, "get_parameter", start, &result);
        result
    }

    async fn resolve_by_prefix(
        &self,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ResolvedValue>, TransportError> {
        let span = info_span!(
            "aws.ssm.get_parameters_by_path",
            parameter.path = prefix,
            recursive = recursive,
            page_size = self.page_size
        );
        let start = Instant::now();

        let result = async {
            let mut pages = self
                .client
                .get_parameters_by_path()
                .path(prefix)
                .recursive(recursive)
                .with_decryption(true)
                .max_results(self.page_size)
                .into_paginator()
                .send();

            let mut collected = FirstWins::new();
            let mut page_number = 0usize;
            while let Some(page) = pages.next().await {
                let page =
                    page.map_err(|e| TransportError::Request(describe_sdk_error(&e)))?;
                page_number += 1;
                debug!(
                    page = page_number,
                    retrieved = page.parameters().len(),
                    "Fetched Parameter Store page"
                );

                for parameter in page.parameters() {
                    let (Some(name), Some(value)) = (parameter.name(), parameter.value()) else {
                        continue;
                    };
                    if !collected.push(name, value) {
                        debug!(parameter.name = name, "Dropping duplicate output name");
                    }
                }
            }

            Ok(collected.into_values())
        }
        .instrument(span)
        .await;

        record_backend_metrics(BACKEND, "get_parameters_by_path", start, &result);
        result
    }
}
