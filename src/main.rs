//! # Parameter Store Controller
//!
//! Kubernetes controller that synchronizes `ParameterStore` resources into Secrets.
//!
//! ## Overview
//!
//! 1. Watches `ParameterStore` custom resources in all namespaces
//! 2. Resolves their references against the configured parameter backend
//! 3. Creates or updates a Secret of the same name, owned by the resource
//! 4. Reports the outcome through status conditions

use anyhow::{Context, Result};
use futures::StreamExt;
use kube::runtime::Controller;
use kube::{Api, Client};
use parameter_store_controller::controller::reconciler::{error_policy, reconcile, Reconciler};
use parameter_store_controller::controller::watch::changed_parameter_stores;
use parameter_store_controller::observability::{self, metrics, LogFormat};
use parameter_store_controller::provider::build_backend;
use parameter_store_controller::server::{start_server, ServerState};
use parameter_store_controller::{ControllerConfig, ParameterStore};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Configure rustls crypto provider FIRST, before any other operations
    // Required for rustls 0.23+ when no default provider is set via features
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        return Err(anyhow::anyhow!("Failed to install rustls crypto provider"));
    }

    let config = ControllerConfig::from_env();
    observability::init_logging(&config.log_level, LogFormat::parse(&config.log_format))?;

    info!("Starting Parameter Store Controller");
    info!(
        backend = %config.backend,
        page_size = config.page_size,
        resync_secs = config.resync_interval_secs,
        "Controller configuration loaded"
    );

    // Initialize metrics
    metrics::register_metrics()?;

    // Start HTTP server for metrics and probes
    let server_state = Arc::new(ServerState::default());
    let server_state_clone = Arc::clone(&server_state);
    let server_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let backend = build_backend(&config).await?;

    // Watch all namespaces
    let parameter_stores: Api<ParameterStore> = Api::all(client.clone());
    let concurrency = config.max_concurrent_reconciliations;
    let reconciler = Arc::new(Reconciler::new(client, backend, config));

    server_state.mark_ready();

    // Status writes do not trigger passes; spec and annotation changes do
    let (reader, changes) = changed_parameter_stores(parameter_stores);
    Controller::for_stream(changes, reader)
        .with_config(kube::runtime::controller::Config::default().concurrency(concurrency))
        .shutdown_on_signal()
        .run(reconcile, error_policy, reconciler)
        .for_each(|_| std::future::ready(()))
        .await;

    info!("Controller stopped");
    Ok(())
}
