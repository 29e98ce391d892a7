//! # PSCTL CLI
//!
//! Command-line interface for the Parameter Store Controller.
//!
//! ## Usage
//!
//! ```bash
//! # Resolve a manifest against the configured backend without touching the cluster
//! psctl resolve --file parameterstore.yaml
//!
//! # Show status of a ParameterStore
//! psctl status my-app --namespace default
//!
//! # Trigger reconciliation
//! psctl reconcile my-app
//! ```

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use kube::{
    api::{Api, Patch, PatchParams},
    Client,
};
use parameter_store_controller::constants::RECONCILE_REQUEST_ANNOTATION;
use parameter_store_controller::controller::reconciler::{resolve_value_from, OutputRecord};
use parameter_store_controller::observability::{init_logging, LogFormat};
use parameter_store_controller::provider::build_backend;
use parameter_store_controller::{ControllerConfig, ParameterStore};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Parameter Store Controller CLI
#[derive(Parser)]
#[command(name = "psctl")]
#[command(
    about = "Parameter Store Controller CLI",
    long_about = None,
    after_help = "\
Examples:
  psctl resolve --file parameterstore.yaml --show-values
  psctl status my-app --namespace default
  psctl reconcile my-app
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace
    #[arg(short, long, global = true, default_value = "default")]
    namespace: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a ParameterStore manifest against the configured backend (dry run)
    Resolve {
        /// Path to a ParameterStore YAML manifest
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Print resolved values instead of masking them
        #[arg(long)]
        show_values: bool,
    },
    /// Show status of a ParameterStore resource
    Status {
        /// Name of the ParameterStore resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Trigger reconciliation for a ParameterStore resource
    Reconcile {
        /// Name of the ParameterStore resource
        #[arg(value_name = "NAME")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configure rustls crypto provider FIRST, before any other operations
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        return Err(anyhow::anyhow!("Failed to install rustls crypto provider"));
    }

    let config = ControllerConfig::from_env();
    init_logging("warn", LogFormat::Text)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { file, show_values } => resolve_command(&config, file, show_values).await,
        Commands::Status { name } => {
            let client = kube_client().await?;
            status_command(client, name, cli.namespace).await
        }
        Commands::Reconcile { name } => {
            let client = kube_client().await?;
            reconcile_command(client, name, cli.namespace).await
        }
    }
}

async fn kube_client() -> Result<Client> {
    Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")
}

/// Read a `ParameterStore` manifest from disk
fn load_manifest(file: &Path) -> Result<ParameterStore> {
    let manifest = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read manifest {}", file.display()))?;
    serde_yaml::from_str(&manifest)
        .with_context(|| format!("Failed to parse ParameterStore manifest {}", file.display()))
}

/// Resolve a manifest and print the would-be Secret keys
async fn resolve_command(config: &ControllerConfig, file: PathBuf, show_values: bool) -> Result<()> {
    let parameter_store = load_manifest(&file)?;
    let name = parameter_store
        .metadata
        .name
        .clone()
        .unwrap_or_else(|| "unnamed".to_string());

    let backend = build_backend(config).await?;
    println!("Resolving ParameterStore '{name}' against the {} backend...", config.backend);

    match resolve_value_from(
        backend.as_ref(),
        &parameter_store.spec.value_from,
        config.list_resolve_concurrency,
    )
    .await
    {
        Ok(resolved) => {
            let namespace = parameter_store.metadata.namespace.as_deref().unwrap_or("default");
            let record = OutputRecord::synthesize(&name, namespace, resolved, Utc::now());
            println!("Secret {namespace}/{name} would contain {} key(s):", record.data.len());
            for (key, value) in &record.data {
                if show_values {
                    println!("  {key}={value}");
                } else {
                    println!("  {key}=********");
                }
            }
            Ok(())
        }
        Err(e) => {
            println!("Resolution failed ({}): {e}", e.kind().condition_type());
            for key in e.backend_status().keys {
                println!("  {}: {}", key.name, key.error);
            }
            Err(anyhow::anyhow!("ParameterStore '{name}' could not be resolved"))
        }
    }
}

/// Show the stored status and derived state
async fn status_command(client: Client, name: String, namespace: String) -> Result<()> {
    let api: Api<ParameterStore> = Api::namespaced(client, &namespace);
    let resource = api
        .get(&name)
        .await
        .with_context(|| format!("Failed to get ParameterStore '{namespace}/{name}'"))?;

    let status = resource.status.unwrap_or_default();
    println!("ParameterStore: {namespace}/{name}");
    println!("  State: {}", status.state());
    if let Some(secret) = &status.secret {
        println!("  Secret: {}/{}", secret.namespace, secret.name);
    }
    if let Some(backend) = &status.backend {
        if let Some(error) = &backend.error {
            println!("  Backend error: {error}");
        }
        for key in &backend.keys {
            println!("  Missing: {} ({})", key.name, key.error);
        }
    }
    if !status.conditions.is_empty() {
        println!("  Conditions:");
        for condition in &status.conditions {
            println!(
                "    {}={} reason={} message={} since={}",
                condition.r#type,
                condition.status,
                condition.reason.as_deref().unwrap_or("-"),
                condition.message.as_deref().unwrap_or("-"),
                condition.last_transition_time.as_deref().unwrap_or("-"),
            );
        }
    }

    Ok(())
}

/// Trigger reconciliation by stamping an annotation
/// The controller watches ParameterStore objects, so any metadata change queues a pass
async fn reconcile_command(client: Client, name: String, namespace: String) -> Result<()> {
    let api: Api<ParameterStore> = Api::namespaced(client, &namespace);
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let patch = json!({
        "metadata": {
            "annotations": {
                RECONCILE_REQUEST_ANNOTATION: timestamp
            }
        }
    });

    api.patch(&name, &PatchParams::default(), &Patch::Merge(patch))
        .await
        .with_context(|| format!("Failed to trigger reconciliation for ParameterStore '{namespace}/{name}'"))?;

    println!("Reconciliation triggered for ParameterStore '{namespace}/{name}'");
    println!("  Annotation: {RECONCILE_REQUEST_ANNOTATION}={timestamp}");

    Ok(())
}
