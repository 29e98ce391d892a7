//! # Azure Providers
//!
//! - `app_configuration` - Azure App Configuration backend

pub mod app_configuration;
pub use app_configuration::{AzureAppConfiguration, StaticTokenCredential};
