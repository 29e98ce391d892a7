//! # AWS Providers
//!
//! - `parameter_store` - AWS Systems Manager Parameter Store backend

pub mod parameter_store;
pub use parameter_store::AwsParameterStore;
