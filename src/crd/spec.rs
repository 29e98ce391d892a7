//! # ParameterStore Spec
//!
//! Main CRD specification types and default values.

use serde::{Deserialize, Serialize};

/// ParameterStore Custom Resource Definition
///
/// Describes which external parameters are synchronized into a Secret of the
/// same name and namespace.
///
/// # Example
///
/// ```yaml
/// apiVersion: ssm.aws/v1alpha1
/// kind: ParameterStore
/// metadata:
///   name: my-app
///   namespace: default
/// spec:
///   valueFrom:
///     parameterStoreRef:
///       path: /my-app/prod
///       recursive: true
///     parametersStoreRef:
///       - key: /shared/database-url
///       - name: API_TOKEN
///         key: /third-party/token
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "ParameterStore",
    group = "ssm.aws",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::ParameterStoreStatus",
    shortname = "pstore",
    printcolumn = r#"{"name":"Secret", "type":"string", "jsonPath":".status.secret.name"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ParameterStoreSpec {
    /// Where the Secret's values come from
    pub value_from: ValueFrom,
}

/// Reference kinds; either or both may be set
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValueFrom {
    /// Single parameter by name, or every parameter under a path
    #[serde(default)]
    pub parameter_store_ref: Option<ParameterStoreRef>,
    /// Explicit ordered list of parameters
    /// Every entry must resolve or the whole list is rejected for this pass
    #[serde(default)]
    pub parameters_store_ref: Option<Vec<ParametersStoreRef>>,
}

/// Single-reference (by exact name or by path prefix)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParameterStoreRef {
    /// Exact parameter name; the store's name is used verbatim as the output key
    #[serde(default)]
    pub name: Option<String>,
    /// Path prefix; output keys are the normalized last path segment
    #[serde(default)]
    pub path: Option<String>,
    /// Descend into nested paths (only meaningful with `path`)
    /// Default: true
    #[serde(default = "default_true")]
    pub recursive: bool,
}

impl ParameterStoreRef {
    /// Reference by exact name
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            path: None,
            recursive: true,
        }
    }

    /// Reference by path prefix
    pub fn by_path(path: impl Into<String>, recursive: bool) -> Self {
        Self {
            name: None,
            path: Some(path.into()),
            recursive,
        }
    }

    /// `name` if set and non-empty
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// `path` if set and non-empty
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }
}

/// One entry of the list reference
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParametersStoreRef {
    /// Output key; derived from `key` when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Parameter name in the backing store
    pub key: String,
}

impl ParametersStoreRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            name: None,
            key: key.into(),
        }
    }

    pub fn named(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            key: key.into(),
        }
    }

    /// Explicit output name, treating the empty string as unset
    pub fn output_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// Default value for boolean true
pub fn default_true() -> bool {
    true
}
