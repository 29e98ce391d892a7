//! # Secret Synthesis
//!
//! Builds the output Secret from fully resolved references. No I/O.

use crate::constants::{MANAGED_BY, UPDATED_ANNOTATION};
use crate::controller::reconciler::resolve::Resolved;
use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use std::collections::BTreeMap;

/// Desired state of the synthesized Secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub name: String,
    pub namespace: String,
    pub data: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl OutputRecord {
    /// Merge resolved values: list values first, single-reference values overlay them
    pub fn synthesize(name: &str, namespace: &str, resolved: Resolved, now: DateTime<Utc>) -> Self {
        let mut data = resolved.list.unwrap_or_default();
        data.extend(resolved.single.unwrap_or_default());

        let labels = BTreeMap::from([
            ("app".to_string(), name.to_string()),
            (
                "app.kubernetes.io/managed-by".to_string(),
                MANAGED_BY.to_string(),
            ),
        ]);
        let annotations = BTreeMap::from([(
            UPDATED_ANNOTATION.to_string(),
            now.to_rfc3339_opts(SecondsFormat::Secs, true),
        )]);

        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            data,
            labels,
            annotations,
        }
    }

    /// Kubernetes Secret carrying the values as `stringData`
    pub fn into_secret(self, owner: Option<OwnerReference>) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(self.namespace),
                labels: Some(self.labels),
                annotations: Some(self.annotations),
                owner_references: owner.map(|o| vec![o]),
                ..Default::default()
            },
            string_data: Some(self.data),
            type_: Some("Opaque".to_string()),
            ..Default::default()
        }
    }
}
