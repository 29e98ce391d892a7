//! # Resolution
//!
//! Resolves the references of a `ParameterStore` against a backend.
//!
//! - Single reference: by exact name (verbatim output name) or by path (normalized names)
//! - List reference: every item by name, all-or-nothing
//!
//! Both reference kinds run concurrently; list items run on a bounded pool.

use crate::controller::reconciler::error::{ParameterError, ResolveError};
use crate::crd::{ParameterStoreRef, ParametersStoreRef, ValueFrom};
use crate::provider::{normalize_key, ParameterBackend};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Output of a successful resolution, kept per reference kind until synthesis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub single: Option<BTreeMap<String, String>>,
    pub list: Option<BTreeMap<String, String>>,
}

impl Resolved {
    /// Number of values across both reference kinds
    pub fn len(&self) -> usize {
        self.single.as_ref().map_or(0, BTreeMap::len) + self.list.as_ref().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve a single reference
///
/// `name` takes precedence over `path` when both are set. A reference with
/// neither is rejected before any backend call.
pub async fn resolve_single_ref(
    backend: &dyn ParameterBackend,
    reference: &ParameterStoreRef,
) -> Result<BTreeMap<String, String>, ResolveError> {
    if let Some(name) = reference.name() {
        debug!(parameter.name = name, "Resolving parameter by name");
        let resolved = backend.resolve_by_name(name).await?;
        return Ok(BTreeMap::from([(resolved.output_name, resolved.value)]));
    }

    if let Some(path) = reference.path() {
        debug!(
            parameter.path = path,
            recursive = reference.recursive,
            "Resolving parameters by path"
        );
        let resolved = backend.resolve_by_prefix(path, reference.recursive).await?;
        // Backends already dedupe first-wins; keep the first here as well
        let mut data = BTreeMap::new();
        for value in resolved {
            data.entry(value.output_name).or_insert(value.value);
        }
        return Ok(data);
    }

    Err(ResolveError::InvalidReference)
}

/// Resolve every list item, keeping nothing unless all of them succeed
///
/// Items are looked up independently with at most `concurrency` calls in
/// flight. Failed items do not stop their siblings; once all items are done a
/// single failure discards every resolved value.
pub async fn resolve_list_refs(
    backend: &dyn ParameterBackend,
    items: &[ParametersStoreRef],
    concurrency: usize,
) -> Result<BTreeMap<String, String>, ResolveError> {
    let lookups: Vec<_> = items
        .iter()
        .map(|item| async move {
            let outcome = backend.resolve_by_name(&item.key).await;
            (item, outcome)
        })
        .collect();
    let outcomes: Vec<_> = stream::iter(lookups)
    .buffered(concurrency.max(1))
    .collect()
    .await;

    let mut data = BTreeMap::new();
    let mut errors = Vec::new();
    for (item, outcome) in outcomes {
        let output_name = item
            .output_name()
            .map_or_else(|| normalize_key(&item.key), ToString::to_string);
        match outcome {
            Ok(resolved) => {
                data.insert(output_name, resolved.value);
            }
            Err(cause) => {
                warn!(
                    parameter.key = %item.key,
                    output.name = %output_name,
                    error = %cause,
                    "Failed to resolve list parameter"
                );
                errors.push(ParameterError { output_name, cause });
            }
        }
    }

    if errors.is_empty() {
        Ok(data)
    } else {
        Err(ResolveError::Aggregate(errors))
    }
}

/// Resolve every configured reference kind concurrently
///
/// When both kinds fail, the single-reference error is reported.
pub async fn resolve_value_from(
    backend: &dyn ParameterBackend,
    value_from: &ValueFrom,
    concurrency: usize,
) -> Result<Resolved, ResolveError> {
    let single = async {
        match value_from.parameter_store_ref.as_ref() {
            Some(reference) => resolve_single_ref(backend, reference).await.map(Some),
            None => Ok(None),
        }
    };
    let list = async {
        match value_from.parameters_store_ref.as_deref() {
            Some(items) => resolve_list_refs(backend, items, concurrency).await.map(Some),
            None => Ok(None),
        }
    };

    let (single, list) = tokio::join!(single, list);
    Ok(Resolved {
        single: single?,
        list: list?,
    })
}
