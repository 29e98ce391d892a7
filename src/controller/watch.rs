//! # Watch Stream
//!
//! Trigger stream for the controller.
//!
//! Only spec (generation) and annotation changes start a pass. Status writes,
//! including the controller's own, are dropped here; periodic resync is
//! driven by the requeue of the previous pass.

use crate::crd::ParameterStore;
use futures::{future, Stream, TryStreamExt};
use kube::runtime::reflector::{self, Store};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, ResourceExt};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Remembers what each object looked like when it last triggered a pass
#[derive(Debug, Default)]
pub struct ChangeFilter {
    seen: HashMap<String, u64>,
}

impl ChangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `parameter_store` differs from the last version that passed
    ///
    /// First sightings and objects being deleted always pass.
    pub fn should_reconcile(&mut self, parameter_store: &ParameterStore) -> bool {
        if parameter_store.metadata.deletion_timestamp.is_some() {
            return true;
        }
        let key = object_key(parameter_store);
        let fingerprint = fingerprint(parameter_store);
        match self.seen.insert(key, fingerprint) {
            Some(previous) => previous != fingerprint,
            None => true,
        }
    }
}

/// uid when present, `namespace/name` otherwise
fn object_key(parameter_store: &ParameterStore) -> String {
    parameter_store.uid().unwrap_or_else(|| {
        format!(
            "{}/{}",
            parameter_store.namespace().unwrap_or_default(),
            parameter_store.name_any()
        )
    })
}

/// Hash of generation and annotations
fn fingerprint(parameter_store: &ParameterStore) -> u64 {
    let mut hasher = DefaultHasher::new();
    parameter_store.metadata.generation.hash(&mut hasher);
    parameter_store.annotations().hash(&mut hasher);
    hasher.finish()
}

/// Watch `ParameterStore` objects, keeping `Store` current and emitting only changed objects
pub fn changed_parameter_stores(
    api: Api<ParameterStore>,
) -> (
    Store<ParameterStore>,
    impl Stream<Item = Result<ParameterStore, watcher::Error>> + Send + 'static,
) {
    let (reader, writer) = reflector::store();
    let mut filter = ChangeFilter::new();

    let stream = watcher(api, watcher::Config::default().any_semantic())
        .default_backoff()
        .reflect(writer)
        .applied_objects()
        .try_filter(move |parameter_store| {
            let changed = filter.should_reconcile(parameter_store);
            if !changed {
                debug!(
                    "ParameterStore {}/{} unchanged apart from status, skipping",
                    parameter_store.namespace().unwrap_or_default(),
                    parameter_store.name_any()
                );
            }
            future::ready(changed)
        });

    (reader, stream)
}
