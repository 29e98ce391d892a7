//! # Common Provider Utilities
//!
//! Key normalization and helpers shared by the backend implementations.

use crate::observability::metrics;
use crate::provider::{ResolvedValue, TransportError};
use std::collections::HashSet;
use std::time::Instant;

/// Map a raw hierarchical store key to an output field name
///
/// Takes the last `/`-separated segment, upper-cases it and replaces `-` with `_`.
/// Idempotent: a normalized name contains no `/` and no `-`.
pub fn normalize_key(raw: &str) -> String {
    let last = raw.rsplit('/').next().unwrap_or(raw);
    last.to_uppercase().replace('-', "_")
}

/// Collects prefix results, keeping the first value seen for each normalized name
#[derive(Debug, Default)]
pub struct FirstWins {
    seen: HashSet<String>,
    values: Vec<ResolvedValue>,
}

impl FirstWins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw key/value pair; returns false when the normalized name was already taken
    pub fn push(&mut self, raw_key: &str, value: impl Into<String>) -> bool {
        let output_name = normalize_key(raw_key);
        if !self.seen.insert(output_name.clone()) {
            return false;
        }
        self.values.push(ResolvedValue {
            output_name,
            value: value.into(),
        });
        true
    }

    pub fn into_values(self) -> Vec<ResolvedValue> {
        self.values
    }
}

/// Record metrics for a finished backend call
pub fn record_backend_metrics<T>(
    backend: &str,
    operation: &str,
    start_time: Instant,
    result: &Result<T, TransportError>,
) {
    metrics::record_backend_operation(backend, operation, start_time.elapsed().as_secs_f64());
    if result.is_err() {
        metrics::increment_backend_operation_errors(backend);
    }
}
