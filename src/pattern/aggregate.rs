//! Parallel weighted counting of canonical patterns.
//!
//! The corpus is dealt round-robin into one partition per worker. Each
//! worker runs as a task on a dedicated rayon pool, owns its partition and a
//! private [`WorkerCounter`], and never touches shared state. After the pool
//! joins, the counters are merged sequentially. Addition is the only merge
//! operation, so the result does not depend on the worker count beyond
//! floating-point rounding.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::error::AggregateError;
use crate::graph::Path;

use super::canonical::{CanonicalKey, canonicalize};
use super::frequency::{DocumentFrequency, FactorCache};

/// Result type for aggregation.
pub type AggregateResult<T> = std::result::Result<T, AggregateError>;

/// Weight of one path occurrence before document scaling. Open paths are
/// found once from each end, so two occurrences add up to one.
pub const DEFAULT_BASE_WEIGHT: f64 = 0.5;

/// Aggregated weight per canonical pattern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternWeights {
    weights: BTreeMap<CanonicalKey, f64>,
}

impl PatternWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to a pattern.
    pub fn add(&mut self, key: CanonicalKey, weight: f64) {
        *self.weights.entry(key).or_insert(0.0) += weight;
    }

    /// Fold another set of weights into this one.
    pub fn merge(&mut self, other: PatternWeights) {
        for (key, weight) in other.weights {
            self.add(key, weight);
        }
    }

    pub fn get(&self, key: &CanonicalKey) -> Option<f64> {
        self.weights.get(key).copied()
    }

    /// Number of distinct patterns.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of all pattern weights.
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Patterns in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalKey, f64)> + '_ {
        self.weights.iter().map(|(k, &w)| (k, w))
    }

    /// Patterns by descending weight, ties broken by key.
    pub fn ranked(&self) -> Vec<(&CanonicalKey, f64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn into_map(self) -> BTreeMap<CanonicalKey, f64> {
        self.weights
    }
}

/// Per-worker accumulator.
#[derive(Debug, Default)]
pub struct WorkerCounter {
    pub worker: usize,
    pub paths: usize,
    pub weights: PatternWeights,
}

/// Fork-join aggregator over a fixed number of workers.
pub struct WeightedAggregator<'a> {
    worker_count: usize,
    base_weight: f64,
    frequency: Option<&'a dyn DocumentFrequency>,
}

impl<'a> WeightedAggregator<'a> {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            base_weight: DEFAULT_BASE_WEIGHT,
            frequency: None,
        }
    }

    pub fn with_base_weight(mut self, base_weight: f64) -> Self {
        self.base_weight = base_weight;
        self
    }

    /// Divide each weight by the document co-occurrence factor of the
    /// path's entity names.
    pub fn with_document_factor(mut self, oracle: &'a dyn DocumentFrequency) -> Self {
        self.frequency = Some(oracle);
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Canonicalize and weigh every path, summing per pattern.
    pub fn aggregate(&self, paths: &[Path]) -> AggregateResult<PatternWeights> {
        if self.worker_count == 0 {
            return Err(AggregateError::NoWorkers);
        }
        if paths.is_empty() {
            return Ok(PatternWeights::new());
        }

        let partitions = partition_round_robin(paths, self.worker_count);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count)
            .thread_name(|i| format!("pathmine-agg-{i}"))
            .build()
            .map_err(|e| AggregateError::Pool {
                message: e.to_string(),
            })?;

        let counters: Vec<WorkerCounter> = pool.install(|| {
            partitions
                .into_par_iter()
                .enumerate()
                .map(|(worker, partition)| self.count_partition(worker, &partition))
                .collect()
        });

        let mut merged = PatternWeights::new();
        for counter in counters {
            tracing::debug!(
                worker = counter.worker,
                paths = counter.paths,
                patterns = counter.weights.len(),
                "worker finished"
            );
            merged.merge(counter.weights);
        }

        tracing::debug!(
            paths = paths.len(),
            workers = self.worker_count,
            patterns = merged.len(),
            "aggregation complete"
        );
        Ok(merged)
    }

    /// Count one partition. Runs on a worker thread.
    pub fn count_partition(&self, worker: usize, partition: &[&Path]) -> WorkerCounter {
        let mut cache = self.frequency.map(FactorCache::new);
        let mut counter = WorkerCounter {
            worker,
            ..Default::default()
        };

        for path in partition {
            let factor = match cache.as_mut() {
                Some(cache) => cache.factor(&path.entity_names()),
                None => 1.0,
            };
            counter.weights.add(canonicalize(path), self.base_weight / factor);
            counter.paths += 1;
        }

        counter
    }
}

/// Deal `paths` into `workers` partitions: path `i` goes to partition
/// `i % workers`.
pub fn partition_round_robin(paths: &[Path], workers: usize) -> Vec<Vec<&Path>> {
    let workers = workers.max(1);
    let mut partitions: Vec<Vec<&Path>> = (0..workers)
        .map(|_| Vec::with_capacity(paths.len() / workers + 1))
        .collect();
    for (i, path) in paths.iter().enumerate() {
        partitions[i % workers].push(path);
    }
    partitions
}
