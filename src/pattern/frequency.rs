//! Document co-occurrence frequencies.
//!
//! The aggregator can scale a path's weight down by how often its entities
//! appear together in the source corpus. The count comes from an external
//! collaborator behind [`DocumentFrequency`]; [`StaticFrequency`] is an
//! in-memory table of precomputed counts.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by a frequency collaborator.
#[derive(Debug, Error, Diagnostic)]
pub enum FrequencyError {
    #[error("co-occurrence lookup failed for {names:?}: {message}")]
    #[diagnostic(
        code(pathmine::frequency::lookup),
        help(
            "The document-frequency backend could not answer. Aggregation treats \
             the factor as 1.0 for this entity set and continues."
        )
    )]
    Lookup {
        names: BTreeSet<String>,
        message: String,
    },

    #[error("invalid co-occurrence count {count} for {names:?}")]
    #[diagnostic(
        code(pathmine::frequency::invalid_count),
        help("Counts must be finite and non-negative.")
    )]
    InvalidCount {
        names: BTreeSet<String>,
        count: f64,
    },
}

/// Result type for frequency lookups.
pub type FrequencyResult<T> = std::result::Result<T, FrequencyError>;

/// Estimates how many documents mention a set of entities together.
///
/// Implementations are shared across aggregation workers, so they must be
/// `Sync`.
pub trait DocumentFrequency: Sync {
    fn estimate_cooccurrence(&self, names: &BTreeSet<String>) -> FrequencyResult<f64>;
}

/// Precomputed co-occurrence counts keyed by entity-name set.
///
/// Unknown sets have count 0.
#[derive(Debug, Clone, Default)]
pub struct StaticFrequency {
    counts: BTreeMap<BTreeSet<String>, f64>,
}

impl StaticFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the count for a name set, replacing any previous one.
    pub fn insert<I, S>(&mut self, names: I, count: f64) -> FrequencyResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if !count.is_finite() || count < 0.0 {
            return Err(FrequencyError::InvalidCount { names, count });
        }
        self.counts.insert(names, count);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl DocumentFrequency for StaticFrequency {
    fn estimate_cooccurrence(&self, names: &BTreeSet<String>) -> FrequencyResult<f64> {
        Ok(self.counts.get(names).copied().unwrap_or(0.0))
    }
}

/// Per-worker memo of document factors.
///
/// Each worker owns one; it is never shared, so lookups need no locking.
pub struct FactorCache<'a> {
    oracle: &'a dyn DocumentFrequency,
    memo: HashMap<BTreeSet<String>, f64>,
    lookups: usize,
}

impl<'a> FactorCache<'a> {
    pub fn new(oracle: &'a dyn DocumentFrequency) -> Self {
        Self {
            oracle,
            memo: HashMap::new(),
            lookups: 0,
        }
    }

    /// Document factor for a name set: `max(1, estimate)`.
    ///
    /// A failed or non-finite estimate is logged and yields 1.0; the fallback
    /// is memoized like any other answer.
    pub fn factor(&mut self, names: &BTreeSet<String>) -> f64 {
        if let Some(&factor) = self.memo.get(names) {
            return factor;
        }
        self.lookups += 1;
        let factor = match self.oracle.estimate_cooccurrence(names) {
            Ok(count) if count.is_finite() => count.max(1.0),
            Ok(count) => {
                tracing::warn!(?names, count, "non-finite co-occurrence estimate, using factor 1.0");
                1.0
            }
            Err(e) => {
                tracing::warn!(error = %e, "co-occurrence lookup failed, using factor 1.0");
                1.0
            }
        };
        self.memo.insert(names.clone(), factor);
        factor
    }

    /// Number of calls made to the collaborator.
    pub fn lookups(&self) -> usize {
        self.lookups
    }
}
