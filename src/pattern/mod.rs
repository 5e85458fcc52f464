//! Pattern mining over the path corpus.
//!
//! - [`canonical`]: abstracts a path into a [`CanonicalKey`]
//! - [`frequency`]: document co-occurrence collaborator for weight scaling
//! - [`aggregate`]: parallel weighted counting of canonical keys

pub mod aggregate;
pub mod canonical;
pub mod frequency;

pub use aggregate::{
    AggregateResult, DEFAULT_BASE_WEIGHT, PatternWeights, WeightedAggregator, WorkerCounter,
};
pub use canonical::{CanonicalKey, Literal, PathCanonicalizer, Var, canonicalize};
pub use frequency::{DocumentFrequency, FactorCache, FrequencyError, FrequencyResult, StaticFrequency};
