//! Export types for serializing mining results.
//!
//! These types provide flat, human-readable representations of patterns
//! and paths suitable for JSON export.

use serde::{Deserialize, Serialize};

use crate::graph::{Direction, Path, PathCorpus};
use crate::pattern::PatternWeights;

/// Exported pattern with its aggregate weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternExport {
    /// "entailment" or "conjunction".
    pub kind: String,
    /// Rendered pattern, e.g. `r1(?0, ?1) & r2(?1, ?2) => r3(?2, ?0)`.
    pub pattern: String,
    /// Number of literals.
    pub length: usize,
    /// Aggregate weight.
    pub weight: f64,
}

/// One fact along an exported path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExport {
    pub source: String,
    pub relation: String,
    pub target: String,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Exported path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathExport {
    /// Root entity, rendered as `name/TYPE`.
    pub root: String,
    /// Whether the path closes back on its root.
    #[serde(rename = "loop")]
    pub is_loop: bool,
    pub facts: Vec<StepExport>,
}

impl From<&Path> for PathExport {
    fn from(path: &Path) -> Self {
        Self {
            root: path.start().to_string(),
            is_loop: path.is_loop(),
            facts: path
                .steps()
                .iter()
                .map(|step| StepExport {
                    source: step.fact.source.to_string(),
                    relation: step.fact.relation.to_string(),
                    target: step.fact.target.to_string(),
                    direction: step.direction,
                    confidence: step.fact.confidence,
                })
                .collect(),
        }
    }
}

/// Ranked pattern rows, heaviest first. `top` limits the row count.
pub fn export_patterns(weights: &PatternWeights, top: Option<usize>) -> Vec<PatternExport> {
    weights
        .ranked()
        .into_iter()
        .take(top.unwrap_or(usize::MAX))
        .map(|(key, weight)| PatternExport {
            kind: key.kind().to_string(),
            pattern: key.to_string(),
            length: key.len(),
            weight,
        })
        .collect()
}

/// Path rows in corpus order. With `distinct`, repeated fact sequences are
/// exported once.
pub fn export_paths(corpus: &PathCorpus, distinct: bool) -> Vec<PathExport> {
    if distinct {
        corpus.distinct().into_iter().map(PathExport::from).collect()
    } else {
        corpus.paths().iter().map(PathExport::from).collect()
    }
}
