//! Entity graph: the directed labeled multigraph the miner walks.
//!
//! - **Storage** ([`EntityGraph`]): uses a `petgraph` stable graph so facts can be
//!   removed during consistency enforcement without invalidating other indices
//! - **Reconciliation** ([`consistency`]): cleans a raw graph against a [`KnowledgeBase`]
//! - **Search** ([`traverse`], [`trie`]): bounded breadth-first path enumeration
//!
//! Everything shares the [`Fact`] data model.

pub mod consistency;
pub mod index;
pub mod knowledge;
pub mod path;
pub mod traverse;
pub mod trie;

use serde::{Deserialize, Serialize};

use crate::symbol::{Entity, Relation};

pub use consistency::{EnforcementReport, GraphConsistencyEnforcer};
pub use index::{EntityGraph, FactCursor, GraphResult};
pub use knowledge::{CompatibilityTable, Cooccurrence, KnowledgeBase, KnownFact};
pub use path::{Path, PathStep};
pub use traverse::{BoundedPathSearch, PathCorpus, SearchConfig, SearchStats};
pub use trie::PathTrie;

/// Handle of a vertex inside an [`EntityGraph`].
pub type VertexId = petgraph::stable_graph::NodeIndex;

/// Handle of a fact (edge) inside an [`EntityGraph`].
pub type FactId = petgraph::stable_graph::EdgeIndex;

/// Orientation in which a walk traverses a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From the fact's source to its target.
    Forward,
    /// From the fact's target back to its source.
    Backward,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// A directed, labeled, optionally scored relation between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// The entity the relation starts from.
    pub source: Entity,
    /// The relation label.
    pub relation: Relation,
    /// The entity the relation points to.
    pub target: Entity,
    /// Confidence score in [0.0, 1.0]; absent means certain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Fact {
    /// Create an unscored fact.
    pub fn new(source: Entity, relation: impl Into<Relation>, target: Entity) -> Self {
        Self {
            source,
            relation: relation.into(),
            target,
            confidence: None,
        }
    }

    /// Set the confidence score, clamped to [0.0, 1.0]. NaN scores 0.0.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence };
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Effective confidence: the stored score, or 1.0 when absent.
    pub fn score(&self) -> f32 {
        self.confidence.unwrap_or(1.0)
    }

    /// Identity of the fact, ignoring its score.
    pub fn key(&self) -> FactKey {
        FactKey {
            source: self.source.clone(),
            relation: self.relation.clone(),
            target: self.target.clone(),
        }
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} --{}--> {}", self.source, self.relation, self.target)
    }
}

/// Score-free identity of a fact: `(source, relation, target)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactKey {
    pub source: Entity,
    pub relation: Relation,
    pub target: Entity,
}

/// Edge data stored on petgraph edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    /// The relation label of this edge.
    pub relation: Relation,
    /// Optional confidence in [0.0, 1.0].
    pub confidence: Option<f32>,
}

impl From<&Fact> for EdgeData {
    fn from(f: &Fact) -> Self {
        Self {
            relation: f.relation.clone(),
            confidence: f.confidence,
        }
    }
}
