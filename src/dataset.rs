//! JSON datasets: entity graphs, knowledge bases and frequency tables.
//!
//! ```json
//! { "entities": [{ "name": "Obama", "type": "PERSON" }],
//!   "facts": [{ "source": { "name": "Obama", "type": "PERSON" },
//!               "relation": "per:origin",
//!               "target": { "name": "Hawaii", "type": "LOCATION" },
//!               "confidence": 0.8 }] }
//! ```
//!
//! A knowledge base lists `{ subject, relation, target }` facts, where the
//! target is a bare name, plus `compatible` relation pairs. A frequency table
//! is a list of `{ names, count }` rows.

use std::path::Path;

use miette::Diagnostic;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{CompatibilityTable, EntityGraph, Fact, KnowledgeBase};
use crate::pattern::{FrequencyError, StaticFrequency};
use crate::symbol::{Entity, Relation};

/// Errors from reading or interpreting dataset files.
#[derive(Debug, Error, Diagnostic)]
pub enum DatasetError {
    #[error("failed to read dataset: {path}")]
    #[diagnostic(
        code(pathmine::dataset::read),
        help("Ensure the file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dataset {path}: {message}")]
    #[diagnostic(
        code(pathmine::dataset::parse),
        help(
            "Check the JSON structure. Entities are objects with a `name` and an \
             upper-case `type` such as PERSON or LOCATION."
        )
    )]
    Parse { path: String, message: String },

    #[error("failed to write dataset: {path}")]
    #[diagnostic(
        code(pathmine::dataset::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fact {fact} has confidence {confidence}, outside [0, 1]")]
    #[diagnostic(
        code(pathmine::dataset::confidence),
        help("Confidence scores must lie between 0.0 and 1.0; omit the field for certain facts.")
    )]
    InvalidConfidence { fact: String, confidence: f32 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Frequency(#[from] FrequencyError),
}

pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

/// Serialized form of an [`EntityGraph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Vertices, including isolated ones.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Facts; endpoints missing from `entities` are added implicitly.
    #[serde(default)]
    pub facts: Vec<Fact>,
}

impl GraphDocument {
    pub fn from_graph(graph: &EntityGraph) -> Self {
        Self {
            entities: graph.entities().cloned().collect(),
            facts: graph.facts(),
        }
    }

    pub fn into_graph(self) -> DatasetResult<EntityGraph> {
        let mut graph = EntityGraph::new();
        for entity in self.entities {
            graph.add_entity(entity);
        }
        for fact in self.facts {
            if let Some(confidence) = fact.confidence.filter(|c| !(0.0..=1.0).contains(c)) {
                return Err(DatasetError::InvalidConfidence {
                    fact: fact.to_string(),
                    confidence,
                });
            }
            graph.insert_fact(fact);
        }
        Ok(graph)
    }
}

/// One knowledge-base row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownFactRow {
    pub subject: Entity,
    pub relation: Relation,
    /// Target name only; knowledge-base slot values carry no type.
    pub target: String,
}

/// Serialized knowledge base plus relation compatibility.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    #[serde(default)]
    pub facts: Vec<KnownFactRow>,
    /// Relation pairs that may hold for the same subject and slot value.
    #[serde(default)]
    pub compatible: Vec<(Relation, Relation)>,
}

impl KnowledgeDocument {
    pub fn into_parts(self) -> (KnowledgeBase, CompatibilityTable) {
        let mut kb = KnowledgeBase::new();
        for row in self.facts {
            kb.insert(row.subject, row.relation, row.target);
        }
        let mut table = CompatibilityTable::new();
        for (a, b) in self.compatible {
            table.declare_compatible(a, b);
        }
        (kb, table)
    }
}

/// One frequency-table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyRow {
    pub names: Vec<String>,
    pub count: f64,
}

/// Build a [`StaticFrequency`] from rows.
pub fn frequency_table(rows: Vec<FrequencyRow>) -> DatasetResult<StaticFrequency> {
    let mut table = StaticFrequency::new();
    for row in rows {
        table.insert(row.names, row.count)?;
    }
    Ok(table)
}

/// Read a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> DatasetResult<T> {
    let data = std::fs::read_to_string(path).map_err(|e| DatasetError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&data).map_err(|e| DatasetError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Write a value as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> DatasetResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| DatasetError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    std::fs::write(path, json).map_err(|e| DatasetError::Write {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load an entity graph.
pub fn load_graph(path: &Path) -> DatasetResult<EntityGraph> {
    let doc: GraphDocument = read_json(path)?;
    let graph = doc.into_graph()?;
    tracing::info!(
        path = %path.display(),
        vertices = graph.vertex_count(),
        facts = graph.fact_count(),
        "loaded graph"
    );
    Ok(graph)
}

/// Load a knowledge base and its compatibility table.
pub fn load_knowledge(path: &Path) -> DatasetResult<(KnowledgeBase, CompatibilityTable)> {
    let doc: KnowledgeDocument = read_json(path)?;
    let (kb, table) = doc.into_parts();
    tracing::info!(
        path = %path.display(),
        subjects = kb.entity_count(),
        facts = kb.len(),
        compatible = table.len(),
        "loaded knowledge base"
    );
    Ok((kb, table))
}

/// Load a document-frequency table.
pub fn load_frequency(path: &Path) -> DatasetResult<StaticFrequency> {
    let rows: Vec<FrequencyRow> = read_json(path)?;
    frequency_table(rows)
}
