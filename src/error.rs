//! Rich diagnostic error types for the pathmine engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::dataset::DatasetError;
use crate::pattern::frequency::FrequencyError;

/// Top-level error type for the pathmine engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum MineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Trie(#[from] TrieError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Frequency(#[from] FrequencyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dataset(#[from] DatasetError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("entity not in graph: {entity}")]
    #[diagnostic(
        code(pathmine::graph::vertex_not_found),
        help(
            "Facts may only connect entities that are already graph vertices. \
             Add both endpoints with `add_entity` first, or use `insert_fact` \
             to create them implicitly."
        )
    )]
    VertexNotFound { entity: String },

    #[error("fact {fact} does not exist in the graph")]
    #[diagnostic(
        code(pathmine::graph::unknown_fact),
        help(
            "The fact index does not refer to a live edge. It was either removed \
             during consistency enforcement or belongs to a different graph."
        )
    )]
    UnknownFact { fact: usize },
}

// ---------------------------------------------------------------------------
// Trie errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TrieError {
    #[error("fact {fact} touches neither endpoint of trie entry {entity}")]
    #[diagnostic(
        code(pathmine::trie::disconnected_fact),
        help(
            "A trie node can only be extended by a fact incident to its entity. \
             This indicates a bug in the caller or in the upstream graph builder: \
             supply fully resolved facts taken from the node's adjacency lists."
        )
    )]
    DisconnectedFact { fact: String, entity: String },

    #[error("trie node {node} does not exist")]
    #[diagnostic(
        code(pathmine::trie::unknown_node),
        help("Trie node ids are only valid for the trie that produced them.")
    )]
    UnknownNode { node: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Aggregation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum AggregateError {
    #[error("worker count must be at least 1")]
    #[diagnostic(
        code(pathmine::aggregate::no_workers),
        help("Set `worker_count` to a positive number, e.g. the number of available cores.")
    )]
    NoWorkers,

    #[error("failed to start aggregation worker pool: {message}")]
    #[diagnostic(
        code(pathmine::aggregate::pool),
        help(
            "The operating system refused to spawn the worker threads. \
             Lower `worker_count` or check the process thread limits."
        )
    )]
    Pool { message: String },
}

/// Convenience alias for functions returning pathmine results.
pub type MineResult<T> = std::result::Result<T, MineError>;
