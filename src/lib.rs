// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # pathmine
//!
//! An inferential-path mining engine: enumerates bounded paths through a
//! directed labeled multigraph of entities, canonicalizes them into logical
//! patterns and counts how often each pattern occurs.
//!
//! ## Architecture
//!
//! - **Entity graph** (`graph`): petgraph-backed multigraph with name and identity indices
//! - **Consistency** (`graph::consistency`): contradiction removal, pruning and gap filling against a knowledge base
//! - **Path search** (`graph::traverse`, `graph::trie`): per-vertex edge-keyed tries grown breadth-first
//! - **Patterns** (`pattern`): loop/chain canonicalization and parallel weighted aggregation on rayon
//! - **Facade** (`engine`): runs the stages in order from a validated [`config::MiningConfig`]
//!
//! ## Library usage
//!
//! ```no_run
//! use pathmine::config::MiningConfig;
//! use pathmine::engine::{Collaborators, Miner};
//! use pathmine::graph::{EntityGraph, Fact};
//! use pathmine::symbol::{Entity, EntityType};
//!
//! let x = Entity::new("X", EntityType::Person);
//! let y = Entity::new("Y", EntityType::Person);
//! let z = Entity::new("Z", EntityType::Person);
//! let mut graph: EntityGraph = [
//!     Fact::new(x.clone(), "r1", y.clone()),
//!     Fact::new(y, "r2", z.clone()),
//!     Fact::new(z, "r3", x),
//! ]
//! .into_iter()
//! .collect();
//!
//! let miner = Miner::new(MiningConfig::default()).unwrap();
//! let report = miner.run(&mut graph, &Collaborators::new()).unwrap();
//! for (pattern, weight) in report.patterns.ranked() {
//!     println!("{weight:.2}  {pattern}");
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod export;
pub mod graph;
pub mod pattern;
pub mod symbol;
