//! Bounded breadth-first path enumeration.
//!
//! Grows one [`PathTrie`] per vertex from a shared FIFO worklist, trying
//! every outgoing and incoming fact of each popped node, and collects the
//! resulting path corpus once the worklist drains. With name-alias fallback
//! on, the facts of same-name vertices of other types are tried as well.

use std::collections::{HashSet, VecDeque};

use super::index::EntityGraph;
use super::VertexId;
use super::path::Path;
use super::trie::{Extension, PathTrie, Rejection, TrieNodeId, TrieResult};

/// Configuration for a path search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum edge count of an open (non-loop) path.
    pub max_depth: usize,
    /// Attach facts to trie nodes by entity name when identity fails.
    pub name_alias_fallback: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            name_alias_fallback: false,
        }
    }
}

/// Counters describing one search run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Tries built (one per vertex).
    pub tries: usize,
    /// Trie nodes created, roots excluded.
    pub nodes: usize,
    /// Terminal loop nodes.
    pub loops: usize,
    /// Deepest node created.
    pub depth_reached: usize,
    pub rejected_dangling: usize,
    pub rejected_backtrack: usize,
    pub rejected_duplicate: usize,
    pub rejected_depth: usize,
}

impl SearchStats {
    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::DanglingLoop => self.rejected_dangling += 1,
            Rejection::Backtrack => self.rejected_backtrack += 1,
            Rejection::Duplicate(_) => self.rejected_duplicate += 1,
            Rejection::DepthExceeded => self.rejected_depth += 1,
        }
    }
}

/// Every path discovered by a search, in root-vertex order.
///
/// The corpus is a multiset: an open path is usually found once from each
/// of its two ends, which is why each occurrence carries half weight during
/// aggregation.
#[derive(Debug, Clone, Default)]
pub struct PathCorpus {
    paths: Vec<Path>,
    stats: SearchStats,
}

impl PathCorpus {
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<Path> {
        self.paths
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths that return to their root.
    pub fn loops(&self) -> impl Iterator<Item = &Path> + '_ {
        self.paths.iter().filter(|p| p.is_loop())
    }

    /// Open paths.
    pub fn chains(&self) -> impl Iterator<Item = &Path> + '_ {
        self.paths.iter().filter(|p| !p.is_loop())
    }

    /// Paths with distinct fact sequences, first occurrence kept.
    pub fn distinct(&self) -> Vec<&Path> {
        let mut seen = HashSet::new();
        self.paths
            .iter()
            .filter(|p| seen.insert(p.fact_keys()))
            .collect()
    }
}

/// Breadth-first path search over a read-only graph.
pub struct BoundedPathSearch<'g> {
    graph: &'g EntityGraph,
    config: SearchConfig,
}

impl<'g> BoundedPathSearch<'g> {
    pub fn new(graph: &'g EntityGraph, config: SearchConfig) -> Self {
        Self { graph, config }
    }

    /// Build one trie per vertex and expand them to exhaustion.
    pub fn tries(&self) -> TrieResult<(Vec<PathTrie>, SearchStats)> {
        let graph = self.graph;
        let mut tries: Vec<PathTrie> = graph
            .vertex_ids()
            .into_iter()
            .map(|v| {
                PathTrie::new(v, self.config.max_depth)
                    .with_alias_fallback(self.config.name_alias_fallback)
            })
            .collect();
        let mut stats = SearchStats {
            tries: tries.len(),
            ..Default::default()
        };

        // Work queue: (trie index, node to expand)
        let mut queue: VecDeque<(usize, TrieNodeId)> =
            (0..tries.len()).map(|t| (t, TrieNodeId::ROOT)).collect();

        while let Some((t, node)) = queue.pop_front() {
            let trie = &mut tries[t];
            let entry = match trie.node(node) {
                Some(n) => n.entry(),
                None => continue,
            };

            let mut incident = graph.outgoing(entry);
            incident.extend(graph.incoming(entry));
            if self.config.name_alias_fallback {
                for alias in aliases(graph, entry) {
                    incident.extend(graph.outgoing(alias));
                    incident.extend(graph.incoming(alias));
                }
            }
            for fact in incident {
                match trie.extend(node, graph, fact)? {
                    Extension::Expand(child) => {
                        stats.nodes += 1;
                        stats.depth_reached = stats.depth_reached.max(depth_of(trie, child));
                        queue.push_back((t, child));
                    }
                    Extension::Loop(child) => {
                        stats.nodes += 1;
                        stats.loops += 1;
                        stats.depth_reached = stats.depth_reached.max(depth_of(trie, child));
                    }
                    Extension::Rejected(rejection) => stats.record(rejection),
                }
            }
        }

        Ok((tries, stats))
    }

    /// Run the search and collect every trie's paths.
    pub fn run(&self) -> TrieResult<PathCorpus> {
        let (tries, stats) = self.tries()?;
        let paths: Vec<Path> = tries
            .iter()
            .flat_map(|trie| trie.all_paths(self.graph))
            .collect();

        tracing::debug!(
            tries = stats.tries,
            nodes = stats.nodes,
            loops = stats.loops,
            depth = stats.depth_reached,
            dangling = stats.rejected_dangling,
            backtrack = stats.rejected_backtrack,
            duplicate = stats.rejected_duplicate,
            too_deep = stats.rejected_depth,
            "path search complete"
        );

        Ok(PathCorpus { paths, stats })
    }
}

/// Other vertices sharing the name of `vertex`, regardless of type.
fn aliases(graph: &EntityGraph, vertex: VertexId) -> Vec<VertexId> {
    let Some(entity) = graph.entity(vertex) else {
        return vec![];
    };
    graph
        .vertices_named(&entity.name)
        .iter()
        .copied()
        .filter(|&v| v != vertex)
        .collect()
}

fn depth_of(trie: &PathTrie, node: TrieNodeId) -> usize {
    trie.node(node).map_or(0, |n| n.depth())
}

/// Enumerate all bounded paths of a graph with default settings and the
/// given depth limit.
pub fn enumerate_paths(graph: &EntityGraph, max_depth: usize) -> TrieResult<PathCorpus> {
    BoundedPathSearch::new(
        graph,
        SearchConfig {
            max_depth,
            ..Default::default()
        },
    )
    .run()
}
