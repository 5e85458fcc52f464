//! Path tries: prefix trees keyed by graph edges.
//!
//! Each [`PathTrie`] is rooted at one vertex. A node stands for the walk from
//! the root to that node; its children are the one-edge extensions of that
//! walk, keyed by `(relation, direction, next vertex)`. Nodes live in an
//! arena and point at their parent by index, so upward walks (depth, loop
//! and backtrack checks, path materialization) are O(depth) without any
//! shared ownership.
//!
//! ## Extension rules
//!
//! Extending a node with a fact incident to its entity:
//!
//! 1. rejects a **dangling loop** (next vertex already on the path, root excluded)
//! 2. rejects a **backtrack** (next vertex is the parent, over the same relation)
//! 3. rejects a **duplicate** child key
//! 4. accepts a **loop** when the next vertex is the root; loops are leaves
//! 5. accepts an **expansion** while the depth stays within `max_depth`

use std::collections::BTreeMap;

use crate::error::{GraphError, TrieError};
use crate::symbol::Relation;

use super::index::EntityGraph;
use super::path::{Path, PathStep};
use super::{Direction, Fact, FactId, VertexId};

/// Result type for trie operations.
pub type TrieResult<T> = std::result::Result<T, TrieError>;

/// Index of a node inside a [`PathTrie`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrieNodeId(usize);

impl TrieNodeId {
    /// The root of every trie.
    pub const ROOT: TrieNodeId = TrieNodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// The edge leading into a non-root node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub relation: Relation,
    pub direction: Direction,
    /// The graph fact this step was first created from.
    pub fact: FactId,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ChildKey {
    relation: Relation,
    direction: Direction,
    target: VertexId,
}

/// A path prefix ending at `entry`.
#[derive(Debug, Clone)]
pub struct TrieNode {
    entry: VertexId,
    step: Option<Step>,
    parent: Option<TrieNodeId>,
    children: BTreeMap<ChildKey, TrieNodeId>,
    depth: usize,
    closes_loop: bool,
}

impl TrieNode {
    /// Vertex the prefix ends at.
    pub fn entry(&self) -> VertexId {
        self.entry
    }

    /// Edge from the parent (absent at the root).
    pub fn step(&self) -> Option<&Step> {
        self.step.as_ref()
    }

    pub fn parent(&self) -> Option<TrieNodeId> {
        self.parent
    }

    /// Edge count from the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this node returns to the root (a terminal loop).
    pub fn closes_loop(&self) -> bool {
        self.closes_loop
    }

    /// Child node ids, in key order.
    pub fn children(&self) -> impl Iterator<Item = TrieNodeId> + '_ {
        self.children.values().copied()
    }
}

/// Why an extension produced no new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The next vertex is already on the path (other than the root).
    DanglingLoop,
    /// The step walks straight back to the parent over the same relation.
    Backtrack,
    /// An identical child already exists.
    Duplicate(TrieNodeId),
    /// The path would exceed the depth limit without closing a loop.
    DepthExceeded,
}

/// Outcome of [`PathTrie::extend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// New child that may be extended further.
    Expand(TrieNodeId),
    /// New child closing a loop back to the root; never extended.
    Loop(TrieNodeId),
    /// No new node.
    Rejected(Rejection),
}

impl Extension {
    /// The newly created node, if any.
    pub fn node(self) -> Option<TrieNodeId> {
        match self {
            Extension::Expand(id) | Extension::Loop(id) => Some(id),
            Extension::Rejected(_) => None,
        }
    }
}

/// Prefix tree of the walks starting at one root vertex.
#[derive(Debug, Clone)]
pub struct PathTrie {
    nodes: Vec<TrieNode>,
    max_depth: usize,
    alias_fallback: bool,
}

impl PathTrie {
    /// Create a trie holding only the root.
    pub fn new(root: VertexId, max_depth: usize) -> Self {
        Self {
            nodes: vec![TrieNode {
                entry: root,
                step: None,
                parent: None,
                children: BTreeMap::new(),
                depth: 0,
                closes_loop: false,
            }],
            max_depth,
            alias_fallback: false,
        }
    }

    /// Allow a fact to attach by entity name when neither endpoint is the
    /// node's exact entity.
    ///
    /// Two distinct entities that share a name (e.g. a person and a city
    /// called "Jordan") get conflated, so every alias match is logged.
    pub fn with_alias_fallback(mut self, enabled: bool) -> Self {
        self.alias_fallback = enabled;
        self
    }

    pub fn root_entry(&self) -> VertexId {
        self.nodes[0].entry
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn node(&self, id: TrieNodeId) -> Option<&TrieNode> {
        self.nodes.get(id.0)
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of terminal loop nodes.
    pub fn loop_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.closes_loop).count()
    }

    /// Try to extend the walk ending at `at` by one fact.
    ///
    /// Fails only on caller errors: an unknown node, a fact missing from
    /// the graph, or a fact not incident to the node's entity.
    pub fn extend(
        &mut self,
        at: TrieNodeId,
        graph: &EntityGraph,
        fact: FactId,
    ) -> TrieResult<Extension> {
        let (entry, parent, depth) = {
            let node = self
                .nodes
                .get(at.0)
                .ok_or(TrieError::UnknownNode { node: at.0 })?;
            (node.entry, node.parent, node.depth)
        };
        let (source, target) = graph
            .endpoints(fact)
            .ok_or(GraphError::UnknownFact { fact: fact.index() })?;
        let relation = graph
            .relation(fact)
            .ok_or(GraphError::UnknownFact { fact: fact.index() })?
            .clone();

        let (direction, next) = self.orient(graph, entry, fact, source, target)?;

        if self.on_path_below_root(at, next) {
            return Ok(Extension::Rejected(Rejection::DanglingLoop));
        }

        if let Some(parent) = parent {
            let parent_entry = self.nodes[parent.0].entry;
            let came_over = self.nodes[at.0].step.as_ref().map(|s| &s.relation);
            if parent_entry == next && came_over == Some(&relation) {
                return Ok(Extension::Rejected(Rejection::Backtrack));
            }
        }

        let key = ChildKey {
            relation: relation.clone(),
            direction,
            target: next,
        };
        if let Some(&existing) = self.nodes[at.0].children.get(&key) {
            return Ok(Extension::Rejected(Rejection::Duplicate(existing)));
        }

        let closes_loop = next == self.root_entry();
        if !closes_loop && depth + 1 > self.max_depth {
            return Ok(Extension::Rejected(Rejection::DepthExceeded));
        }

        let id = TrieNodeId(self.nodes.len());
        self.nodes.push(TrieNode {
            entry: next,
            step: Some(Step {
                relation,
                direction,
                fact,
            }),
            parent: Some(at),
            children: BTreeMap::new(),
            depth: depth + 1,
            closes_loop,
        });
        self.nodes[at.0].children.insert(key, id);

        Ok(if closes_loop {
            Extension::Loop(id)
        } else {
            Extension::Expand(id)
        })
    }

    /// Decide which way `fact` is walked from `entry`.
    fn orient(
        &self,
        graph: &EntityGraph,
        entry: VertexId,
        fact: FactId,
        source: VertexId,
        target: VertexId,
    ) -> TrieResult<(Direction, VertexId)> {
        if entry == source {
            return Ok((Direction::Forward, target));
        }
        if entry == target {
            return Ok((Direction::Backward, source));
        }

        let here = graph.entity(entry);
        if let (true, Some(here)) = (self.alias_fallback, here) {
            let named = |v: VertexId| graph.entity(v).is_some_and(|e| e.same_name(here));
            let oriented = if named(source) {
                Some((Direction::Forward, target))
            } else if named(target) {
                Some((Direction::Backward, source))
            } else {
                None
            };
            if let Some(oriented) = oriented {
                tracing::warn!(
                    entity = %here,
                    fact = fact.index(),
                    "fact attached to trie node by name only; same-name entities may be conflated"
                );
                return Ok(oriented);
            }
        }

        Err(TrieError::DisconnectedFact {
            fact: graph
                .fact(fact)
                .map(|f| f.to_string())
                .unwrap_or_else(|| format!("#{}", fact.index())),
            entity: here
                .map(|e| e.to_string())
                .unwrap_or_else(|| format!("#{}", entry.index())),
        })
    }

    /// Whether `vertex` is the entry of `at` or of any ancestor, root excluded.
    fn on_path_below_root(&self, at: TrieNodeId, vertex: VertexId) -> bool {
        let mut cursor = Some(at);
        while let Some(id) = cursor {
            let node = &self.nodes[id.0];
            if node.parent.is_none() {
                return false;
            }
            if node.entry == vertex {
                return true;
            }
            cursor = node.parent;
        }
        false
    }

    /// Materialize the walk from the root to `node`.
    ///
    /// Each fact's source and target are re-derived from the recorded step
    /// direction; the confidence is read back from the graph. Returns `None`
    /// for the root or an unknown node.
    pub fn path(&self, graph: &EntityGraph, node: TrieNodeId) -> Option<Path> {
        let mut steps = Vec::new();
        let mut cursor = self.nodes.get(node.0)?;
        while let (Some(step), Some(parent)) = (&cursor.step, cursor.parent) {
            let parent_node = &self.nodes[parent.0];
            let here = graph.entity(cursor.entry)?.clone();
            let there = graph.entity(parent_node.entry)?.clone();
            let (source, target) = match step.direction {
                Direction::Forward => (there, here),
                Direction::Backward => (here, there),
            };
            let fact = Fact {
                source,
                relation: step.relation.clone(),
                target,
                confidence: graph.edge(step.fact).and_then(|e| e.confidence),
            };
            steps.push(PathStep::new(fact, step.direction));
            cursor = parent_node;
        }
        steps.reverse();
        Path::new(steps)
    }

    /// Every non-root node's path, in depth-first order.
    pub fn all_paths(&self, graph: &EntityGraph) -> Vec<Path> {
        let mut out = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        self.collect_paths(graph, TrieNodeId::ROOT, &mut out);
        out
    }

    fn collect_paths(&self, graph: &EntityGraph, node: TrieNodeId, out: &mut Vec<Path>) {
        for child in self.nodes[node.0].children() {
            if let Some(path) = self.path(graph, child) {
                out.push(path);
            }
            self.collect_paths(graph, child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Entity, EntityType};

    fn e(name: &str) -> Entity {
        Entity::new(name, EntityType::Person)
    }

    fn triangle() -> EntityGraph {
        [
            Fact::new(e("X"), "r1", e("Y")),
            Fact::new(e("Y"), "r2", e("Z")),
            Fact::new(e("Z"), "r3", e("X")),
        ]
        .into_iter()
        .collect()
    }

    fn vid(g: &EntityGraph, name: &str) -> VertexId {
        g.vertex(&e(name)).unwrap()
    }

    #[test]
    fn forward_and_backward_extension() {
        let g = triangle();
        let x = vid(&g, "X");
        let mut trie = PathTrie::new(x, 3);

        let out = g.outgoing(x)[0];
        let inc = g.incoming(x)[0];

        let fwd = trie.extend(TrieNodeId::ROOT, &g, out).unwrap();
        let bwd = trie.extend(TrieNodeId::ROOT, &g, inc).unwrap();

        let fwd_node = trie.node(fwd.node().unwrap()).unwrap();
        assert_eq!(fwd_node.entry(), vid(&g, "Y"));
        assert_eq!(fwd_node.step().unwrap().direction, Direction::Forward);

        let bwd_node = trie.node(bwd.node().unwrap()).unwrap();
        assert_eq!(bwd_node.entry(), vid(&g, "Z"));
        assert_eq!(bwd_node.step().unwrap().direction, Direction::Backward);
    }

    #[test]
    fn disconnected_fact_is_an_error() {
        let mut g = triangle();
        let far = g.insert_fact(Fact::new(e("A"), "r9", e("B")));
        let mut trie = PathTrie::new(vid(&g, "X"), 3);
        let err = trie.extend(TrieNodeId::ROOT, &g, far).unwrap_err();
        assert!(matches!(err, TrieError::DisconnectedFact { .. }));
    }

    #[test]
    fn unknown_node_is_an_error() {
        let g = triangle();
        let x = vid(&g, "X");
        let mut trie = PathTrie::new(x, 3);
        let err = trie
            .extend(TrieNodeId(42), &g, g.outgoing(x)[0])
            .unwrap_err();
        assert!(matches!(err, TrieError::UnknownNode { node: 42 }));
    }

    #[test]
    fn extension_is_idempotent() {
        let g = triangle();
        let x = vid(&g, "X");
        let mut trie = PathTrie::new(x, 3);
        let fact = g.outgoing(x)[0];

        let first = trie.extend(TrieNodeId::ROOT, &g, fact).unwrap();
        let second = trie.extend(TrieNodeId::ROOT, &g, fact).unwrap();

        let child = first.node().unwrap();
        assert_eq!(second, Extension::Rejected(Rejection::Duplicate(child)));
        assert_eq!(trie.node(TrieNodeId::ROOT).unwrap().children().count(), 1);
        assert_eq!(trie.node_count(), 2);
    }

    #[test]
    fn backtrack_over_same_relation_is_rejected() {
        let g: EntityGraph = [Fact::new(e("X"), "r1", e("Y"))].into_iter().collect();
        let x = vid(&g, "X");
        let fact = g.outgoing(x)[0];
        let mut trie = PathTrie::new(x, 3);

        let y = trie.extend(TrieNodeId::ROOT, &g, fact).unwrap().node().unwrap();
        let back = trie.extend(y, &g, fact).unwrap();
        assert_eq!(back, Extension::Rejected(Rejection::Backtrack));
    }

    #[test]
    fn returning_over_other_relation_closes_loop() {
        let g: EntityGraph = [
            Fact::new(e("X"), "r1", e("Y")),
            Fact::new(e("Y"), "r2", e("X")),
        ]
        .into_iter()
        .collect();
        let x = vid(&g, "X");
        let y_v = vid(&g, "Y");
        let mut trie = PathTrie::new(x, 3);

        let y = trie
            .extend(TrieNodeId::ROOT, &g, g.outgoing(x)[0])
            .unwrap()
            .node()
            .unwrap();
        let back = trie.extend(y, &g, g.outgoing(y_v)[0]).unwrap();
        assert!(matches!(back, Extension::Loop(_)));
        assert_eq!(trie.loop_count(), 1);
    }

    #[test]
    fn dangling_loop_is_rejected() {
        // X -> Y -> Z -> Y: returning to Y (not the root) must be refused.
        let g: EntityGraph = [
            Fact::new(e("X"), "a", e("Y")),
            Fact::new(e("Y"), "b", e("Z")),
            Fact::new(e("Z"), "c", e("Y")),
        ]
        .into_iter()
        .collect();
        let x = vid(&g, "X");
        let y_v = vid(&g, "Y");
        let z_v = vid(&g, "Z");
        let mut trie = PathTrie::new(x, 5);

        let y = trie
            .extend(TrieNodeId::ROOT, &g, g.outgoing(x)[0])
            .unwrap()
            .node()
            .unwrap();
        let z = trie
            .extend(y, &g, g.outgoing(y_v)[0])
            .unwrap()
            .node()
            .unwrap();
        let back = trie.extend(z, &g, g.outgoing(z_v)[0]).unwrap();
        assert_eq!(back, Extension::Rejected(Rejection::DanglingLoop));
    }

    #[test]
    fn self_loop_below_root_is_dangling() {
        let g: EntityGraph = [
            Fact::new(e("X"), "a", e("Y")),
            Fact::new(e("Y"), "likes", e("Y")),
        ]
        .into_iter()
        .collect();
        let x = vid(&g, "X");
        let y_v = vid(&g, "Y");
        let mut trie = PathTrie::new(x, 5);
        let y = trie
            .extend(TrieNodeId::ROOT, &g, g.outgoing(x)[0])
            .unwrap()
            .node()
            .unwrap();
        let self_loop = g.outgoing(y_v)[0];
        assert_eq!(
            trie.extend(y, &g, self_loop).unwrap(),
            Extension::Rejected(Rejection::DanglingLoop)
        );
    }

    #[test]
    fn self_loop_at_root_is_a_loop() {
        let g: EntityGraph = [Fact::new(e("X"), "likes", e("X"))].into_iter().collect();
        let x = vid(&g, "X");
        let mut trie = PathTrie::new(x, 1);
        let ext = trie.extend(TrieNodeId::ROOT, &g, g.outgoing(x)[0]).unwrap();
        let node = ext.node().unwrap();
        assert!(matches!(ext, Extension::Loop(_)));
        let path = trie.path(&g, node).unwrap();
        assert!(path.is_loop());
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn depth_limit_spares_loop_closing_edges() {
        let g = triangle();
        let x = vid(&g, "X");
        let y_v = vid(&g, "Y");
        let z_v = vid(&g, "Z");
        let mut trie = PathTrie::new(x, 2);

        let y = trie
            .extend(TrieNodeId::ROOT, &g, g.outgoing(x)[0])
            .unwrap()
            .node()
            .unwrap();
        let z = trie
            .extend(y, &g, g.outgoing(y_v)[0])
            .unwrap()
            .node()
            .unwrap();
        // Z -> X closes the loop at depth 3 > max_depth 2.
        let closing = trie.extend(z, &g, g.outgoing(z_v)[0]).unwrap();
        assert!(matches!(closing, Extension::Loop(_)));
        assert_eq!(trie.node(closing.node().unwrap()).unwrap().depth(), 3);
    }

    #[test]
    fn depth_limit_rejects_open_extensions() {
        let g: EntityGraph = [
            Fact::new(e("A"), "r", e("B")),
            Fact::new(e("B"), "s", e("C")),
        ]
        .into_iter()
        .collect();
        let a = vid(&g, "A");
        let b_v = vid(&g, "B");
        let mut trie = PathTrie::new(a, 1);
        let b = trie
            .extend(TrieNodeId::ROOT, &g, g.outgoing(a)[0])
            .unwrap()
            .node()
            .unwrap();
        assert_eq!(
            trie.extend(b, &g, g.outgoing(b_v)[0]).unwrap(),
            Extension::Rejected(Rejection::DepthExceeded)
        );
    }

    #[test]
    fn path_materializes_orientation() {
        let g = triangle();
        let x = vid(&g, "X");
        let mut trie = PathTrie::new(x, 3);
        let z = trie
            .extend(TrieNodeId::ROOT, &g, g.incoming(x)[0])
            .unwrap()
            .node()
            .unwrap();
        let path = trie.path(&g, z).unwrap();
        assert_eq!(path.start(), &e("X"));
        assert_eq!(path.end(), &e("Z"));
        let fact = path.facts().next().unwrap();
        assert_eq!(fact.source, e("Z"));
        assert_eq!(fact.target, e("X"));
        assert_eq!(fact.relation.as_str(), "r3");
        assert!(trie.path(&g, TrieNodeId::ROOT).is_none());
    }

    #[test]
    fn alias_fallback_matches_by_name() {
        let mut g = EntityGraph::new();
        let person = Entity::new("Jordan", EntityType::Person);
        let place = Entity::new("Jordan", EntityType::Location);
        let root = g.add_entity(person);
        let fact = g.insert_fact(Fact::new(place, "located_in", e("Asia")));

        let mut strict = PathTrie::new(root, 2);
        assert!(strict.extend(TrieNodeId::ROOT, &g, fact).is_err());

        let mut lenient = PathTrie::new(root, 2).with_alias_fallback(true);
        let ext = lenient.extend(TrieNodeId::ROOT, &g, fact).unwrap();
        assert!(matches!(ext, Extension::Expand(_)));
    }

    #[test]
    fn all_paths_lists_every_non_root_node() {
        let g = triangle();
        let x = vid(&g, "X");
        let mut trie = PathTrie::new(x, 3);
        let out = g.outgoing(x)[0];
        let inc = g.incoming(x)[0];
        trie.extend(TrieNodeId::ROOT, &g, out).unwrap();
        trie.extend(TrieNodeId::ROOT, &g, inc).unwrap();
        let paths = trie.all_paths(&g);
        assert_eq!(paths.len(), trie.node_count() - 1);
        assert!(paths.iter().all(|p| p.start() == &e("X")));
    }
}
