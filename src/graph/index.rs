//! In-memory entity graph with identity and name indexing.
//!
//! Uses a `petgraph` stable graph for the structure (edge removal keeps the
//! remaining indices valid) plus hash indices for lookups by full entity
//! identity and by bare name.

use std::collections::HashMap;

use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;

use crate::error::GraphError;
use crate::symbol::{Entity, Relation};

use super::{EdgeData, Fact, FactId, VertexId};

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Directed labeled multigraph over entities.
///
/// Provides O(1) vertex lookups by [`Entity`] and by name, adjacency queries
/// in both directions, and fact removal through a [`FactCursor`].
pub struct EntityGraph {
    /// The directed graph: nodes are entities, edges carry EdgeData.
    graph: StableDiGraph<Entity, EdgeData>,
    /// Entity → NodeIndex mapping for O(1) vertex lookups.
    node_index: HashMap<Entity, VertexId>,
    /// Name → vertices with that name, in insertion order.
    name_index: HashMap<String, Vec<VertexId>>,
}

impl EntityGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
            name_index: HashMap::new(),
        }
    }

    /// Add a vertex for the entity, returning the existing one if present.
    pub fn add_entity(&mut self, entity: Entity) -> VertexId {
        if let Some(&idx) = self.node_index.get(&entity) {
            return idx;
        }
        let idx = self.graph.add_node(entity.clone());
        self.name_index
            .entry(entity.name.clone())
            .or_default()
            .push(idx);
        self.node_index.insert(entity, idx);
        idx
    }

    /// Add a fact between two existing vertices.
    ///
    /// Fails if either endpoint has not been added as a vertex.
    pub fn add_fact(&mut self, fact: Fact) -> GraphResult<FactId> {
        let source = self.require_vertex(&fact.source)?;
        let target = self.require_vertex(&fact.target)?;
        Ok(self.graph.add_edge(source, target, EdgeData::from(&fact)))
    }

    /// Add a fact, creating vertices for its endpoints if they don't exist.
    pub fn insert_fact(&mut self, fact: Fact) -> FactId {
        let source = self.add_entity(fact.source.clone());
        let target = self.add_entity(fact.target.clone());
        self.graph.add_edge(source, target, EdgeData::from(&fact))
    }

    fn require_vertex(&self, entity: &Entity) -> GraphResult<VertexId> {
        self.vertex(entity).ok_or_else(|| GraphError::VertexNotFound {
            entity: entity.to_string(),
        })
    }

    /// Look up the vertex for an entity (name and type must both match).
    pub fn vertex(&self, entity: &Entity) -> Option<VertexId> {
        self.node_index.get(entity).copied()
    }

    /// All vertices carrying the given name, ignoring type.
    pub fn vertices_named(&self, name: &str) -> &[VertexId] {
        self.name_index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The entity stored at a vertex.
    pub fn entity(&self, vertex: VertexId) -> Option<&Entity> {
        self.graph.node_weight(vertex)
    }

    /// Check if an entity is a vertex.
    pub fn has_entity(&self, entity: &Entity) -> bool {
        self.node_index.contains_key(entity)
    }

    /// All vertex ids, in index order. Vertices are never removed, so this
    /// is also insertion order.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.graph.node_indices().collect()
    }

    /// All entities, in vertex index order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.graph.node_indices().filter_map(|idx| self.graph.node_weight(idx))
    }

    /// Source and target vertices of a fact.
    pub fn endpoints(&self, fact: FactId) -> Option<(VertexId, VertexId)> {
        self.graph.edge_endpoints(fact)
    }

    /// Edge data (relation and confidence) of a fact.
    pub fn edge(&self, fact: FactId) -> Option<&EdgeData> {
        self.graph.edge_weight(fact)
    }

    /// Relation label of a fact.
    pub fn relation(&self, fact: FactId) -> Option<&Relation> {
        self.edge(fact).map(|e| &e.relation)
    }

    /// Materialize a fact with resolved endpoint entities.
    pub fn fact(&self, fact: FactId) -> Option<Fact> {
        let (src, dst) = self.graph.edge_endpoints(fact)?;
        let edge = self.graph.edge_weight(fact)?;
        Some(Fact {
            source: self.graph.node_weight(src)?.clone(),
            relation: edge.relation.clone(),
            target: self.graph.node_weight(dst)?.clone(),
            confidence: edge.confidence,
        })
    }

    /// Ids of facts leaving a vertex, in index order.
    ///
    /// Removed facts free their index for reuse, so a fact added after a
    /// removal may sort ahead of older ones.
    pub fn outgoing(&self, vertex: VertexId) -> Vec<FactId> {
        self.incident(vertex, petgraph::Direction::Outgoing)
    }

    /// Ids of facts entering a vertex, in index order.
    pub fn incoming(&self, vertex: VertexId) -> Vec<FactId> {
        self.incident(vertex, petgraph::Direction::Incoming)
    }

    fn incident(&self, vertex: VertexId, dir: petgraph::Direction) -> Vec<FactId> {
        if !self.graph.contains_node(vertex) {
            return vec![];
        }
        let mut ids: Vec<FactId> = self
            .graph
            .edges_directed(vertex, dir)
            .map(|e| e.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Facts leaving an entity (materialized).
    pub fn facts_from(&self, entity: &Entity) -> Vec<Fact> {
        self.vertex(entity)
            .map(|v| self.outgoing(v).into_iter().filter_map(|id| self.fact(id)).collect())
            .unwrap_or_default()
    }

    /// Facts entering an entity (materialized).
    pub fn facts_to(&self, entity: &Entity) -> Vec<Fact> {
        self.vertex(entity)
            .map(|v| self.incoming(v).into_iter().filter_map(|id| self.fact(id)).collect())
            .unwrap_or_default()
    }

    /// Ids of facts from `source` to `target` (ordered pair).
    pub fn facts_between(&self, source: VertexId, target: VertexId) -> Vec<FactId> {
        self.outgoing(source)
            .into_iter()
            .filter(|&id| {
                self.graph
                    .edge_endpoints(id)
                    .is_some_and(|(_, dst)| dst == target)
            })
            .collect()
    }

    /// Whether a fact with the same source, relation and target exists.
    pub fn contains_fact(&self, fact: &Fact) -> bool {
        let (Some(source), Some(target)) = (self.vertex(&fact.source), self.vertex(&fact.target))
        else {
            return false;
        };
        self.facts_between(source, target)
            .into_iter()
            .any(|id| self.relation(id) == Some(&fact.relation))
    }

    /// Remove a fact, returning it if it existed.
    pub fn remove_fact(&mut self, fact: FactId) -> Option<Fact> {
        let removed = self.fact(fact)?;
        self.graph.remove_edge(fact);
        Some(removed)
    }

    /// Ids of every fact, in index order.
    pub fn fact_ids(&self) -> Vec<FactId> {
        self.graph.edge_indices().collect()
    }

    /// Every fact in the graph (materialized).
    pub fn facts(&self) -> Vec<Fact> {
        self.graph
            .edge_indices()
            .filter_map(|id| self.fact(id))
            .collect()
    }

    /// Cursor over every fact that allows removing the current one.
    pub fn fact_cursor(&mut self) -> FactCursor<'_> {
        let pending = self.fact_ids();
        FactCursor {
            graph: self,
            pending: pending.into_iter(),
            current: None,
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of facts.
    pub fn fact_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

impl Default for EntityGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityGraph")
            .field("vertices", &self.vertex_count())
            .field("facts", &self.fact_count())
            .finish()
    }
}

impl FromIterator<Fact> for EntityGraph {
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        let mut graph = EntityGraph::new();
        for fact in iter {
            graph.insert_fact(fact);
        }
        graph
    }
}

/// Edge-iteration cursor over an [`EntityGraph`].
///
/// Iterates a snapshot of the fact ids taken at creation; removing the
/// current fact leaves the rest of the iteration intact.
///
/// ```
/// # use pathmine::graph::{EntityGraph, Fact};
/// # use pathmine::symbol::{Entity, EntityType};
/// let a = Entity::new("A", EntityType::Person);
/// let b = Entity::new("B", EntityType::Person);
/// let mut graph: EntityGraph = [
///     Fact::new(a.clone(), "knows", b.clone()).with_confidence(0.2),
///     Fact::new(a, "likes", b),
/// ]
/// .into_iter()
/// .collect();
///
/// let mut cursor = graph.fact_cursor();
/// while let Some(fact) = cursor.advance() {
///     if fact.score() < 0.5 {
///         cursor.remove_current();
///     }
/// }
/// assert_eq!(graph.fact_count(), 1);
/// ```
pub struct FactCursor<'g> {
    graph: &'g mut EntityGraph,
    pending: std::vec::IntoIter<FactId>,
    current: Option<FactId>,
}

impl FactCursor<'_> {
    /// Move to the next live fact and return it.
    pub fn advance(&mut self) -> Option<Fact> {
        for id in self.pending.by_ref() {
            if let Some(fact) = self.graph.fact(id) {
                self.current = Some(id);
                return Some(fact);
            }
        }
        self.current = None;
        None
    }

    /// Id of the fact the cursor is positioned on.
    pub fn current(&self) -> Option<FactId> {
        self.current
    }

    /// Remove the fact the cursor is positioned on.
    pub fn remove_current(&mut self) -> Option<Fact> {
        let id = self.current.take()?;
        self.graph.remove_fact(id)
    }

    /// Read access to the graph while iterating.
    pub fn graph(&self) -> &EntityGraph {
        &*self.graph
    }
}
