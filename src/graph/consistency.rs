//! Consistency enforcement: reconciles a raw graph with a trusted knowledge base.
//!
//! Runs three passes, in order:
//!
//! - **Contradiction removal**: drops a fact when the knowledge base knows a
//!   different relation between the same subject and slot value and the two
//!   relations cannot plausibly co-occur
//! - **Confidence pruning**: drops facts scored strictly below the cutoff
//!   (only when the cutoff is positive)
//! - **Gap filling**: adds known facts whose target name resolves to a graph
//!   vertex, at full confidence, unless the subject already holds the relation
//!   to some vertex of that name
//!
//! Gap filling never re-adds a fact removed as a contradiction.

use std::collections::HashSet;

use crate::graph::{Fact, FactKey};
use crate::symbol::{Entity, Relation};

use super::index::{EntityGraph, GraphResult};
use super::knowledge::{Cooccurrence, KnowledgeBase, KnownFact};

/// What an enforcement pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnforcementReport {
    /// Facts removed for contradicting the knowledge base.
    pub contradictions_removed: usize,
    /// Facts removed for falling below the confidence cutoff.
    pub pruned: usize,
    /// Known facts added to the graph.
    pub gaps_filled: usize,
}

impl EnforcementReport {
    /// Whether the graph was left untouched.
    pub fn is_noop(&self) -> bool {
        self.contradictions_removed == 0 && self.pruned == 0 && self.gaps_filled == 0
    }
}

/// Reconciles an [`EntityGraph`] against a [`KnowledgeBase`].
pub struct GraphConsistencyEnforcer<'a, C: ?Sized> {
    kb: &'a KnowledgeBase,
    compat: &'a C,
    cutoff: f32,
}

impl<'a, C: Cooccurrence + ?Sized> GraphConsistencyEnforcer<'a, C> {
    pub fn new(kb: &'a KnowledgeBase, compat: &'a C) -> Self {
        Self {
            kb,
            compat,
            cutoff: 0.0,
        }
    }

    /// Remove facts scored below `cutoff`. Zero disables pruning.
    pub fn with_cutoff(mut self, cutoff: f32) -> Self {
        self.cutoff = cutoff.max(0.0);
        self
    }

    /// Known fact that `fact` contradicts, if any.
    fn contradiction(&self, fact: &Fact) -> Option<&'a KnownFact> {
        self.kb.known_facts(&fact.source).iter().find(|known| {
            known.target_name == fact.target.name
                && known.relation != fact.relation
                && !self.compat.plausibly_cooccurs(&fact.relation, &known.relation)
        })
    }

    /// Apply all passes to `graph` in place.
    pub fn enforce(&self, graph: &mut EntityGraph) -> GraphResult<EnforcementReport> {
        let mut report = EnforcementReport::default();
        let mut contradicted: HashSet<FactKey> = HashSet::new();

        // 1. Contradiction removal
        {
            let mut cursor = graph.fact_cursor();
            while let Some(fact) = cursor.advance() {
                if let Some(known) = self.contradiction(&fact) {
                    tracing::debug!(
                        fact = %fact,
                        known = %known.relation,
                        "removing fact that contradicts the knowledge base"
                    );
                    contradicted.insert(fact.key());
                    cursor.remove_current();
                    report.contradictions_removed += 1;
                }
            }
        }

        // 2. Confidence pruning
        if self.cutoff > 0.0 {
            let mut cursor = graph.fact_cursor();
            while let Some(fact) = cursor.advance() {
                if fact.score() < self.cutoff {
                    cursor.remove_current();
                    report.pruned += 1;
                }
            }
        }

        // 3. Gap filling
        for (subject, known_facts) in self.kb.iter() {
            if !graph.has_entity(subject) {
                continue;
            }
            for known in known_facts {
                if known_fact_present(graph, subject, known) {
                    continue;
                }
                let Some(target) = resolve_by_name(graph, &known.target_name) else {
                    continue;
                };
                let fact = Fact::new(subject.clone(), known.relation.clone(), target)
                    .with_confidence(1.0);
                if contradicted.contains(&fact.key()) {
                    continue;
                }
                graph.add_fact(fact)?;
                report.gaps_filled += 1;
            }
        }

        tracing::info!(
            removed = report.contradictions_removed,
            pruned = report.pruned,
            filled = report.gaps_filled,
            cutoff = self.cutoff,
            "graph consistency enforced"
        );

        Ok(report)
    }
}

/// Whether `subject` already has `known.relation` to any vertex carrying the
/// known target name, whatever its type.
fn known_fact_present(graph: &EntityGraph, subject: &Entity, known: &KnownFact) -> bool {
    graph
        .vertices_named(&known.target_name)
        .iter()
        .filter_map(|&v| graph.entity(v))
        .any(|target| {
            graph.contains_fact(&Fact::new(
                subject.clone(),
                known.relation.clone(),
                target.clone(),
            ))
        })
}

/// Resolve a bare target name to a graph entity, ignoring type.
///
/// When several vertices share the name the earliest one wins.
fn resolve_by_name(graph: &EntityGraph, name: &str) -> Option<Entity> {
    let candidates = graph.vertices_named(name);
    let first = *candidates.first()?;
    if candidates.len() > 1 {
        tracing::warn!(
            name,
            candidates = candidates.len(),
            "ambiguous knowledge-base target; using the first vertex with this name"
        );
    }
    graph.entity(first).cloned()
}

/// Enforce with a plain closure as the co-occurrence predicate.
pub fn enforce_with<F>(
    graph: &mut EntityGraph,
    kb: &KnowledgeBase,
    plausibly_cooccurs: F,
    cutoff: f32,
) -> GraphResult<EnforcementReport>
where
    F: Fn(&Relation, &Relation) -> bool,
{
    GraphConsistencyEnforcer::new(kb, &plausibly_cooccurs)
        .with_cutoff(cutoff)
        .enforce(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CompatibilityTable;
    use crate::symbol::EntityType;

    fn person(name: &str) -> Entity {
        Entity::new(name, EntityType::Person)
    }

    fn never(_: &Relation, _: &Relation) -> bool {
        false
    }

    #[test]
    fn contradiction_removed_and_known_fact_added() {
        let x = person("X");
        let y = person("Y");
        let mut graph: EntityGraph = [Fact::new(x.clone(), "rel_conflict", y.clone())]
            .into_iter()
            .collect();
        let mut kb = KnowledgeBase::new();
        kb.insert(x.clone(), "rel_known", "Y");

        let report = enforce_with(&mut graph, &kb, never, 0.0).unwrap();

        assert_eq!(report.contradictions_removed, 1);
        assert_eq!(report.gaps_filled, 1);
        assert!(!graph.contains_fact(&Fact::new(x.clone(), "rel_conflict", y.clone())));
        let added = graph.facts_from(&x);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].relation.as_str(), "rel_known");
        assert_eq!(added[0].confidence, Some(1.0));
    }

    #[test]
    fn compatible_relations_survive() {
        let x = person("X");
        let mut graph: EntityGraph = [Fact::new(x.clone(), "per:spouse", person("Y"))]
            .into_iter()
            .collect();
        let mut kb = KnowledgeBase::new();
        kb.insert(x.clone(), "per:other_family", "Y");
        let table = CompatibilityTable::new().with("per:spouse", "per:other_family");

        let report = GraphConsistencyEnforcer::new(&kb, &table)
            .enforce(&mut graph)
            .unwrap();

        assert_eq!(report.contradictions_removed, 0);
        assert_eq!(report.gaps_filled, 1);
        assert_eq!(graph.fact_count(), 2);
    }

    #[test]
    fn different_slot_value_is_not_a_contradiction() {
        let x = person("X");
        let mut graph: EntityGraph = [Fact::new(x.clone(), "rel_a", person("Y"))]
            .into_iter()
            .collect();
        let mut kb = KnowledgeBase::new();
        kb.insert(x, "rel_b", "Z");

        let report = enforce_with(&mut graph, &kb, never, 0.0).unwrap();
        assert_eq!(report.contradictions_removed, 0);
        // Z is not a vertex, so nothing can be filled in.
        assert_eq!(report.gaps_filled, 0);
        assert_eq!(graph.fact_count(), 1);
    }

    #[test]
    fn known_fact_is_never_its_own_contradiction() {
        let x = person("X");
        let mut graph: EntityGraph = [Fact::new(x.clone(), "rel_known", person("Y"))]
            .into_iter()
            .collect();
        let mut kb = KnowledgeBase::new();
        kb.insert(x, "rel_known", "Y");

        let report = enforce_with(&mut graph, &kb, never, 0.0).unwrap();
        assert!(report.is_noop());
        assert_eq!(graph.fact_count(), 1);
    }

    #[test]
    fn confidence_cutoff_prunes_strictly_below() {
        let mut graph: EntityGraph = [
            Fact::new(person("A"), "low", person("B")).with_confidence(0.3),
            Fact::new(person("A"), "high", person("B")).with_confidence(0.9),
            Fact::new(person("A"), "edge", person("B")).with_confidence(0.5),
            Fact::new(person("A"), "unscored", person("B")),
        ]
        .into_iter()
        .collect();

        let report = enforce_with(&mut graph, &KnowledgeBase::new(), never, 0.5).unwrap();

        assert_eq!(report.pruned, 1);
        let rels: Vec<String> = graph.facts().iter().map(|f| f.relation.to_string()).collect();
        assert_eq!(rels, vec!["high", "edge", "unscored"]);
    }

    #[test]
    fn zero_cutoff_disables_pruning() {
        let mut graph: EntityGraph = [Fact::new(person("A"), "r", person("B")).with_confidence(0.0)]
            .into_iter()
            .collect();
        let report = enforce_with(&mut graph, &KnowledgeBase::new(), never, 0.0).unwrap();
        assert_eq!(report.pruned, 0);
        assert_eq!(graph.fact_count(), 1);
    }

    #[test]
    fn gap_filling_resolves_target_by_name_only() {
        let x = person("X");
        let acme = Entity::new("Acme", EntityType::Organization);
        let mut graph = EntityGraph::new();
        graph.add_entity(x.clone());
        graph.add_entity(acme.clone());
        let mut kb = KnowledgeBase::new();
        kb.insert(x.clone(), "per:employee_of", "Acme");
        kb.insert(person("Absent"), "per:employee_of", "Acme");

        let report = enforce_with(&mut graph, &kb, never, 0.0).unwrap();

        assert_eq!(report.gaps_filled, 1);
        assert!(graph.contains_fact(&Fact::new(x, "per:employee_of", acme)));
    }

    #[test]
    fn gap_filling_does_not_duplicate() {
        let x = person("X");
        let mut graph: EntityGraph = [Fact::new(x.clone(), "rel_known", person("Y"))]
            .into_iter()
            .collect();
        let mut kb = KnowledgeBase::new();
        kb.insert(x, "rel_known", "Y");
        enforce_with(&mut graph, &kb, never, 0.0).unwrap();
        enforce_with(&mut graph, &kb, never, 0.0).unwrap();
        assert_eq!(graph.fact_count(), 1);
    }

    #[test]
    fn gap_filling_accepts_any_type_for_the_target_name() {
        let x = person("X");
        let jordan_person = Entity::new("Jordan", EntityType::Person);
        let jordan_place = Entity::new("Jordan", EntityType::Location);
        let mut graph = EntityGraph::new();
        graph.add_entity(jordan_person.clone());
        graph.insert_fact(Fact::new(x.clone(), "born_in", jordan_place.clone()));
        let mut kb = KnowledgeBase::new();
        kb.insert(x.clone(), "born_in", "Jordan");

        let report = enforce_with(&mut graph, &kb, never, 0.0).unwrap();

        assert_eq!(report.gaps_filled, 0);
        assert_eq!(graph.fact_count(), 1);
        assert!(graph.contains_fact(&Fact::new(x.clone(), "born_in", jordan_place)));
        assert!(!graph.contains_fact(&Fact::new(x, "born_in", jordan_person)));
    }

    #[test]
    fn gap_filling_skips_removed_contradictions() {
        // The KB itself holds two incompatible relations for the same slot.
        let x = person("X");
        let mut graph: EntityGraph = [Fact::new(x.clone(), "rel_a", person("Y"))]
            .into_iter()
            .collect();
        let mut kb = KnowledgeBase::new();
        kb.insert(x.clone(), "rel_a", "Y");
        kb.insert(x.clone(), "rel_b", "Y");

        let report = enforce_with(&mut graph, &kb, never, 0.0).unwrap();

        assert_eq!(report.contradictions_removed, 1);
        assert!(!graph.contains_fact(&Fact::new(x.clone(), "rel_a", person("Y"))));
        assert!(graph.contains_fact(&Fact::new(x, "rel_b", person("Y"))));
    }

    #[test]
    fn pruned_known_fact_is_restored_at_full_confidence() {
        let x = person("X");
        let mut graph: EntityGraph = [Fact::new(x.clone(), "rel_known", person("Y")).with_confidence(0.1)]
            .into_iter()
            .collect();
        let mut kb = KnowledgeBase::new();
        kb.insert(x.clone(), "rel_known", "Y");

        let report = enforce_with(&mut graph, &kb, never, 0.5).unwrap();

        assert_eq!(report.pruned, 1);
        assert_eq!(report.gaps_filled, 1);
        assert_eq!(graph.facts_from(&x)[0].confidence, Some(1.0));
    }
}
