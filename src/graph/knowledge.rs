//! Trusted knowledge base and relation compatibility.
//!
//! The knowledge base maps an entity to the facts known to be true about it.
//! Known facts name their target only (no type), because knowledge-base
//! dumps rarely carry entity classes for slot values.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::symbol::{Entity, Relation};

/// A ground-truth fact about some subject entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnownFact {
    /// Relation that holds between the subject and the target.
    pub relation: Relation,
    /// Name of the target (slot value); the type is unknown.
    pub target_name: String,
}

/// Mapping from entity to its set of ground-truth facts.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    facts: BTreeMap<Entity, Vec<KnownFact>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `relation(subject, target_name)` is true.
    ///
    /// Duplicate entries for the same subject are ignored.
    pub fn insert(
        &mut self,
        subject: Entity,
        relation: impl Into<Relation>,
        target_name: impl Into<String>,
    ) {
        let known = KnownFact {
            relation: relation.into(),
            target_name: target_name.into(),
        };
        let entry = self.facts.entry(subject).or_default();
        if !entry.contains(&known) {
            entry.push(known);
        }
    }

    /// Known facts for an entity (empty if the entity is unknown).
    pub fn known_facts(&self, entity: &Entity) -> &[KnownFact] {
        self.facts.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the knowledge base knows anything about an entity.
    pub fn contains_entity(&self, entity: &Entity) -> bool {
        self.facts.contains_key(entity)
    }

    /// Iterate `(subject, known facts)` in subject order.
    pub fn iter(&self) -> impl Iterator<Item = (&Entity, &[KnownFact])> + '_ {
        self.facts.iter().map(|(e, f)| (e, f.as_slice()))
    }

    /// Number of subjects.
    pub fn entity_count(&self) -> usize {
        self.facts.len()
    }

    /// Total number of known facts.
    pub fn len(&self) -> usize {
        self.facts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Predicate deciding whether two relations can hold for the same
/// subject and slot value at once.
pub trait Cooccurrence {
    fn plausibly_cooccurs(&self, a: &Relation, b: &Relation) -> bool;
}

impl<F> Cooccurrence for F
where
    F: Fn(&Relation, &Relation) -> bool,
{
    fn plausibly_cooccurs(&self, a: &Relation, b: &Relation) -> bool {
        self(a, b)
    }
}

/// Explicit table of relation pairs that may co-occur.
///
/// A relation always co-occurs with itself; every other pair must be
/// declared.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityTable {
    /// Stored both ways for O(1) lookup.
    pairs: HashSet<(Relation, Relation)>,
}

impl CompatibilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare two relations compatible.
    pub fn declare_compatible(&mut self, a: impl Into<Relation>, b: impl Into<Relation>) {
        let (a, b) = (a.into(), b.into());
        self.pairs.insert((b.clone(), a.clone()));
        self.pairs.insert((a, b));
    }

    /// Builder form of [`declare_compatible`](Self::declare_compatible).
    pub fn with(mut self, a: impl Into<Relation>, b: impl Into<Relation>) -> Self {
        self.declare_compatible(a, b);
        self
    }

    pub fn are_compatible(&self, a: &Relation, b: &Relation) -> bool {
        a == b || self.pairs.contains(&(a.clone(), b.clone()))
    }

    /// Number of declared pairs (counting each pair once).
    pub fn len(&self) -> usize {
        let self_pairs = self.pairs.iter().filter(|(a, b)| a == b).count();
        (self.pairs.len() + self_pairs) / 2
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Cooccurrence for CompatibilityTable {
    fn plausibly_cooccurs(&self, a: &Relation, b: &Relation) -> bool {
        self.are_compatible(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::EntityType;

    #[test]
    fn insert_deduplicates() {
        let mut kb = KnowledgeBase::new();
        let obama = Entity::new("Obama", EntityType::Person);
        kb.insert(obama.clone(), "per:origin", "Hawaii");
        kb.insert(obama.clone(), "per:origin", "Hawaii");
        kb.insert(obama.clone(), "per:title", "President");
        assert_eq!(kb.known_facts(&obama).len(), 2);
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.entity_count(), 1);
    }

    #[test]
    fn unknown_entity_has_no_facts() {
        let kb = KnowledgeBase::new();
        let e = Entity::new("Nobody", EntityType::Person);
        assert!(kb.known_facts(&e).is_empty());
        assert!(!kb.contains_entity(&e));
        assert!(kb.is_empty());
    }

    #[test]
    fn compatibility_is_symmetric_and_reflexive() {
        let table = CompatibilityTable::new().with("per:spouse", "per:other_family");
        let spouse = Relation::new("per:spouse");
        let family = Relation::new("per:other_family");
        let boss = Relation::new("per:employee_of");
        assert!(table.plausibly_cooccurs(&spouse, &family));
        assert!(table.plausibly_cooccurs(&family, &spouse));
        assert!(table.plausibly_cooccurs(&boss, &boss));
        assert!(!table.plausibly_cooccurs(&spouse, &boss));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn closures_are_cooccurrence_predicates() {
        let anything = |_: &Relation, _: &Relation| true;
        assert!(anything.plausibly_cooccurs(&Relation::new("a"), &Relation::new("b")));
    }
}
