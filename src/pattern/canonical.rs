//! Canonical pattern keys for paths.
//!
//! A path is abstracted into relation literals over numbered variables: a
//! *reading* of the path assigns `?0, ?1, …` to its vertices in traversal
//! order and emits one literal `relation(?src, ?tgt)` per fact, in the
//! fact's own orientation. Entity names and types are dropped.
//!
//! - **Loops** become an [`CanonicalKey::Entailment`]: the least ordered
//!   literal sequence over every rotation of the cycle, read in both
//!   directions. The last literal is the head; the others are the body.
//! - **Chains** become a [`CanonicalKey::Conjunction`]: the least sorted
//!   literal list over the forward and the reverse reading.
//!
//! Rotating or reversing a loop, or walking a chain from its other end,
//! leaves the key unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::{Direction, Path, PathStep};
use crate::symbol::Relation;

/// A pattern variable standing for one vertex of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Var(pub u32);

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// `relation(subject, object)` over pattern variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub relation: Relation,
    pub subject: Var,
    pub object: Var,
}

impl Literal {
    pub fn new(relation: impl Into<Relation>, subject: u32, object: u32) -> Self {
        Self {
            relation: relation.into(),
            subject: Var(subject),
            object: Var(object),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.relation, self.subject, self.object)
    }
}

/// Aggregation key of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "literals", rename_all = "snake_case")]
pub enum CanonicalKey {
    /// A closed loop: the body literals entail the last (head) literal.
    Entailment(Vec<Literal>),
    /// An open chain: the literals hold together.
    Conjunction(Vec<Literal>),
}

impl CanonicalKey {
    pub fn literals(&self) -> &[Literal] {
        match self {
            CanonicalKey::Entailment(l) | CanonicalKey::Conjunction(l) => l,
        }
    }

    pub fn is_entailment(&self) -> bool {
        matches!(self, CanonicalKey::Entailment(_))
    }

    /// `"entailment"` or `"conjunction"`.
    pub fn kind(&self) -> &'static str {
        match self {
            CanonicalKey::Entailment(_) => "entailment",
            CanonicalKey::Conjunction(_) => "conjunction",
        }
    }

    /// Number of literals (edges of the source path).
    pub fn len(&self) -> usize {
        self.literals().len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals().is_empty()
    }

    /// Body and head of an entailment; `None` for conjunctions.
    pub fn rule(&self) -> Option<(&[Literal], &Literal)> {
        match self {
            CanonicalKey::Entailment(l) => l.split_last().map(|(head, body)| (body, head)),
            CanonicalKey::Conjunction(_) => None,
        }
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, literals: &[Literal]) -> fmt::Result {
            for (i, lit) in literals.iter().enumerate() {
                if i > 0 {
                    f.write_str(" & ")?;
                }
                write!(f, "{lit}")?;
            }
            Ok(())
        }

        match self {
            CanonicalKey::Conjunction(literals) => join(f, literals),
            CanonicalKey::Entailment(_) => match self.rule() {
                Some((body, head)) if !body.is_empty() => {
                    join(f, body)?;
                    write!(f, " => {head}")
                }
                Some((_, head)) => write!(f, "=> {head}"),
                None => Ok(()),
            },
        }
    }
}

/// Unit wrapper over [`canonicalize`] for callers that want a value to pass
/// around.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathCanonicalizer;

impl PathCanonicalizer {
    pub fn canonicalize(&self, path: &Path) -> CanonicalKey {
        canonicalize(path)
    }
}

/// Compute the canonical key of a path.
pub fn canonicalize(path: &Path) -> CanonicalKey {
    let steps = path.steps();
    if path.is_loop() {
        CanonicalKey::Entailment(loop_form(steps))
    } else {
        CanonicalKey::Conjunction(chain_form(steps))
    }
}

/// Positions of a step's fact source and target along the walk.
///
/// Step `i` connects walk positions `i` and `i + 1`.
fn fact_positions(i: usize, step: &PathStep) -> (usize, usize) {
    match step.direction {
        Direction::Forward => (i, i + 1),
        Direction::Backward => (i + 1, i),
    }
}

fn literal(step: &PathStep, subject: usize, object: usize) -> Literal {
    Literal {
        relation: step.fact.relation.clone(),
        subject: Var(subject as u32),
        object: Var(object as u32),
    }
}

fn chain_form(steps: &[PathStep]) -> Vec<Literal> {
    let n = steps.len();
    let reading = |var: &dyn Fn(usize) -> usize| {
        let mut literals: Vec<Literal> = steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let (s, t) = fact_positions(i, step);
                literal(step, var(s), var(t))
            })
            .collect();
        literals.sort();
        literals
    };

    let forward = reading(&|p: usize| p);
    let reverse = reading(&|p: usize| n - p);
    forward.min(reverse)
}

fn loop_form(steps: &[PathStep]) -> Vec<Literal> {
    let m = steps.len();
    let mut best: Option<Vec<Literal>> = None;

    for r in 0..m {
        // Forward from vertex r: steps r, r+1, …
        let forward: Vec<Literal> = (0..m)
            .map(|k| {
                let i = (r + k) % m;
                let (s, t) = fact_positions(i, &steps[i]);
                literal(&steps[i], (s + m - r) % m, (t + m - r) % m)
            })
            .collect();

        // Backward from vertex r: steps r-1, r-2, …
        let reverse: Vec<Literal> = (0..m)
            .map(|k| {
                let i = (r + m - 1 - k) % m;
                let (s, t) = fact_positions(i, &steps[i]);
                literal(&steps[i], (r + m - s % m) % m, (r + m - t % m) % m)
            })
            .collect();

        for candidate in [forward, reverse] {
            if best.as_ref().is_none_or(|b| candidate < *b) {
                best = Some(candidate);
            }
        }
    }

    best.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Fact;
    use crate::symbol::{Entity, EntityType};

    fn e(name: &str) -> Entity {
        Entity::new(name, EntityType::Person)
    }

    fn walk(start: &str, facts: &[(&str, &str, &str)]) -> Path {
        Path::from_walk(
            &e(start),
            facts.iter().map(|(s, r, t)| Fact::new(e(s), *r, e(t))),
        )
        .unwrap()
    }

    const TRIANGLE: [(&str, &str, &str); 3] = [("X", "r1", "Y"), ("Y", "r2", "Z"), ("Z", "r3", "X")];

    #[test]
    fn loop_rotations_share_a_key() {
        let from_x = walk("X", &[TRIANGLE[0], TRIANGLE[1], TRIANGLE[2]]);
        let from_y = walk("Y", &[TRIANGLE[1], TRIANGLE[2], TRIANGLE[0]]);
        let from_z = walk("Z", &[TRIANGLE[2], TRIANGLE[0], TRIANGLE[1]]);
        let key = canonicalize(&from_x);
        assert!(key.is_entailment());
        assert_eq!(canonicalize(&from_y), key);
        assert_eq!(canonicalize(&from_z), key);
    }

    #[test]
    fn loop_reversal_shares_a_key() {
        let forward = walk("X", &[TRIANGLE[0], TRIANGLE[1], TRIANGLE[2]]);
        let backward = walk("X", &[TRIANGLE[2], TRIANGLE[1], TRIANGLE[0]]);
        assert_eq!(canonicalize(&forward), canonicalize(&backward));
    }

    #[test]
    fn loop_key_shape() {
        let key = canonicalize(&walk("X", &TRIANGLE));
        assert_eq!(
            key,
            CanonicalKey::Entailment(vec![
                Literal::new("r1", 0, 1),
                Literal::new("r2", 1, 2),
                Literal::new("r3", 2, 0),
            ])
        );
        assert_eq!(key.to_string(), "r1(?0, ?1) & r2(?1, ?2) => r3(?2, ?0)");
        let (body, head) = key.rule().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(head.relation.as_str(), "r3");
    }

    #[test]
    fn different_cycles_differ() {
        let a = walk("X", &TRIANGLE);
        let b = walk("X", &[("X", "r1", "Y"), ("Y", "r2", "Z"), ("X", "r3", "Z")]);
        assert!(a.is_loop() && b.is_loop());
        assert_ne!(canonicalize(&a), canonicalize(&b));
    }

    #[test]
    fn chain_read_from_either_end_shares_a_key() {
        let forward = walk("A", &[("A", "born_in", "B"), ("C", "capital_of", "B")]);
        let reverse = walk("C", &[("C", "capital_of", "B"), ("A", "born_in", "B")]);
        let key = canonicalize(&forward);
        assert!(!key.is_entailment());
        assert_eq!(canonicalize(&reverse), key);
        assert_eq!(key.len(), 2);
        assert_eq!(key.kind(), "conjunction");
    }

    #[test]
    fn chain_abstracts_entities() {
        let one = walk("A", &[("A", "spouse", "B")]);
        let two = walk("P", &[("P", "spouse", "Q")]);
        let flipped = walk("Q", &[("P", "spouse", "Q")]);
        assert_eq!(canonicalize(&one), canonicalize(&two));
        assert_eq!(canonicalize(&one), canonicalize(&flipped));
        assert_eq!(canonicalize(&one).to_string(), "spouse(?0, ?1)");
    }

    #[test]
    fn chain_orientation_matters() {
        // A --r--> B --s--> C  vs  A --r--> B <--s-- C
        let same = walk("A", &[("A", "r", "B"), ("B", "s", "C")]);
        let opposed = walk("A", &[("A", "r", "B"), ("C", "s", "B")]);
        assert_ne!(canonicalize(&same), canonicalize(&opposed));
    }

    #[test]
    fn self_loop_entailment() {
        let key = canonicalize(&walk("X", &[("X", "likes", "X")]));
        assert_eq!(key, CanonicalKey::Entailment(vec![Literal::new("likes", 0, 0)]));
        assert_eq!(key.to_string(), "=> likes(?0, ?0)");
    }

    #[test]
    fn two_cycle_entailment() {
        let there_and_back = walk("X", &[("X", "parent_of", "Y"), ("Y", "child_of", "X")]);
        let from_y = walk("Y", &[("Y", "child_of", "X"), ("X", "parent_of", "Y")]);
        assert!(there_and_back.is_loop());
        assert_eq!(canonicalize(&there_and_back), canonicalize(&from_y));
    }

    #[test]
    fn canonicalizer_wrapper_agrees() {
        let path = walk("X", &TRIANGLE);
        assert_eq!(PathCanonicalizer.canonicalize(&path), canonicalize(&path));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let key = canonicalize(&walk("A", &[("A", "spouse", "B")]));
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["kind"], "conjunction");
        assert_eq!(json["literals"][0]["relation"], "spouse");
        assert_eq!(json["literals"][0]["subject"], 0);
    }
}
