//! Paths: ordered walks over facts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::symbol::Entity;

use super::{Direction, Fact, FactKey};

/// One edge of a walk: the fact and the orientation it was traversed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub fact: Fact,
    pub direction: Direction,
}

impl PathStep {
    pub fn new(fact: Fact, direction: Direction) -> Self {
        Self { fact, direction }
    }

    /// Entity the step leaves from.
    pub fn from(&self) -> &Entity {
        match self.direction {
            Direction::Forward => &self.fact.source,
            Direction::Backward => &self.fact.target,
        }
    }

    /// Entity the step arrives at.
    pub fn to(&self) -> &Entity {
        match self.direction {
            Direction::Forward => &self.fact.target,
            Direction::Backward => &self.fact.source,
        }
    }
}

/// A non-empty walk of facts starting at some root entity.
///
/// Consecutive steps share an entity: `steps[i].to() == steps[i + 1].from()`.
///
/// Serialized as the bare step list; deserialization goes through
/// [`Path::new`], so empty or broken walks are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PathStep>", into = "Vec<PathStep>")]
pub struct Path {
    steps: Vec<PathStep>,
}

impl TryFrom<Vec<PathStep>> for Path {
    type Error = String;

    fn try_from(steps: Vec<PathStep>) -> Result<Self, Self::Error> {
        let count = steps.len();
        Path::new(steps).ok_or_else(|| {
            format!(
                "{count} steps do not form a walk: a path needs at least one step \
                 and consecutive steps must share an entity"
            )
        })
    }
}

impl From<Path> for Vec<PathStep> {
    fn from(path: Path) -> Self {
        path.steps
    }
}

impl Path {
    /// Build a path from steps. Returns `None` if `steps` is empty or the
    /// steps do not chain.
    pub fn new(steps: Vec<PathStep>) -> Option<Self> {
        if steps.is_empty() {
            return None;
        }
        let chained = steps.windows(2).all(|w| w[0].to() == w[1].from());
        chained.then_some(Self { steps })
    }

    /// Build a path by walking `facts` from `start`, inferring each step's
    /// direction from which endpoint the walk is currently at.
    ///
    /// Returns `None` if `facts` is empty or some fact is not incident to
    /// the walk's current entity.
    pub fn from_walk(start: &Entity, facts: impl IntoIterator<Item = Fact>) -> Option<Self> {
        let mut at = start.clone();
        let mut steps = Vec::new();
        for fact in facts {
            let direction = if fact.source == at {
                Direction::Forward
            } else if fact.target == at {
                Direction::Backward
            } else {
                return None;
            };
            let step = PathStep::new(fact, direction);
            at = step.to().clone();
            steps.push(step);
        }
        Self::new(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`: paths hold at least one edge.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The root entity the walk starts from.
    pub fn start(&self) -> &Entity {
        self.steps[0].from()
    }

    /// The entity the walk ends at.
    pub fn end(&self) -> &Entity {
        self.steps[self.steps.len() - 1].to()
    }

    /// Whether the walk returns to its root.
    pub fn is_loop(&self) -> bool {
        self.start() == self.end()
    }

    /// Visited entities, root first; `len() + 1` entries.
    pub fn vertices(&self) -> Vec<&Entity> {
        std::iter::once(self.start())
            .chain(self.steps.iter().map(PathStep::to))
            .collect()
    }

    /// The facts in walk order.
    pub fn facts(&self) -> impl Iterator<Item = &Fact> + '_ {
        self.steps.iter().map(|s| &s.fact)
    }

    /// Score-free fact identities in walk order.
    pub fn fact_keys(&self) -> Vec<FactKey> {
        self.facts().map(Fact::key).collect()
    }

    /// Distinct entity names mentioned on the path.
    pub fn entity_names(&self) -> BTreeSet<String> {
        self.vertices().into_iter().map(|e| e.name.clone()).collect()
    }

    /// Whether `prefix` is a proper prefix of this path.
    pub fn has_proper_prefix(&self, prefix: &Path) -> bool {
        prefix.len() < self.len()
            && prefix.start() == self.start()
            && prefix
                .steps
                .iter()
                .zip(&self.steps)
                .all(|(a, b)| a.direction == b.direction && a.fact.key() == b.fact.key())
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.start())?;
        for step in &self.steps {
            match step.direction {
                Direction::Forward => write!(f, " --{}--> {}", step.fact.relation, step.to())?,
                Direction::Backward => write!(f, " <--{}-- {}", step.fact.relation, step.to())?,
            }
        }
        Ok(())
    }
}
