//! Core symbol types for the pathmine engine.
//!
//! Symbols are the atomic units the miner reasons over. Every graph vertex is
//! an [`Entity`] (a name plus an [`EntityType`] tag) and every edge label is a
//! [`Relation`]. Two entities denote the same vertex only when both the name
//! and the type match.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Coarse named-entity class attached to every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Date,
    Number,
    Money,
    Title,
    Misc,
}

impl EntityType {
    /// All entity types, in declaration order.
    pub const ALL: [EntityType; 8] = [
        EntityType::Person,
        EntityType::Organization,
        EntityType::Location,
        EntityType::Date,
        EntityType::Number,
        EntityType::Money,
        EntityType::Title,
        EntityType::Misc,
    ];

    /// Canonical upper-case tag, as used in serialized datasets.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::Organization => "ORGANIZATION",
            EntityType::Location => "LOCATION",
            EntityType::Date => "DATE",
            EntityType::Number => "NUMBER",
            EntityType::Money => "MONEY",
            EntityType::Title => "TITLE",
            EntityType::Misc => "MISC",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| format!("unknown entity type: {s}"))
    }
}

/// A typed, named node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    /// Surface name, e.g. `"Barack Obama"`.
    pub name: String,
    /// Entity class.
    #[serde(rename = "type")]
    pub kind: EntityType,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Whether the two entities share a name, regardless of type.
    pub fn same_name(&self, other: &Entity) -> bool {
        self.name == other.name
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.kind)
    }
}

/// A relation name labelling graph edges.
///
/// Cheap to clone: the name is shared behind an `Arc<str>`, so tries and
/// canonical keys can hold relations without copying strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relation(Arc<str>);

impl Relation {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Relation {
    fn from(name: &str) -> Self {
        Relation::new(name)
    }
}

impl From<String> for Relation {
    fn from(name: String) -> Self {
        Relation(Arc::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_identity_needs_name_and_type() {
        let a = Entity::new("Paris", EntityType::Location);
        let b = Entity::new("Paris", EntityType::Location);
        let c = Entity::new("Paris", EntityType::Person);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.same_name(&c));
    }

    #[test]
    fn entity_type_parses_case_insensitively() {
        assert_eq!("person".parse::<EntityType>().unwrap(), EntityType::Person);
        assert_eq!(
            " ORGANIZATION ".parse::<EntityType>().unwrap(),
            EntityType::Organization
        );
        assert!("spaceship".parse::<EntityType>().is_err());
    }

    #[test]
    fn entity_type_serializes_screaming() {
        let json = serde_json::to_string(&EntityType::Organization).unwrap();
        assert_eq!(json, "\"ORGANIZATION\"");
    }

    #[test]
    fn entity_serializes_kind_as_type() {
        let e = Entity::new("Acme", EntityType::Organization);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["name"], "Acme");
        assert_eq!(json["type"], "ORGANIZATION");
    }

    #[test]
    fn entity_display() {
        let e = Entity::new("Alice", EntityType::Person);
        assert_eq!(e.to_string(), "Alice/PERSON");
    }

    #[test]
    fn relation_compares_by_name() {
        let a = Relation::new("per:employee_of");
        let b: Relation = "per:employee_of".into();
        assert_eq!(a, b);
        assert!(Relation::new("a") < Relation::new("b"));
        assert_eq!(a.to_string(), "per:employee_of");
    }
}
