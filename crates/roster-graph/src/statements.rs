//! The Cypher statements roster issues.
//!
//! Values always travel as parameters, never spliced into the text.

use neo4rs::{query, Query};

/// Upsert keyed on `name`: a second MERGE with the same name matches the
/// existing node instead of creating another.
pub const MERGE_PERSON: &str = "MERGE (p:Person {name: $name})";

/// Project the name of every Person whose name starts with `$prefix`.
/// No ORDER BY: row order is whatever the store returns.
pub const PEOPLE_BY_PREFIX: &str =
    "MATCH (p:Person) WHERE p.name STARTS WITH $prefix RETURN p.name AS name";

/// Column returned by [`PEOPLE_BY_PREFIX`].
pub const NAME_COLUMN: &str = "name";

/// A parameterized statement understood by every [`GraphStore`](crate::GraphStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    MergePerson { name: String },
    PeopleByPrefix { prefix: String },
}

impl Statement {
    pub fn merge_person(name: &str) -> Self {
        Self::MergePerson {
            name: name.to_string(),
        }
    }

    pub fn people_by_prefix(prefix: &str) -> Self {
        Self::PeopleByPrefix {
            prefix: prefix.to_string(),
        }
    }

    pub fn cypher(&self) -> &'static str {
        match self {
            Self::MergePerson { .. } => MERGE_PERSON,
            Self::PeopleByPrefix { .. } => PEOPLE_BY_PREFIX,
        }
    }

    /// Build the driver query with its parameters bound.
    pub fn to_query(&self) -> Query {
        match self {
            Self::MergePerson { name } => query(MERGE_PERSON).param("name", name.clone()),
            Self::PeopleByPrefix { prefix } => {
                query(PEOPLE_BY_PREFIX).param("prefix", prefix.clone())
            }
        }
    }
}
