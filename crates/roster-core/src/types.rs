//! Core domain types for the roster graph.

use serde::{Deserialize, Serialize};

/// A `Person` node. Identity is the name: the graph holds at most one
/// node per name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Person {
    pub name: String,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Case-sensitive, exact string prefix match (Cypher `STARTS WITH`).
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.name.starts_with(prefix)
    }
}
