//! roster-graph — Person writer and reader over a Bolt graph store.
//!
//! The store is always passed in explicitly: [`GraphClient`] talks to a
//! live Neo4j server, [`MemoryStore`] keeps nodes in process. Every call
//! opens its own session and releases it on every exit path.

pub mod client;
pub mod memory;
pub mod mutations;
pub mod queries;
pub mod retry;
pub mod statements;
pub mod store;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use memory::MemoryStore;
pub use mutations::add_person;
pub use queries::{people_with_prefix, print_people, PeopleStream};
pub use retry::RetryPolicy;
pub use statements::Statement;
pub use store::{GraphStore, RowStream, StoreSession};
