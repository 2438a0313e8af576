//! Write operations for the roster graph.
//!
//! Writes use MERGE (upsert) semantics so repeating a name never creates
//! a second node.

use crate::client::GraphError;
use crate::statements::Statement;
use crate::store::{GraphStore, StoreSession};

/// Upsert a Person node named `name`.
///
/// Opens a session for this call only and releases it on every exit path.
/// The MERGE runs inside the store's managed write transaction, so any
/// retrying of transient failures happens there. Errors are returned as-is.
pub async fn add_person<S: GraphStore>(store: &S, name: &str) -> Result<(), GraphError> {
    let mut session = store.session();
    session
        .write_transaction(&Statement::merge_person(name))
        .await?;

    tracing::debug!(name, "Merged Person node");
    Ok(())
}
