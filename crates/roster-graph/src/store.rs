//! The store seam: the two capabilities roster needs from a graph database.
//!
//! A store hands out sessions. A session can run a write inside a managed
//! transaction (which the store may retry on transient failure) or run a
//! read directly and stream rows back. Sessions are owned guards: dropping
//! one releases it.

use crate::client::GraphError;
use crate::statements::Statement;

/// A handle to a graph store. Shared by reference, never mutated.
pub trait GraphStore {
    type Session: StoreSession;

    /// Open a fresh session scoped to one call.
    fn session(&self) -> Self::Session;
}

#[allow(async_fn_in_trait)]
pub trait StoreSession {
    type Rows: RowStream;

    /// Run `statement` inside a managed write transaction. Transient
    /// failures are retried by the store; anything else is returned.
    async fn write_transaction(&mut self, statement: &Statement) -> Result<(), GraphError>;

    /// Run `statement` once, without retry, and stream its rows.
    async fn run(&mut self, statement: &Statement) -> Result<Self::Rows, GraphError>;
}

/// Forward-only cursor over result rows.
#[allow(async_fn_in_trait)]
pub trait RowStream {
    /// Pull the next row and read `column` as a string. `Ok(None)` once
    /// the rows are exhausted.
    async fn next_string(&mut self, column: &str) -> Result<Option<String>, GraphError>;
}
