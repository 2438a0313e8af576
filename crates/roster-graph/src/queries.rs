//! Read operations for the roster graph.

use std::io::Write;

use crate::client::GraphError;
use crate::statements::{Statement, NAME_COLUMN};
use crate::store::{GraphStore, RowStream, StoreSession};

/// Lazy, forward-only sequence of names from a prefix query.
///
/// The stream owns the session it was read on; the session is released
/// when the stream is dropped. Once exhausted it keeps returning `None`.
pub struct PeopleStream<S: StoreSession> {
    // Declared before `_session` so rows are dropped first.
    rows: S::Rows,
    _session: S,
    exhausted: bool,
}

impl<S: StoreSession> PeopleStream<S> {
    /// Pull the next name, or `None` when there are no more.
    pub async fn next(&mut self) -> Result<Option<String>, GraphError> {
        if self.exhausted {
            return Ok(None);
        }
        let name = self.rows.next_string(NAME_COLUMN).await?;
        self.exhausted = name.is_none();
        Ok(name)
    }
}

/// Names of every Person whose name starts with `prefix` (case-sensitive).
///
/// Runs the read directly, without the managed retry used for writes. Row
/// order is whatever the store returns.
pub async fn people_with_prefix<S: GraphStore>(
    store: &S,
    prefix: &str,
) -> Result<PeopleStream<S::Session>, GraphError> {
    let mut session = store.session();
    let rows = session.run(&Statement::people_by_prefix(prefix)).await?;
    Ok(PeopleStream {
        rows,
        _session: session,
        exhausted: false,
    })
}

/// Write each matching name to `out`, one per line, as it is pulled.
///
/// Returns how many names were written.
pub async fn print_people<S: GraphStore, W: Write>(
    store: &S,
    prefix: &str,
    out: &mut W,
) -> Result<usize, GraphError> {
    let mut people = people_with_prefix(store, prefix).await?;
    let mut printed = 0;
    while let Some(name) = people.next().await? {
        writeln!(out, "{name}")?;
        printed += 1;
    }
    out.flush()?;

    tracing::debug!(prefix, printed, "Listed people by prefix");
    Ok(printed)
}
