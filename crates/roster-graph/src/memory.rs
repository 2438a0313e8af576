//! In-process graph store with MERGE / STARTS WITH semantics.
//!
//! Useful anywhere a live Neo4j is not: it keeps `Person` nodes in a
//! vector, counts sessions and pulled rows, and can be told to fail.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use roster_core::Person;

use crate::client::GraphError;
use crate::retry::RetryPolicy;
use crate::statements::{Statement, NAME_COLUMN};
use crate::store::{GraphStore, RowStream, StoreSession};

#[derive(Debug, Default)]
struct MemoryState {
    people: Vec<Person>,
    open_sessions: usize,
    sessions_opened: usize,
    write_attempts: usize,
    rows_pulled: usize,
    transient_write_failures: usize,
    reject_statements: bool,
}

/// A cloneable handle to shared in-memory graph state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    retry: RetryPolicy,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_retry(RetryPolicy::no_retry())
    }

    pub fn with_retry(retry: RetryPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            retry,
        }
    }

    /// Names of every stored person, in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.lock().people.iter().map(|p| p.name.clone()).collect()
    }

    /// Number of nodes carrying exactly `name`.
    pub fn count_named(&self, name: &str) -> usize {
        self.lock().people.iter().filter(|p| p.name == name).count()
    }

    pub fn open_sessions(&self) -> usize {
        self.lock().open_sessions
    }

    pub fn sessions_opened(&self) -> usize {
        self.lock().sessions_opened
    }

    pub fn write_attempts(&self) -> usize {
        self.lock().write_attempts
    }

    pub fn rows_pulled(&self) -> usize {
        self.lock().rows_pulled
    }

    /// Make the next `n` write attempts fail with a transient error.
    pub fn fail_next_writes(&self, n: usize) {
        self.lock().transient_write_failures = n;
    }

    /// Reject every statement with a non-transient error.
    pub fn reject_statements(&self, reject: bool) {
        self.lock().reject_statements = reject;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-update.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply_write(&self, statement: &Statement) -> Result<(), GraphError> {
        let mut state = self.lock();
        state.write_attempts += 1;

        if state.transient_write_failures > 0 {
            state.transient_write_failures -= 1;
            return Err(GraphError::Unavailable("simulated leader switch".into()));
        }
        if state.reject_statements {
            return Err(GraphError::Serialization(format!(
                "statement rejected: {}",
                statement.cypher()
            )));
        }

        match statement {
            Statement::MergePerson { name } => {
                if !state.people.iter().any(|p| &p.name == name) {
                    state.people.push(Person::new(name.as_str()));
                }
                Ok(())
            }
            Statement::PeopleByPrefix { .. } => Err(GraphError::Serialization(
                "read statement issued in a write transaction".into(),
            )),
        }
    }
}

impl GraphStore for MemoryStore {
    type Session = MemorySession;

    fn session(&self) -> MemorySession {
        let mut state = self.lock();
        state.open_sessions += 1;
        state.sessions_opened += 1;
        drop(state);

        MemorySession {
            store: self.clone(),
        }
    }
}

/// A session on a [`MemoryStore`]. Dropping it closes the session.
pub struct MemorySession {
    store: MemoryStore,
}

impl StoreSession for MemorySession {
    type Rows = MemoryRows;

    async fn write_transaction(&mut self, statement: &Statement) -> Result<(), GraphError> {
        let store = &self.store;
        store
            .retry
            .run(|| async move { store.apply_write(statement) })
            .await
    }

    async fn run(&mut self, statement: &Statement) -> Result<MemoryRows, GraphError> {
        let state = self.store.lock();
        if state.reject_statements {
            return Err(GraphError::Serialization(format!(
                "statement rejected: {}",
                statement.cypher()
            )));
        }

        match statement {
            Statement::PeopleByPrefix { prefix } => {
                // Snapshot: rows reflect the nodes present when the statement ran.
                let rows = state
                    .people
                    .iter()
                    .filter(|p| p.matches_prefix(prefix))
                    .map(|p| p.name.clone())
                    .collect();
                Ok(MemoryRows {
                    rows,
                    store: self.store.clone(),
                })
            }
            Statement::MergePerson { .. } => {
                drop(state);
                self.store.apply_write(statement)?;
                Ok(MemoryRows {
                    rows: VecDeque::new(),
                    store: self.store.clone(),
                })
            }
        }
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        state.open_sessions = state.open_sessions.saturating_sub(1);
    }
}

/// Rows produced by a read on a [`MemoryStore`].
pub struct MemoryRows {
    rows: VecDeque<String>,
    store: MemoryStore,
}

impl RowStream for MemoryRows {
    async fn next_string(&mut self, column: &str) -> Result<Option<String>, GraphError> {
        if column != NAME_COLUMN {
            return Err(GraphError::Serialization(format!(
                "Failed to read column {column}: no such column"
            )));
        }
        let row = self.rows.pop_front();
        if row.is_some() {
            self.store.lock().rows_pulled += 1;
        }
        Ok(row)
    }
}
