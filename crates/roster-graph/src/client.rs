//! Neo4j connection management and the Bolt-backed store.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use neo4rs::{
    ConfigBuilder, Graph, Neo4jClientErrorKind, Neo4jErrorKind, Neo4jSecurityErrorKind, Txn,
};
use roster_core::RosterConfig;

use crate::retry::RetryPolicy;
use crate::statements::Statement;
use crate::store::{GraphStore, RowStream, StoreSession};

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// Whether a managed transaction may be retried after this error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Query(neo4rs::Error::Neo4j(e)) => is_retryable_kind(e.kind()),
            Self::Query(e) => matches!(
                e,
                neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError
            ),
            Self::Connection(_) | Self::Serialization(_) | Self::Io(_) => false,
        }
    }
}

/// Server failure classes a managed transaction retries: every
/// `Neo.TransientError.*`, expired sessions and expired authorization.
fn is_retryable_kind(kind: Neo4jErrorKind) -> bool {
    matches!(
        kind,
        Neo4jErrorKind::Transient
            | Neo4jErrorKind::Client(
                Neo4jClientErrorKind::SessionExpired
                    | Neo4jClientErrorKind::Security(Neo4jSecurityErrorKind::AuthorizationExpired)
            )
    )
}

/// Configuration for connecting to Neo4j.
#[derive(Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
    pub retry: RetryPolicy,
}

impl From<&RosterConfig> for GraphConfig {
    fn from(config: &RosterConfig) -> Self {
        Self {
            uri: config.connection.uri.clone(),
            user: config.credentials.user.clone(),
            password: config.credentials.password.clone(),
            max_connections: config.connection.max_connections,
            fetch_size: config.connection.fetch_size,
            retry: RetryPolicy::from_settings(&config.connection),
        }
    }
}

impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("fetch_size", &self.fetch_size)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc). Each [`GraphStore::session`] call borrows a
/// pooled connection only for as long as the session lives.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    retry: RetryPolicy,
    sessions: Arc<AtomicU64>,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self {
            graph,
            retry: config.retry,
            sessions: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Release the connection pool.
    pub fn close(self) {
        tracing::info!(
            sessions = self.sessions.load(Ordering::Relaxed),
            "Closing Neo4j connection"
        );
    }
}

impl GraphStore for GraphClient {
    type Session = BoltSession;

    fn session(&self) -> BoltSession {
        let id = self.sessions.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(session = id, "Session opened");
        BoltSession {
            graph: self.graph.clone(),
            retry: self.retry,
            id,
        }
    }
}

/// A session against the Bolt server. Dropping it closes the session.
pub struct BoltSession {
    graph: Graph,
    retry: RetryPolicy,
    id: u64,
}

impl StoreSession for BoltSession {
    type Rows = BoltRows;

    async fn write_transaction(&mut self, statement: &Statement) -> Result<(), GraphError> {
        let graph = &self.graph;
        self.retry
            .run(|| async move {
                let mut txn = graph.start_txn().await?;
                txn.run(statement.to_query()).await?;
                txn.commit().await?;
                Ok::<_, GraphError>(())
            })
            .await
    }

    /// `Graph::execute` retries on its own, so the read goes through an
    /// explicit transaction, which the driver never retries.
    async fn run(&mut self, statement: &Statement) -> Result<BoltRows, GraphError> {
        let mut txn = self.graph.start_txn().await?;
        let stream = txn.execute(statement.to_query()).await?;
        Ok(BoltRows {
            stream,
            txn: Some(txn),
        })
    }
}

impl Drop for BoltSession {
    fn drop(&mut self) {
        tracing::debug!(session = self.id, "Session closed");
    }
}

/// Rows streamed back from the server, pulled in `fetch_size` batches.
///
/// Holds the read transaction (and its pooled connection) until the last
/// row is pulled, then commits it. Dropping early hands the connection
/// back to the pool, which resets it.
pub struct BoltRows {
    stream: neo4rs::RowStream,
    txn: Option<Txn>,
}

impl RowStream for BoltRows {
    async fn next_string(&mut self, column: &str) -> Result<Option<String>, GraphError> {
        let Some(txn) = self.txn.as_mut() else {
            return Ok(None);
        };
        match self.stream.next(txn).await? {
            Some(row) => row.get::<String>(column).map(Some).map_err(|e| {
                GraphError::Serialization(format!("Failed to read column {column}: {e}"))
            }),
            None => {
                if let Some(txn) = self.txn.take() {
                    txn.commit().await?;
                }
                Ok(None)
            }
        }
    }
}
