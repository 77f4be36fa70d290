//! Record store clients
//!
//! A record store is the table-oriented backend the dashboard reads from and
//! writes to. Rows are JSON objects in the backend's own snake_case shape;
//! [`crate::mapper`] turns them into entities.
//!
//! Two implementations share the same table contract ([`crate::schema`]):
//! - [`rest::RestStore`] talks to a hosted PostgREST-style API
//! - [`sqlite::SqliteStore`] keeps the same tables in a local SQLite file

pub mod rest;
pub mod sqlite;

use crate::schema::{Order, Table};

pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// A single backend record prior to mapping
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Error type for record store operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    /// The table has not been provisioned in the backend
    #[error("table `{table}` does not exist")]
    MissingTable { table: String },

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("no row `{id}` in `{table}`")]
    NotFound { table: String, id: String },

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("backend error: {0}")]
    Backend(String),

    /// Failure inside the client itself rather than an answer from the backend
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn missing_table(table: Table) -> Self {
        StoreError::MissingTable {
            table: table.name().to_string(),
        }
    }

    /// Whether this error during the initial load means the remote store
    /// cannot be used for the session
    pub fn aborts_remote_load(&self) -> bool {
        matches!(
            self,
            StoreError::MissingTable { .. } | StoreError::Network(_) | StoreError::Internal(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Typed CRUD against owner-scoped backend tables.
///
/// Every implementation scopes reads and writes to the owner it was built for.
pub trait RecordStore: Send + Sync {
    /// Rows of `table` in `order`, at most `limit` of them
    fn list(&self, table: Table, order: Order, limit: Option<u32>) -> Result<Vec<Row>>;

    /// Insert a row and return it as stored (with server-assigned id and timestamps)
    fn insert(&self, table: Table, row: Row) -> Result<Row>;

    /// Apply `patch` to the row with `id` and return the stored result
    fn update(&self, table: Table, id: &str, patch: Row) -> Result<Row>;

    /// Insert, or update the row whose `conflict_key` (plus owner) matches
    fn upsert(&self, table: Table, row: Row, conflict_key: &str) -> Result<Row>;

    fn delete(&self, table: Table, id: &str) -> Result<()>;
}
