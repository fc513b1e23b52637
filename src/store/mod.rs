//! Backing-store abstraction.
//!
//! The classifier is polymorphic over anything that can run a count query,
//! execute a write/DDL statement, introspect a table's columns, and load a
//! full table into a [`frame::Frame`].

/// In-memory tabular snapshot used by the in-memory strategy.
pub mod frame;
/// Diesel-backed `PostgreSQL` store.
#[cfg(feature = "db")]
pub mod postgres;

use frame::Frame;

/// Failure surfaced by a backing store.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{operation} failed: {message}")]
pub struct StoreError {
    /// Which store operation failed.
    pub operation: String,
    /// Backend-reported failure detail.
    pub message: String,
}

impl StoreError {
    /// New error for `operation` with backend `message`.
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Capability set the classifier requires from a backing store.
///
/// All operations are blocking; a handle is owned by one invocation for its
/// whole duration and released on every exit path when dropped.
pub trait StoreLike {
    /// Run a read query whose single result cell is a count.
    fn query_count(&mut self, sql: &str) -> Result<i64, StoreError>;

    /// Run a write/DDL statement.
    fn execute(&mut self, sql: &str) -> Result<(), StoreError>;

    /// Column names of `table` in ordinal position order.
    fn table_columns(&mut self, table: &str) -> Result<Vec<String>, StoreError>;

    /// Load the full content of `table`, preserving row order.
    fn fetch_table(&mut self, table: &str) -> Result<Frame, StoreError>;
}

/// Adapter that forwards to an inner store and records the SQL text of
/// every count query and statement run through it, in execution order.
///
/// The run artifact is written from this log, so it reflects what the
/// selected strategy actually ran rather than a reconstruction.
pub struct RecordingStore<'a> {
    inner: &'a mut dyn StoreLike,
    log: Vec<String>,
}

impl<'a> RecordingStore<'a> {
    /// Wrap `inner` with an empty log.
    pub fn new(inner: &'a mut dyn StoreLike) -> Self {
        Self {
            inner,
            log: Vec::new(),
        }
    }

    /// SQL recorded so far.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Consume the adapter and return the recorded SQL.
    pub fn into_log(self) -> Vec<String> {
        self.log
    }
}

impl StoreLike for RecordingStore<'_> {
    fn query_count(&mut self, sql: &str) -> Result<i64, StoreError> {
        self.log.push(sql.to_string());
        self.inner.query_count(sql)
    }

    fn execute(&mut self, sql: &str) -> Result<(), StoreError> {
        self.log.push(sql.to_string());
        self.inner.execute(sql)
    }

    fn table_columns(&mut self, table: &str) -> Result<Vec<String>, StoreError> {
        self.inner.table_columns(table)
    }

    fn fetch_table(&mut self, table: &str) -> Result<Frame, StoreError> {
        self.inner.fetch_table(table)
    }
}
