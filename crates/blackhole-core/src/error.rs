//! Error taxonomy for configuration, connection, and query failures.
//!
//! Connection-level failures are classified separately from statement
//! failures because they arm the reconnect path; everything else is
//! surfaced as-is and left to the caller's policy (fatal at startup,
//! best-effort on the visit path).

use std::fmt;

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for database operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Environment configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection could not be established or was lost mid-operation.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement failed after a connection was established.
    #[error("Query error: {0}")]
    Query(String),
}

impl CoreError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a connection-level error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a query-level error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// True when the error means the link to the server is gone and a
    /// reconnect probe should be armed.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(err.to_string()),
            sqlx::Error::Configuration(_) => Self::Config(err.to_string()),
            _ => Self::Query(err.to_string()),
        }
    }
}

/// A single table whose creation sequence failed.
///
/// Statement indices are zero-based positions in the registry's ordered
/// list. Statements before the failing index were already executed and
/// stay applied; there is no rollback.
#[derive(Debug)]
pub struct TableFailure {
    /// Table whose creation sequence failed.
    pub table: String,
    /// Position of the failing statement in the table's ordered list.
    pub statement_index: usize,
    /// The underlying failure.
    pub source: CoreError,
}

impl fmt::Display for TableFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: statement {} failed, earlier statements remain applied: {}",
            self.table, self.statement_index, self.source
        )
    }
}

fn summarize_failures(failures: &[TableFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Aggregate result of a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// The existing-table lookup failed before any DDL ran.
    #[error("Schema introspection failed: {0}")]
    Introspection(#[source] CoreError),

    /// One or more tables failed to provision; tables not listed here
    /// were created successfully.
    #[error("Schema provisioning failed: {}", summarize_failures(.0))]
    Creation(Vec<TableFailure>),
}
