//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite database error. Fatal: the store could not be
    /// reached or the statement could not be executed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Polars error while materializing a query result.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A projected column name is not part of the table's schema.
    #[error("Unknown column `{column}` for table `{table}`")]
    UnknownColumn {
        /// Requested column name.
        column: String,
        /// Table the projection targeted.
        table: &'static str,
    },

    /// Value stored in the database could not be parsed back.
    #[error("Data parsing error: {0}")]
    Parse(String),
}
