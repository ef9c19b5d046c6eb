//! Error types for panel operations.

use thiserror::Error;

/// Result type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;

/// Errors that can occur while building panel views.
#[derive(Debug, Error)]
pub enum PanelError {
    /// The underlying store failed.
    #[error("Store error: {0}")]
    Store(#[from] saigon_store::StoreError),

    /// Polars error during a reshape or join.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
