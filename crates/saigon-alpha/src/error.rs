//! Error types for factor computations.

use thiserror::Error;

/// Result type for factor computations.
pub type Result<T> = std::result::Result<T, AlphaError>;

/// Errors that can occur during ranking or factor computation.
#[derive(Debug, Error)]
pub enum AlphaError {
    /// Polars error during a window or join operation.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Reshape error from the panel layer.
    #[error("Panel error: {0}")]
    Panel(#[from] saigon_panel::PanelError),

    /// The input frame is missing a required column.
    #[error("Missing column `{column}` in input frame")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },
}
