//! Error types for import operations.

use crate::mapping::{Source, TableKind};
use thiserror::Error;

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Errors that can occur during an import.
///
/// Per-row problems (bad dates, bad numbers, missing keys) are handled
/// inside the importer and reported through skip counts, never as
/// errors; only these batch-level failures surface.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The store could not be written to.
    #[error("Store error: {0}")]
    Store(#[from] saigon_store::StoreError),

    /// No field mapping exists for this (source, table kind) pair.
    #[error("No field mapping for source `{source}` and table kind `{kind}`")]
    UnsupportedTable {
        /// Source the records came from.
        source: Source,
        /// Table kind requested.
        kind: TableKind,
    },
}
