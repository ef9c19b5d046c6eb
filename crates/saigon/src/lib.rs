#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/saigon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export main types from sub-crates
pub use saigon_alpha as alpha;
pub use saigon_ingest as ingest;
pub use saigon_panel as panel;
pub use saigon_store as store;

// Re-export the common entry points
pub use saigon_alpha::{compute_returns, compute_volatility, rank_cross_sectional};
pub use saigon_ingest::{ImportSummary, Importer, Source, TableKind};
pub use saigon_panel::{get_merged_data, get_price_matrix, get_price_panel};
pub use saigon_store::{RangeFilter, StatementKind, Store};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
