#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/saigon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod matrix;
pub mod merge;
pub mod panel;

pub use error::{PanelError, Result};
pub use matrix::{get_price_matrix, pivot_panel, stack_matrix};
pub use merge::get_merged_data;
pub use panel::get_price_panel;

// The filter type is shared with the store's range reads.
pub use saigon_store::RangeFilter;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
