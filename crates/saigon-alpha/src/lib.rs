#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/saigon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod rank;
pub mod returns;
pub mod volatility;

pub use error::{AlphaError, Result};
pub use rank::rank_cross_sectional;
pub use returns::compute_returns;
pub use volatility::compute_volatility;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
