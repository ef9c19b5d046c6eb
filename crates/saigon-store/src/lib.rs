#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/saigon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod records;
pub mod schema;
pub mod store;

pub use error::{Result, StoreError};
pub use records::{
    AlphaFactorRow, BalanceRow, CashflowRow, DailyBar, IncomeRow, RangeFilter, RatiosRow,
    StatementKind, SymbolRecord,
};
pub use store::{Store, StoreStats};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
