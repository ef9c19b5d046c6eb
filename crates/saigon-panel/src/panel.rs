//! Long-format price panels.

use crate::error::Result;
use polars::prelude::*;
use saigon_store::{RangeFilter, Store};

/// Read a price panel: one row per `(date, symbol)` present in the
/// store, projected to `columns`, sorted by `(date, symbol)`.
///
/// Thin orchestration over [`Store::query_range`]; uniqueness of the
/// `(date, symbol)` pairs is guaranteed by the store's key invariant.
/// A filter matching nothing yields an empty frame, never an error.
pub fn get_price_panel(store: &Store, filter: &RangeFilter, columns: &[&str]) -> Result<DataFrame> {
    Ok(store.query_range(filter, columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use saigon_store::DailyBar;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bar(symbol: &str, d: NaiveDate, close: f64) -> DailyBar {
        DailyBar {
            close: Some(close),
            volume: Some(500),
            ..DailyBar::new(symbol, d)
        }
    }

    #[test]
    fn test_panel_sorted_by_date_then_symbol() {
        let store = Store::in_memory().unwrap();
        store
            .upsert_daily(&[
                bar("VNM", date(2024, 1, 3), 70.0),
                bar("ACB", date(2024, 1, 2), 25.0),
                bar("VNM", date(2024, 1, 2), 69.0),
            ])
            .unwrap();

        let panel = get_price_panel(&store, &RangeFilter::all(), &["close", "volume"]).unwrap();
        assert_eq!(panel.height(), 3);

        let symbols = panel.column("symbol").unwrap().str().unwrap();
        assert_eq!(symbols.get(0), Some("ACB"));
        assert_eq!(symbols.get(1), Some("VNM"));
        assert_eq!(symbols.get(2), Some("VNM"));
    }

    #[test]
    fn test_panel_empty_filter_match() {
        let store = Store::in_memory().unwrap();
        let panel = get_price_panel(
            &store,
            &RangeFilter::all().with_symbols(["XYZ"]),
            &["close"],
        )
        .unwrap();
        assert_eq!(panel.height(), 0);
        assert_eq!(panel.get_column_names_str(), vec!["symbol", "date", "close"]);
    }
}
