//! Wide date-by-symbol matrices.

use crate::error::Result;
use polars::prelude::*;
use saigon_store::{RangeFilter, Store};
use std::collections::HashMap;

/// Read one price column as a dense matrix: rows are the distinct dates
/// present (ascending), columns the distinct symbols present
/// (lexicographic), missing `(date, symbol)` combinations null.
pub fn get_price_matrix(store: &Store, column: &str, filter: &RangeFilter) -> Result<DataFrame> {
    let panel = store.query_range(filter, &[column])?;
    pivot_panel(&panel, column)
}

/// Pivot a long panel into a date-by-symbol matrix.
///
/// Pure function of the panel: every distinct date and symbol present
/// becomes a row/column, nothing is filtered. Later duplicates of a
/// `(date, symbol)` pair would win, but the store's key invariant rules
/// them out.
pub fn pivot_panel(panel: &DataFrame, value_column: &str) -> Result<DataFrame> {
    if panel.height() == 0 {
        return Ok(DataFrame::new(vec![
            Series::new_empty("date".into(), &DataType::Date).into(),
        ])?);
    }

    let dates = panel.column("date")?.cast(&DataType::Int32)?;
    let dates = dates.i32()?;
    let symbols = panel.column("symbol")?.str()?;
    let values = panel.column(value_column)?.f64()?;

    let mut date_keys: Vec<i32> = dates.into_iter().flatten().collect();
    date_keys.sort_unstable();
    date_keys.dedup();
    let mut symbol_keys: Vec<&str> = symbols.into_iter().flatten().collect();
    symbol_keys.sort_unstable();
    symbol_keys.dedup();

    let date_index: HashMap<i32, usize> = date_keys
        .iter()
        .enumerate()
        .map(|(i, d)| (*d, i))
        .collect();
    let symbol_index: HashMap<&str, usize> = symbol_keys
        .iter()
        .enumerate()
        .map(|(i, s)| (*s, i))
        .collect();

    let mut grid: Vec<Vec<Option<f64>>> = vec![vec![None; date_keys.len()]; symbol_keys.len()];
    for i in 0..panel.height() {
        let (Some(date), Some(symbol)) = (dates.get(i), symbols.get(i)) else {
            continue;
        };
        grid[symbol_index[symbol]][date_index[&date]] = values.get(i);
    }

    let mut out: Vec<Column> = Vec::with_capacity(1 + symbol_keys.len());
    out.push(
        Series::new("date".into(), date_keys)
            .cast(&DataType::Date)?
            .into(),
    );
    for (symbol, cells) in symbol_keys.iter().zip(grid) {
        out.push(Series::new((*symbol).into(), cells).into());
    }
    Ok(DataFrame::new(out)?)
}

/// Inverse reshape: wide matrix back to a long `[date, symbol, value]`
/// frame, symbol-major with dates ascending within each symbol.
pub fn stack_matrix(matrix: &DataFrame) -> Result<DataFrame> {
    let height = matrix.height();
    let dates = matrix.column("date")?.cast(&DataType::Int32)?;
    let dates = dates.i32()?;

    let mut long_dates: Vec<i32> = Vec::new();
    let mut long_symbols: Vec<&str> = Vec::new();
    let mut long_values: Vec<Option<f64>> = Vec::new();
    for column in matrix.get_columns() {
        if column.name() == "date" {
            continue;
        }
        let values = column.f64()?;
        for i in 0..height {
            let Some(date) = dates.get(i) else { continue };
            long_dates.push(date);
            long_symbols.push(column.name().as_str());
            long_values.push(values.get(i));
        }
    }

    let df = DataFrame::new(vec![
        Series::new("date".into(), long_dates)
            .cast(&DataType::Date)?
            .into(),
        Series::new("symbol".into(), long_symbols).into(),
        Series::new("value".into(), long_values).into(),
    ])?;
    Ok(df)
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
            ..DailyBar::new(symbol, d)
        }
    }

    fn sample_store() -> Store {
        let store = Store::in_memory().unwrap();
        store
            .upsert_daily(&[
                bar("VIC", date(2024, 1, 2), 100.0),
                bar("VIC", date(2024, 1, 3), 101.0),
                bar("VNM", date(2024, 1, 2), 70.0),
                // VNM missing on 2024-01-03
                bar("VNM", date(2024, 1, 4), 71.0),
                bar("VIC", date(2024, 1, 4), 102.0),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_matrix_shape_and_missing_markers() {
        let store = sample_store();
        let matrix = get_price_matrix(&store, "close", &RangeFilter::all()).unwrap();

        // 3 distinct dates, 2 distinct symbols.
        assert_eq!(matrix.height(), 3);
        assert_eq!(matrix.get_column_names_str(), vec!["date", "VIC", "VNM"]);

        let vic = matrix.column("VIC").unwrap().f64().unwrap();
        let vnm = matrix.column("VNM").unwrap().f64().unwrap();
        assert_eq!(vic.get(0), Some(100.0));
        assert_eq!(vic.get(1), Some(101.0));
        assert_eq!(vic.get(2), Some(102.0));
        assert_eq!(vnm.get(0), Some(70.0));
        assert_eq!(vnm.get(1), None);
        assert_eq!(vnm.get(2), Some(71.0));
    }

    #[test]
    fn test_matrix_empty_panel() {
        let store = Store::in_memory().unwrap();
        let matrix = get_price_matrix(&store, "close", &RangeFilter::all()).unwrap();
        assert_eq!(matrix.height(), 0);
        assert_eq!(matrix.get_column_names_str(), vec!["date"]);
    }

    #[test]
    fn test_matrix_symbol_filter() {
        let store = sample_store();
        let matrix = get_price_matrix(
            &store,
            "close",
            &RangeFilter::all().with_symbols(["VIC"]),
        )
        .unwrap();
        assert_eq!(matrix.get_column_names_str(), vec!["date", "VIC"]);
        assert_eq!(matrix.height(), 3);
    }

    #[test]
    fn test_stack_matrix_roundtrip() {
        let store = sample_store();
        let matrix = get_price_matrix(&store, "close", &RangeFilter::all()).unwrap();
        let long = stack_matrix(&matrix).unwrap();

        // 3 dates x 2 symbols, including the explicit missing cell.
        assert_eq!(long.height(), 6);
        assert_eq!(long.get_column_names_str(), vec!["date", "symbol", "value"]);

        let symbols = long.column("symbol").unwrap().str().unwrap();
        let values = long.column("value").unwrap().f64().unwrap();
        assert_eq!(symbols.get(0), Some("VIC"));
        assert_eq!(values.get(0), Some(100.0));
        assert_eq!(symbols.get(4), Some("VNM"));
        assert_eq!(values.get(4), None);
    }
}
