//! Point-in-time merge of price panels with quarterly fundamentals.

use crate::error::Result;
use polars::prelude::*;
use saigon_store::{RangeFilter, StatementKind, Store};

/// Join a price panel to the most recent available quarterly ratio
/// values per symbol.
///
/// Each price row is matched to the fundamental row sharing its calendar
/// `(year, quarter)`; rows whose quarter has no fundamental carry the
/// last known prior values forward, per symbol and per column, in date
/// order. A fundamental never leaks backward: no row receives values
/// from a later quarter than its own.
///
/// Matching is on the calendar quarter, not the report release date, so
/// a quarter's figures are treated as known throughout the quarter
/// itself. Downstream consumers that need report-date gating should
/// treat this as an optimistic view; `report_date` is persisted for that
/// purpose.
pub fn get_merged_data(
    store: &Store,
    filter: &RangeFilter,
    price_columns: &[&str],
    fundamental_columns: &[&str],
) -> Result<DataFrame> {
    let panel = store.query_range(filter, price_columns)?;
    if panel.height() == 0 {
        return Ok(panel);
    }

    let fundamentals = store.query_fundamentals(
        StatementKind::Ratios,
        filter.symbols.as_deref(),
        None,
        Some(fundamental_columns),
    )?;
    if fundamentals.height() == 0 {
        return Ok(panel);
    }

    let mut output_columns = vec![col("symbol"), col("date")];
    output_columns.extend(price_columns.iter().map(|c| col(*c)));
    output_columns.extend(fundamental_columns.iter().map(|c| col(*c)));

    let filled: Vec<Expr> = fundamental_columns
        .iter()
        .map(|c| col(*c).forward_fill(None).over([col("symbol")]))
        .collect();

    let merged = panel
        .lazy()
        .with_columns([
            col("date").dt().year().cast(DataType::Int32).alias("year"),
            col("date")
                .dt()
                .quarter()
                .cast(DataType::Int32)
                .alias("quarter"),
        ])
        .join(
            fundamentals.lazy(),
            [col("symbol"), col("year"), col("quarter")],
            [col("symbol"), col("year"), col("quarter")],
            JoinArgs::new(JoinType::Left),
        )
        .sort(["symbol", "date"], SortMultipleOptions::default())
        .with_columns(filled)
        .sort(["date", "symbol"], SortMultipleOptions::default())
        .select(output_columns)
        .collect()?;

    Ok(merged)
}
