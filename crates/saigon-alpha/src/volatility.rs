//! Rolling annualized volatility over a price matrix.

use crate::error::Result;
use crate::returns::empty_long;
use polars::prelude::*;
use saigon_panel::stack_matrix;

/// Trading days per year used for annualization.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Compute rolling annualized volatility per symbol for each requested
/// window.
///
/// Single-period returns are computed first; each window `w` is the
/// rolling sample standard deviation over `w` returns, multiplied by
/// sqrt(252). Output is a long frame `[date, symbol, vol_{w}d...]`
/// sorted by `(date, symbol)`; rows without a full window of returns
/// are null.
pub fn compute_volatility(matrix: &DataFrame, windows: &[usize]) -> Result<DataFrame> {
    let names: Vec<String> = windows.iter().map(|w| format!("vol_{w}d")).collect();
    if matrix.height() == 0 || matrix.width() <= 1 {
        return empty_long(&names);
    }

    let long = stack_matrix(matrix)?;

    let exprs: Vec<Expr> = windows
        .iter()
        .zip(&names)
        .map(|(w, name)| {
            (col("ret")
                .rolling_std(RollingOptionsFixedWindow {
                    window_size: *w,
                    min_periods: *w,
                    ..Default::default()
                })
                .over([col("symbol")])
                * lit(TRADING_DAYS_PER_YEAR.sqrt()))
            .alias(name.as_str())
        })
        .collect();

    let mut output = vec![col("date"), col("symbol")];
    output.extend(names.iter().map(|n| col(n.as_str())));

    let df = long
        .lazy()
        .sort(["symbol", "date"], SortMultipleOptions::default())
        .with_column(
            (col("value") / col("value").shift(lit(1)).over([col("symbol")]) - lit(1.0))
                .alias("ret"),
        )
        .with_columns(exprs)
        .sort(["date", "symbol"], SortMultipleOptions::default())
        .select(output)
        .collect()?;
    Ok(df)
}
