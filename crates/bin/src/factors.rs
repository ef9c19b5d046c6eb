//! Precomputed factor cache job.
//!
//! Builds the close-price matrix, runs the momentum and volatility
//! helpers over it and writes the result into the `alpha_factors`
//! table.

use chrono::NaiveDate;
use polars::prelude::*;
use saigon::store::AlphaFactorRow;
use saigon::{RangeFilter, Store, compute_returns, compute_volatility, get_price_matrix};
use std::error::Error;

/// Momentum horizons in trading days: 1, 3, 6 and 12 months.
const MOMENTUM_PERIODS: [usize; 4] = [21, 63, 126, 252];

/// Volatility windows in trading days.
const VOLATILITY_WINDOWS: [usize; 2] = [20, 60];

/// Compute momentum and volatility factors for the filtered universe
/// and upsert them into the factor cache. Returns the number of rows
/// written.
pub(crate) fn build_factor_cache(
    store: &Store,
    filter: &RangeFilter,
) -> Result<usize, Box<dyn Error>> {
    let matrix = get_price_matrix(store, "close", filter)?;
    if matrix.height() == 0 {
        return Ok(0);
    }

    let momentum = compute_returns(&matrix, &MOMENTUM_PERIODS)?;
    let volatility = compute_volatility(&matrix, &VOLATILITY_WINDOWS)?;

    let joined = momentum
        .lazy()
        .join(
            volatility.lazy(),
            [col("date"), col("symbol")],
            [col("date"), col("symbol")],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    let dates = joined.column("date")?.cast(&DataType::Int32)?;
    let dates = dates.i32()?;
    let symbols = joined.column("symbol")?.str()?;
    let mom_1m = joined.column("ret_21d")?.f64()?;
    let mom_3m = joined.column("ret_63d")?.f64()?;
    let mom_6m = joined.column("ret_126d")?.f64()?;
    let mom_12m = joined.column("ret_252d")?.f64()?;
    let vol_20d = joined.column("vol_20d")?.f64()?;
    let vol_60d = joined.column("vol_60d")?.f64()?;

    let mut rows = Vec::with_capacity(joined.height());
    for i in 0..joined.height() {
        let (Some(days), Some(symbol)) = (dates.get(i), symbols.get(i)) else {
            continue;
        };
        rows.push(AlphaFactorRow {
            mom_1m: mom_1m.get(i),
            mom_3m: mom_3m.get(i),
            mom_6m: mom_6m.get(i),
            mom_12m: mom_12m.get(i),
            vol_20d: vol_20d.get(i),
            vol_60d: vol_60d.get(i),
            ..AlphaFactorRow::new(symbol, date_from_days(days))
        });
    }

    Ok(store.upsert_factors(&rows)?)
}

/// Days-since-epoch (the matrix date encoding) back to a calendar date.
fn date_from_days(days: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .map(|epoch| epoch + chrono::Duration::days(i64::from(days)))
        .unwrap_or_default()
}
