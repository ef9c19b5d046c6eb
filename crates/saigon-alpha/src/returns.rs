//! Multi-horizon return computation over a price matrix.

use crate::error::Result;
use polars::prelude::*;
use saigon_panel::stack_matrix;

/// Compute `value[t] / value[t - p] - 1` per symbol for each requested
/// period.
///
/// Input is a date-by-symbol matrix; output is a long frame
/// `[date, symbol, ret_{p}d...]` sorted by `(date, symbol)`. The first
/// `p` rows of each symbol are null (insufficient history), as is any
/// horizon whose start or end value is missing.
pub fn compute_returns(matrix: &DataFrame, periods: &[usize]) -> Result<DataFrame> {
    let names: Vec<String> = periods.iter().map(|p| format!("ret_{p}d")).collect();
    if matrix.height() == 0 || matrix.width() <= 1 {
        return empty_long(&names);
    }

    let long = stack_matrix(matrix)?;

    let exprs: Vec<Expr> = periods
        .iter()
        .zip(&names)
        .map(|(p, name)| {
            (col("value") / col("value").shift(lit(*p as i64)).over([col("symbol")]) - lit(1.0))
                .alias(name.as_str())
        })
        .collect();

    let mut output = vec![col("date"), col("symbol")];
    output.extend(names.iter().map(|n| col(n.as_str())));

    let df = long
        .lazy()
        .sort(["symbol", "date"], SortMultipleOptions::default())
        .with_columns(exprs)
        .sort(["date", "symbol"], SortMultipleOptions::default())
        .select(output)
        .collect()?;
    Ok(df)
}

/// Empty long frame with the factor columns of the given names.
pub(crate) fn empty_long(names: &[String]) -> Result<DataFrame> {
    let mut columns: Vec<Column> = vec![
        Series::new_empty("date".into(), &DataType::Date).into(),
        Series::new_empty("symbol".into(), &DataType::String).into(),
    ];
    for name in names {
        columns.push(Series::new_empty(name.as_str().into(), &DataType::Float64).into());
    }
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(dates: &[i32], columns: &[(&str, &[Option<f64>])]) -> DataFrame {
        let mut out: Vec<Column> = vec![
            Series::new("date".into(), dates.to_vec())
                .cast(&DataType::Date)
                .unwrap()
                .into(),
        ];
        for (name, values) in columns {
            out.push(Series::new((*name).into(), values.to_vec()).into());
        }
        DataFrame::new(out).unwrap()
    }

    #[test]
    fn test_single_symbol_one_day_returns() {
        let m = matrix(
            &[0, 1, 2],
            &[("VIC", &[Some(100.0), Some(110.0), Some(121.0)])],
        );
        let returns = compute_returns(&m, &[1]).unwrap();

        assert_eq!(returns.height(), 3);
        let ret = returns.column("ret_1d").unwrap().f64().unwrap();
        assert_eq!(ret.get(0), None);
        assert_relative_eq!(ret.get(1).unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(ret.get(2).unwrap(), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_multiple_periods() {
        let m = matrix(
            &[0, 1, 2],
            &[("VIC", &[Some(100.0), Some(110.0), Some(121.0)])],
        );
        let returns = compute_returns(&m, &[1, 2]).unwrap();

        let ret2 = returns.column("ret_2d").unwrap().f64().unwrap();
        assert_eq!(ret2.get(0), None);
        assert_eq!(ret2.get(1), None);
        assert_relative_eq!(ret2.get(2).unwrap(), 0.21, epsilon = 1e-12);
    }

    #[test]
    fn test_multiple_symbols_stack_long() {
        let m = matrix(
            &[0, 1],
            &[
                ("VIC", &[Some(100.0), Some(105.0)]),
                ("VNM", &[Some(70.0), Some(63.0)]),
            ],
        );
        let returns = compute_returns(&m, &[1]).unwrap();

        assert_eq!(returns.height(), 4);
        assert_eq!(
            returns.get_column_names_str(),
            vec!["date", "symbol", "ret_1d"]
        );

        // Sorted by (date, symbol): VIC then VNM per date.
        let symbols = returns.column("symbol").unwrap().str().unwrap();
        let ret = returns.column("ret_1d").unwrap().f64().unwrap();
        assert_eq!(symbols.get(2), Some("VIC"));
        assert_relative_eq!(ret.get(2).unwrap(), 0.05, epsilon = 1e-12);
        assert_eq!(symbols.get(3), Some("VNM"));
        assert_relative_eq!(ret.get(3).unwrap(), -0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_shift_does_not_cross_symbols() {
        let m = matrix(
            &[0, 1],
            &[
                ("VIC", &[Some(100.0), Some(105.0)]),
                ("VNM", &[Some(70.0), Some(63.0)]),
            ],
        );
        let returns = compute_returns(&m, &[1]).unwrap();
        let ret = returns.column("ret_1d").unwrap().f64().unwrap();

        // First observation of each symbol has no history.
        assert_eq!(ret.get(0), None);
        assert_eq!(ret.get(1), None);
    }

    #[test]
    fn test_missing_cell_propagates_null() {
        let m = matrix(
            &[0, 1, 2],
            &[("VIC", &[Some(100.0), None, Some(121.0)])],
        );
        let returns = compute_returns(&m, &[1]).unwrap();
        let ret = returns.column("ret_1d").unwrap().f64().unwrap();
        assert_eq!(ret.get(1), None);
        assert_eq!(ret.get(2), None);
    }

    #[test]
    fn test_empty_matrix() {
        let m = matrix(&[], &[]);
        let returns = compute_returns(&m, &[1, 5]).unwrap();
        assert_eq!(returns.height(), 0);
        assert_eq!(
            returns.get_column_names_str(),
            vec!["date", "symbol", "ret_1d", "ret_5d"]
        );
    }
}
