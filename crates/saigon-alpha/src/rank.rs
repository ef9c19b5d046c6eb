//! Cross-sectional percentile ranks.

use crate::error::{AlphaError, Result};
use polars::prelude::*;

/// Rank values cross-sectionally: within each date group, each
/// requested column gets a percentile rank in (0, 1].
///
/// Ties receive the mean of the ranks they would occupy; percentiles
/// are scaled by the non-null group size, so a group of one ranks its
/// single member at 1.0. Nulls are excluded from ranking and stay null.
/// One `{column}_rank` column is added per input column; the originals
/// are retained unchanged.
pub fn rank_cross_sectional(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    require_column(df, "date")?;
    for column in columns {
        require_column(df, column)?;
    }

    let exprs: Vec<Expr> = columns
        .iter()
        .map(|column| {
            let options = RankOptions {
                method: RankMethod::Average,
                descending: false,
            };
            (col(*column).rank(options, None).cast(DataType::Float64)
                / col(*column).count().cast(DataType::Float64))
            .over([col("date")])
            .alias(format!("{column}_rank"))
        })
        .collect();

    Ok(df.clone().lazy().with_columns(exprs).collect()?)
}

fn require_column(df: &DataFrame, name: &str) -> Result<()> {
    if df.get_column_names_str().iter().any(|c| *c == name) {
        Ok(())
    } else {
        Err(AlphaError::MissingColumn {
            column: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(dates: &[i32], symbols: &[&str], values: &[Option<f64>]) -> DataFrame {
        DataFrame::new(vec![
            Series::new("date".into(), dates.to_vec())
                .cast(&DataType::Date)
                .unwrap()
                .into(),
            Series::new("symbol".into(), symbols.to_vec()).into(),
            Series::new("pe".into(), values.to_vec()).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_rank_distinct_values() {
        let df = frame(
            &[0, 0, 0, 0],
            &["A", "B", "C", "D"],
            &[Some(4.0), Some(1.0), Some(3.0), Some(2.0)],
        );
        let ranked = rank_cross_sectional(&df, &["pe"]).unwrap();

        let ranks = ranked.column("pe_rank").unwrap().f64().unwrap();
        assert_relative_eq!(ranks.get(0).unwrap(), 1.0);
        assert_relative_eq!(ranks.get(1).unwrap(), 0.25);
        assert_relative_eq!(ranks.get(2).unwrap(), 0.75);
        assert_relative_eq!(ranks.get(3).unwrap(), 0.5);

        // Originals retained unchanged.
        assert_eq!(ranked.column("pe").unwrap().f64().unwrap().get(1), Some(1.0));
    }

    #[test]
    fn test_rank_bounds() {
        let df = frame(
            &[0, 0, 0],
            &["A", "B", "C"],
            &[Some(10.0), Some(-5.0), Some(0.0)],
        );
        let ranked = rank_cross_sectional(&df, &["pe"]).unwrap();
        let ranks = ranked.column("pe_rank").unwrap().f64().unwrap();
        for rank in ranks.into_iter().flatten() {
            assert!(rank > 0.0 && rank <= 1.0);
        }
    }

    #[test]
    fn test_rank_average_ties() {
        let df = frame(
            &[0, 0, 0, 0],
            &["A", "B", "C", "D"],
            &[Some(1.0), Some(2.0), Some(2.0), Some(3.0)],
        );
        let ranked = rank_cross_sectional(&df, &["pe"]).unwrap();
        let ranks = ranked.column("pe_rank").unwrap().f64().unwrap();

        // The tied pair occupies ranks 2 and 3, averaged to 2.5.
        assert_relative_eq!(ranks.get(0).unwrap(), 0.25);
        assert_relative_eq!(ranks.get(1).unwrap(), 0.625);
        assert_relative_eq!(ranks.get(2).unwrap(), 0.625);
        assert_relative_eq!(ranks.get(3).unwrap(), 1.0);
    }

    #[test]
    fn test_rank_excludes_nulls() {
        let df = frame(
            &[0, 0, 0],
            &["A", "B", "C"],
            &[Some(1.0), None, Some(3.0)],
        );
        let ranked = rank_cross_sectional(&df, &["pe"]).unwrap();
        let ranks = ranked.column("pe_rank").unwrap().f64().unwrap();

        // Two non-null members: ranks scale by 2, the null stays null.
        assert_relative_eq!(ranks.get(0).unwrap(), 0.5);
        assert_eq!(ranks.get(1), None);
        assert_relative_eq!(ranks.get(2).unwrap(), 1.0);
    }

    #[test]
    fn test_rank_group_of_one() {
        let df = frame(&[0], &["A"], &[Some(42.0)]);
        let ranked = rank_cross_sectional(&df, &["pe"]).unwrap();
        assert_relative_eq!(
            ranked.column("pe_rank").unwrap().f64().unwrap().get(0).unwrap(),
            1.0
        );
    }

    #[test]
    fn test_rank_partitions_by_date() {
        let df = frame(
            &[0, 0, 1, 1],
            &["A", "B", "A", "B"],
            &[Some(1.0), Some(2.0), Some(2.0), Some(1.0)],
        );
        let ranked = rank_cross_sectional(&df, &["pe"]).unwrap();
        let ranks = ranked.column("pe_rank").unwrap().f64().unwrap();

        assert_relative_eq!(ranks.get(0).unwrap(), 0.5);
        assert_relative_eq!(ranks.get(1).unwrap(), 1.0);
        assert_relative_eq!(ranks.get(2).unwrap(), 1.0);
        assert_relative_eq!(ranks.get(3).unwrap(), 0.5);
    }

    #[test]
    fn test_rank_missing_column() {
        let df = frame(&[0], &["A"], &[Some(1.0)]);
        let err = rank_cross_sectional(&df, &["pb"]).unwrap_err();
        assert!(matches!(err, AlphaError::MissingColumn { .. }));
    }

    #[test]
    fn test_rank_empty_frame() {
        let df = frame(&[], &[], &[]);
        let ranked = rank_cross_sectional(&df, &["pe"]).unwrap();
        assert_eq!(ranked.height(), 0);
        assert!(
            ranked
                .get_column_names_str()
                .contains(&"pe_rank")
        );
    }
}
