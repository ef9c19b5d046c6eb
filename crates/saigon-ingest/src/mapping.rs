//! Closed enumeration of (source, table kind) field mappings.
//!
//! Each mapping is a compile-time table of `(source field, canonical
//! field)` pairs. Source fields not listed are dropped; canonical
//! fields not covered stay null. An unsupported (source, kind) pair
//! fails fast instead of silently dropping every column.

use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};

/// External data source a record batch originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// cafef.vn price history pages/API.
    Cafef,
    /// TCBS fundamental statement API.
    Tcbs,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cafef => f.write_str("cafef"),
            Self::Tcbs => f.write_str("tcbs"),
        }
    }
}

/// Kind of table a record batch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    /// Daily OHLCV price history.
    DailyPrices,
    /// Company overview (symbol master attributes).
    Overview,
    /// Quarterly financial ratios.
    Ratios,
    /// Quarterly income statement.
    Income,
    /// Quarterly balance sheet.
    BalanceSheet,
    /// Quarterly cash flow statement.
    CashFlow,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DailyPrices => f.write_str("daily_prices"),
            Self::Overview => f.write_str("overview"),
            Self::Ratios => f.write_str("ratios"),
            Self::Income => f.write_str("income"),
            Self::BalanceSheet => f.write_str("balance_sheet"),
            Self::CashFlow => f.write_str("cashflow"),
        }
    }
}

/// A `(source field, canonical field)` mapping table.
pub type FieldMap = &'static [(&'static str, &'static str)];

/// Daily price history from cafef. The raw API uses Vietnamese field
/// names; files re-exported by the crawler already carry canonical
/// names, so both spellings are accepted.
const CAFEF_DAILY: FieldMap = &[
    ("Ngay", "date"),
    ("GiaMoCua", "open"),
    ("GiaCaoNhat", "high"),
    ("GiaThapNhat", "low"),
    ("GiaDongCua", "close"),
    ("GiaDieuChinh", "adj_close"),
    ("KhoiLuongKhopLenh", "volume"),
    ("GiaTriKhopLenh", "value"),
    ("KLThoaThuan", "deal_volume"),
    ("GtThoaThuan", "deal_value"),
    ("ThayDoi", "change"),
    ("date", "date"),
    ("open", "open"),
    ("high", "high"),
    ("low", "low"),
    ("close", "close"),
    ("adj_close", "adj_close"),
    ("volume", "volume"),
    ("value", "value"),
    ("deal_volume", "deal_volume"),
    ("deal_value", "deal_value"),
    ("change", "change"),
];

const TCBS_OVERVIEW: FieldMap = &[
    ("shortName", "name"),
    ("exchange", "exchange"),
    ("industry", "industry"),
    ("industryEn", "industry_en"),
    ("noEmployees", "no_employees"),
    ("foreignPercent", "foreign_percent"),
    ("outstandingShare", "outstanding_shares"),
];

const TCBS_RATIOS: FieldMap = &[
    ("year", "year"),
    ("quarter", "quarter"),
    ("priceToEarning", "pe"),
    ("priceToBook", "pb"),
    ("valueBeforeEbitda", "ev_ebitda"),
    ("roe", "roe"),
    ("roa", "roa"),
    ("grossProfitMargin", "gross_margin"),
    ("operatingProfitMargin", "operating_margin"),
    ("postTaxMargin", "net_margin"),
    ("earningPerShare", "eps"),
    ("bookValuePerShare", "bvps"),
    ("dividend", "dividend"),
    ("epsChange", "eps_growth_yoy"),
    ("daysReceivable", "days_receivable"),
    ("daysInventory", "days_inventory"),
    ("daysPayable", "days_payable"),
    ("cashCirculation", "cash_cycle"),
    ("debtOnEquity", "debt_to_equity"),
    ("debtOnAsset", "debt_to_assets"),
    ("currentPayment", "current_ratio"),
    ("quickPayment", "quick_ratio"),
    ("ebitOnInterest", "interest_coverage"),
    ("revenueOnAsset", "asset_turnover"),
];

const TCBS_INCOME: FieldMap = &[
    ("year", "year"),
    ("quarter", "quarter"),
    ("revenue", "revenue"),
    ("costOfGoodSold", "cost_of_goods"),
    ("grossProfit", "gross_profit"),
    ("operationExpense", "operating_expense"),
    ("operationProfit", "operating_profit"),
    ("interestExpense", "interest_expense"),
    ("preTaxProfit", "pretax_profit"),
    ("postTaxProfit", "net_profit"),
    ("shareHolderIncome", "shareholder_income"),
    ("ebitda", "ebitda"),
    ("yearRevenueGrowth", "revenue_growth_yoy"),
    ("quarterRevenueGrowth", "revenue_growth_qoq"),
    ("yearShareHolderIncomeGrowth", "profit_growth_yoy"),
    ("quarterShareHolderIncomeGrowth", "profit_growth_qoq"),
];

const TCBS_BALANCE: FieldMap = &[
    ("year", "year"),
    ("quarter", "quarter"),
    ("asset", "total_assets"),
    ("shortAsset", "current_assets"),
    ("cash", "cash"),
    ("shortInvest", "short_term_investments"),
    ("shortReceivable", "receivables"),
    ("inventory", "inventory"),
    ("fixedAsset", "fixed_assets"),
    ("debt", "total_liabilities"),
    ("shortDebt", "short_term_debt"),
    ("longDebt", "long_term_debt"),
    ("equity", "total_equity"),
    ("unDistributedIncome", "retained_earnings"),
];

// "investCost" and "fromInvest" both feed cfi; the first non-null wins.
const TCBS_CASHFLOW: FieldMap = &[
    ("year", "year"),
    ("quarter", "quarter"),
    ("fromSale", "cfo"),
    ("fromInvest", "cfi"),
    ("investCost", "cfi"),
    ("fromFinancial", "cff"),
    ("freeCashFlow", "fcf"),
];

/// Look up the field mapping for a (source, table kind) pair.
///
/// # Errors
///
/// `ImportError::UnsupportedTable` if the pair is not part of the closed
/// enumeration.
pub fn field_map(source: Source, kind: TableKind) -> Result<FieldMap> {
    match (source, kind) {
        (Source::Cafef, TableKind::DailyPrices) => Ok(CAFEF_DAILY),
        (Source::Tcbs, TableKind::Overview) => Ok(TCBS_OVERVIEW),
        (Source::Tcbs, TableKind::Ratios) => Ok(TCBS_RATIOS),
        (Source::Tcbs, TableKind::Income) => Ok(TCBS_INCOME),
        (Source::Tcbs, TableKind::BalanceSheet) => Ok(TCBS_BALANCE),
        (Source::Tcbs, TableKind::CashFlow) => Ok(TCBS_CASHFLOW),
        (source, kind) => Err(ImportError::UnsupportedTable { source, kind }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_pairs() {
        assert!(field_map(Source::Cafef, TableKind::DailyPrices).is_ok());
        assert!(field_map(Source::Tcbs, TableKind::Ratios).is_ok());
        assert!(field_map(Source::Tcbs, TableKind::CashFlow).is_ok());
    }

    #[test]
    fn test_unsupported_pair_fails_fast() {
        let err = field_map(Source::Cafef, TableKind::Ratios).unwrap_err();
        assert!(matches!(
            err,
            ImportError::UnsupportedTable {
                source: Source::Cafef,
                kind: TableKind::Ratios,
            }
        ));
    }

    #[test]
    fn test_statement_maps_carry_period_keys() {
        for kind in [
            TableKind::Ratios,
            TableKind::Income,
            TableKind::BalanceSheet,
            TableKind::CashFlow,
        ] {
            let map = field_map(Source::Tcbs, kind).unwrap();
            assert!(map.iter().any(|(_, canon)| *canon == "year"));
            assert!(map.iter().any(|(_, canon)| *canon == "quarter"));
        }
    }
}
