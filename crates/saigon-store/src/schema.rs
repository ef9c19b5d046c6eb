//! SQLite schema and the closed column enumerations used to validate
//! query projections.
//!
//! Column lists are the single source of truth: the `CREATE TABLE`
//! statements, the upsert bindings and the projection validation all
//! agree by construction.

use crate::error::Result;
use crate::records::StatementKind;
use rusqlite::Connection;

/// Projectable value columns of `daily_prices` (key columns excluded).
pub const DAILY_COLUMNS: &[&str] = &[
    "open",
    "high",
    "low",
    "close",
    "adj_close",
    "volume",
    "value",
    "deal_volume",
    "deal_value",
    "change_pct",
    "returns",
    "volatility_20d",
    "avg_volume_20d",
];

/// Projectable value columns of `fundamentals_quarterly`.
pub const RATIO_COLUMNS: &[&str] = &[
    "pe",
    "pb",
    "ps",
    "ev_ebitda",
    "roe",
    "roa",
    "gross_margin",
    "operating_margin",
    "net_margin",
    "eps",
    "bvps",
    "dividend",
    "revenue_growth_yoy",
    "eps_growth_yoy",
    "asset_turnover",
    "days_receivable",
    "days_inventory",
    "days_payable",
    "cash_cycle",
    "debt_to_equity",
    "debt_to_assets",
    "current_ratio",
    "quick_ratio",
    "interest_coverage",
    "accruals",
    "earnings_quality",
];

/// Projectable value columns of `income_statement`.
pub const INCOME_COLUMNS: &[&str] = &[
    "revenue",
    "cost_of_goods",
    "gross_profit",
    "operating_expense",
    "operating_profit",
    "interest_expense",
    "pretax_profit",
    "tax",
    "net_profit",
    "shareholder_income",
    "ebitda",
    "revenue_growth_yoy",
    "revenue_growth_qoq",
    "profit_growth_yoy",
    "profit_growth_qoq",
];

/// Projectable value columns of `balance_sheet`.
pub const BALANCE_COLUMNS: &[&str] = &[
    "total_assets",
    "current_assets",
    "cash",
    "short_term_investments",
    "receivables",
    "inventory",
    "fixed_assets",
    "total_liabilities",
    "current_liabilities",
    "short_term_debt",
    "long_term_debt",
    "total_debt",
    "total_equity",
    "retained_earnings",
];

/// Projectable value columns of `cashflow`.
pub const CASHFLOW_COLUMNS: &[&str] = &[
    "cfo",
    "cfi",
    "cff",
    "net_cash_change",
    "capex",
    "fcf",
    "dividends_paid",
];

/// Projectable value columns of `alpha_factors`.
pub const FACTOR_COLUMNS: &[&str] = &[
    "mom_1m", "mom_3m", "mom_6m", "mom_12m", "vol_20d", "vol_60d",
];

/// Value columns for a statement kind.
pub const fn statement_columns(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::Ratios => RATIO_COLUMNS,
        StatementKind::Income => INCOME_COLUMNS,
        StatementKind::BalanceSheet => BALANCE_COLUMNS,
        StatementKind::CashFlow => CASHFLOW_COLUMNS,
    }
}

/// Initialize the database schema.
///
/// Idempotent: every table and index is created `IF NOT EXISTS`.
pub(crate) fn initialize(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS symbols (
            symbol TEXT PRIMARY KEY,
            name TEXT,
            exchange TEXT,
            industry TEXT,
            industry_en TEXT,
            no_employees INTEGER,
            foreign_percent REAL,
            outstanding_shares REAL,
            listed_date TEXT,
            updated_at TEXT DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS daily_prices (
            symbol TEXT NOT NULL,
            date TEXT NOT NULL,
            open REAL,
            high REAL,
            low REAL,
            close REAL,
            adj_close REAL,
            volume INTEGER,
            value REAL,
            deal_volume INTEGER,
            deal_value REAL,
            change_pct REAL,

            returns REAL,
            volatility_20d REAL,
            avg_volume_20d REAL,

            PRIMARY KEY (symbol, date),
            FOREIGN KEY (symbol) REFERENCES symbols(symbol)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_prices_date ON daily_prices(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_prices_date_symbol ON daily_prices(date, symbol)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS fundamentals_quarterly (
            symbol TEXT NOT NULL,
            year INTEGER NOT NULL,
            quarter INTEGER NOT NULL,
            report_date TEXT,

            pe REAL,
            pb REAL,
            ps REAL,
            ev_ebitda REAL,

            roe REAL,
            roa REAL,
            gross_margin REAL,
            operating_margin REAL,
            net_margin REAL,

            eps REAL,
            bvps REAL,
            dividend REAL,

            revenue_growth_yoy REAL,
            eps_growth_yoy REAL,

            asset_turnover REAL,
            days_receivable REAL,
            days_inventory REAL,
            days_payable REAL,
            cash_cycle REAL,

            debt_to_equity REAL,
            debt_to_assets REAL,
            current_ratio REAL,
            quick_ratio REAL,
            interest_coverage REAL,

            accruals REAL,
            earnings_quality REAL,

            updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (symbol, year, quarter),
            FOREIGN KEY (symbol) REFERENCES symbols(symbol)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_fund_period ON fundamentals_quarterly(year, quarter)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS income_statement (
            symbol TEXT NOT NULL,
            year INTEGER NOT NULL,
            quarter INTEGER NOT NULL,

            revenue REAL,
            cost_of_goods REAL,
            gross_profit REAL,
            operating_expense REAL,
            operating_profit REAL,
            interest_expense REAL,
            pretax_profit REAL,
            tax REAL,
            net_profit REAL,
            shareholder_income REAL,
            ebitda REAL,

            revenue_growth_yoy REAL,
            revenue_growth_qoq REAL,
            profit_growth_yoy REAL,
            profit_growth_qoq REAL,

            updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (symbol, year, quarter),
            FOREIGN KEY (symbol) REFERENCES symbols(symbol)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS balance_sheet (
            symbol TEXT NOT NULL,
            year INTEGER NOT NULL,
            quarter INTEGER NOT NULL,

            total_assets REAL,
            current_assets REAL,
            cash REAL,
            short_term_investments REAL,
            receivables REAL,
            inventory REAL,
            fixed_assets REAL,

            total_liabilities REAL,
            current_liabilities REAL,
            short_term_debt REAL,
            long_term_debt REAL,
            total_debt REAL,

            total_equity REAL,
            retained_earnings REAL,

            updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (symbol, year, quarter),
            FOREIGN KEY (symbol) REFERENCES symbols(symbol)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cashflow (
            symbol TEXT NOT NULL,
            year INTEGER NOT NULL,
            quarter INTEGER NOT NULL,

            cfo REAL,
            cfi REAL,
            cff REAL,
            net_cash_change REAL,
            capex REAL,
            fcf REAL,
            dividends_paid REAL,

            updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (symbol, year, quarter),
            FOREIGN KEY (symbol) REFERENCES symbols(symbol)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS alpha_factors (
            symbol TEXT NOT NULL,
            date TEXT NOT NULL,

            mom_1m REAL,
            mom_3m REAL,
            mom_6m REAL,
            mom_12m REAL,
            vol_20d REAL,
            vol_60d REAL,

            updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (symbol, date),
            FOREIGN KEY (symbol) REFERENCES symbols(symbol)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_alpha_date ON alpha_factors(date)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_columns_are_distinct() {
        for cols in [RATIO_COLUMNS, INCOME_COLUMNS, BALANCE_COLUMNS, CASHFLOW_COLUMNS] {
            let mut sorted: Vec<_> = cols.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), cols.len());
        }
    }

    #[test]
    fn test_statement_columns_lookup() {
        assert_eq!(statement_columns(StatementKind::Ratios), RATIO_COLUMNS);
        assert_eq!(statement_columns(StatementKind::CashFlow), CASHFLOW_COLUMNS);
    }
}
