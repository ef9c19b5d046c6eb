//! Typed records for every persisted table.
//!
//! One struct per table kind, with explicit `Option` fields for every
//! nullable metric. Replaces the schema-less row maps the external data
//! sources deliver: the importer parses into these types and the store
//! binds them positionally.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Statement kind for quarterly fundamental data.
///
/// All four kinds share the `(symbol, year, quarter)` keying discipline,
/// with quarter `5` reserved for annual/TTM rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    /// Key financial ratios (valuation, profitability, leverage).
    Ratios,
    /// Income statement line items.
    Income,
    /// Balance sheet line items.
    BalanceSheet,
    /// Cash flow statement line items.
    CashFlow,
}

impl StatementKind {
    /// Name of the SQLite table backing this statement kind.
    pub const fn table_name(&self) -> &'static str {
        match self {
            Self::Ratios => "fundamentals_quarterly",
            Self::Income => "income_statement",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlow => "cashflow",
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Symbol/date/year filters shared by the range-read operations.
///
/// Absent filters mean "all": `RangeFilter::default()` selects the whole
/// table.
#[derive(Debug, Clone, Default)]
pub struct RangeFilter {
    /// Restrict to these symbols (None = all symbols).
    pub symbols: Option<Vec<String>>,
    /// Inclusive start date.
    pub start: Option<NaiveDate>,
    /// Inclusive end date.
    pub end: Option<NaiveDate>,
}

impl RangeFilter {
    /// Filter selecting everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict the filter to the given symbols.
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    /// Set the inclusive start date.
    pub const fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the inclusive end date.
    pub const fn with_end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }
}

/// Master record for a listed symbol.
///
/// Created on first reference by any import; later imports overwrite
/// only the fields they provide. Never deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// Ticker, primary key.
    pub symbol: String,
    /// Display name.
    pub name: Option<String>,
    /// Listing exchange (HOSE, HNX, UPCOM).
    pub exchange: Option<String>,
    /// Industry classification (local language).
    pub industry: Option<String>,
    /// Industry classification (English).
    pub industry_en: Option<String>,
    /// Number of employees.
    pub no_employees: Option<i64>,
    /// Foreign ownership percentage.
    pub foreign_percent: Option<f64>,
    /// Shares outstanding.
    pub outstanding_shares: Option<f64>,
    /// First listing date.
    pub listed_date: Option<NaiveDate>,
}

impl SymbolRecord {
    /// Bare record carrying only the ticker.
    pub fn bare(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }
}

/// One daily OHLCV observation, keyed by `(symbol, date)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBar {
    /// Ticker.
    pub symbol: String,
    /// Trading date.
    pub date: NaiveDate,
    /// Opening price.
    pub open: Option<f64>,
    /// Intraday high.
    pub high: Option<f64>,
    /// Intraday low.
    pub low: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
    /// Adjusted closing price.
    pub adj_close: Option<f64>,
    /// Matched-order volume (shares).
    pub volume: Option<i64>,
    /// Matched-order traded value.
    pub value: Option<f64>,
    /// Block-deal volume (shares).
    pub deal_volume: Option<i64>,
    /// Block-deal traded value.
    pub deal_value: Option<f64>,
    /// Daily change in percent.
    pub change_pct: Option<f64>,

    // Derived fields, null at ingest and filled by the batch recompute.
    /// Log return ln(close / prev close).
    pub returns: Option<f64>,
    /// 20-day rolling volatility of log returns.
    pub volatility_20d: Option<f64>,
    /// 20-day average matched-order volume.
    pub avg_volume_20d: Option<f64>,
}

impl DailyBar {
    /// Empty bar for the given key; all metrics null.
    pub fn new(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open: None,
            high: None,
            low: None,
            close: None,
            adj_close: None,
            volume: None,
            value: None,
            deal_volume: None,
            deal_value: None,
            change_pct: None,
            returns: None,
            volatility_20d: None,
            avg_volume_20d: None,
        }
    }
}

/// Quarterly financial ratios, keyed by `(symbol, year, quarter)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatiosRow {
    /// Ticker.
    pub symbol: String,
    /// Fiscal year.
    pub year: i32,
    /// Fiscal quarter (1-4, or 5 for the annual rollup).
    pub quarter: i32,
    /// Actual report release date, when known.
    pub report_date: Option<NaiveDate>,

    // Valuation
    /// Price to earnings.
    pub pe: Option<f64>,
    /// Price to book.
    pub pb: Option<f64>,
    /// Price to sales.
    pub ps: Option<f64>,
    /// Enterprise value over EBITDA.
    pub ev_ebitda: Option<f64>,

    // Profitability
    /// Return on equity.
    pub roe: Option<f64>,
    /// Return on assets.
    pub roa: Option<f64>,
    /// Gross profit margin.
    pub gross_margin: Option<f64>,
    /// Operating margin.
    pub operating_margin: Option<f64>,
    /// Net profit margin.
    pub net_margin: Option<f64>,

    // Per share
    /// Earnings per share.
    pub eps: Option<f64>,
    /// Book value per share.
    pub bvps: Option<f64>,
    /// Dividend per share.
    pub dividend: Option<f64>,

    // Growth
    /// Revenue growth year over year.
    pub revenue_growth_yoy: Option<f64>,
    /// EPS growth year over year.
    pub eps_growth_yoy: Option<f64>,

    // Efficiency
    /// Revenue over assets.
    pub asset_turnover: Option<f64>,
    /// Days sales outstanding.
    pub days_receivable: Option<f64>,
    /// Days inventory outstanding.
    pub days_inventory: Option<f64>,
    /// Days payable outstanding.
    pub days_payable: Option<f64>,
    /// Cash conversion cycle in days.
    pub cash_cycle: Option<f64>,

    // Leverage & liquidity
    /// Debt to equity.
    pub debt_to_equity: Option<f64>,
    /// Debt to assets.
    pub debt_to_assets: Option<f64>,
    /// Current ratio.
    pub current_ratio: Option<f64>,
    /// Quick ratio.
    pub quick_ratio: Option<f64>,
    /// EBIT over interest expense.
    pub interest_coverage: Option<f64>,

    // Quality
    /// (Net income - CFO) / assets.
    pub accruals: Option<f64>,
    /// CFO / net income.
    pub earnings_quality: Option<f64>,
}

/// Quarterly income statement line items, keyed by `(symbol, year, quarter)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomeRow {
    /// Ticker.
    pub symbol: String,
    /// Fiscal year.
    pub year: i32,
    /// Fiscal quarter (1-4, or 5 for the annual rollup).
    pub quarter: i32,

    /// Net revenue.
    pub revenue: Option<f64>,
    /// Cost of goods sold.
    pub cost_of_goods: Option<f64>,
    /// Gross profit.
    pub gross_profit: Option<f64>,
    /// Operating expense.
    pub operating_expense: Option<f64>,
    /// Operating profit.
    pub operating_profit: Option<f64>,
    /// Interest expense.
    pub interest_expense: Option<f64>,
    /// Pre-tax profit.
    pub pretax_profit: Option<f64>,
    /// Corporate income tax.
    pub tax: Option<f64>,
    /// Post-tax profit.
    pub net_profit: Option<f64>,
    /// Net income attributable to common shareholders.
    pub shareholder_income: Option<f64>,
    /// EBITDA.
    pub ebitda: Option<f64>,

    /// Revenue growth year over year.
    pub revenue_growth_yoy: Option<f64>,
    /// Revenue growth quarter over quarter.
    pub revenue_growth_qoq: Option<f64>,
    /// Shareholder income growth year over year.
    pub profit_growth_yoy: Option<f64>,
    /// Shareholder income growth quarter over quarter.
    pub profit_growth_qoq: Option<f64>,
}

/// Quarterly balance sheet line items, keyed by `(symbol, year, quarter)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceRow {
    /// Ticker.
    pub symbol: String,
    /// Fiscal year.
    pub year: i32,
    /// Fiscal quarter (1-4, or 5 for the annual rollup).
    pub quarter: i32,

    // Assets
    /// Total assets.
    pub total_assets: Option<f64>,
    /// Current assets.
    pub current_assets: Option<f64>,
    /// Cash and equivalents.
    pub cash: Option<f64>,
    /// Short-term investments.
    pub short_term_investments: Option<f64>,
    /// Short-term receivables.
    pub receivables: Option<f64>,
    /// Inventory.
    pub inventory: Option<f64>,
    /// Fixed assets.
    pub fixed_assets: Option<f64>,

    // Liabilities
    /// Total liabilities.
    pub total_liabilities: Option<f64>,
    /// Current liabilities.
    pub current_liabilities: Option<f64>,
    /// Short-term interest-bearing debt.
    pub short_term_debt: Option<f64>,
    /// Long-term interest-bearing debt.
    pub long_term_debt: Option<f64>,
    /// Total interest-bearing debt (short + long when not reported).
    pub total_debt: Option<f64>,

    // Equity
    /// Total shareholders' equity.
    pub total_equity: Option<f64>,
    /// Retained earnings.
    pub retained_earnings: Option<f64>,
}

/// Quarterly cash flow line items, keyed by `(symbol, year, quarter)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CashflowRow {
    /// Ticker.
    pub symbol: String,
    /// Fiscal year.
    pub year: i32,
    /// Fiscal quarter (1-4, or 5 for the annual rollup).
    pub quarter: i32,

    /// Cash from operations.
    pub cfo: Option<f64>,
    /// Cash from investing.
    pub cfi: Option<f64>,
    /// Cash from financing.
    pub cff: Option<f64>,
    /// Net change in cash.
    pub net_cash_change: Option<f64>,
    /// Capital expenditure.
    pub capex: Option<f64>,
    /// Free cash flow (CFO - capex).
    pub fcf: Option<f64>,
    /// Dividends paid.
    pub dividends_paid: Option<f64>,
}

/// Precomputed alpha factor snapshot, keyed by `(symbol, date)`.
///
/// Optional cache written by the factor job; same keying discipline as
/// `daily_prices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaFactorRow {
    /// Ticker.
    pub symbol: String,
    /// Observation date.
    pub date: NaiveDate,
    /// 1-month (21 trading day) momentum.
    pub mom_1m: Option<f64>,
    /// 3-month (63 trading day) momentum.
    pub mom_3m: Option<f64>,
    /// 6-month (126 trading day) momentum.
    pub mom_6m: Option<f64>,
    /// 12-month (252 trading day) momentum.
    pub mom_12m: Option<f64>,
    /// 20-day annualized volatility.
    pub vol_20d: Option<f64>,
    /// 60-day annualized volatility.
    pub vol_60d: Option<f64>,
}

impl AlphaFactorRow {
    /// Empty factor row for the given key.
    pub fn new(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            mom_1m: None,
            mom_3m: None,
            mom_6m: None,
            mom_12m: None,
            vol_20d: None,
            vol_60d: None,
        }
    }
}
