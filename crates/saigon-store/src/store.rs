//! SQLite-backed store for symbols, daily observations and quarterly
//! fundamentals.
//!
//! Single-writer, multiple-reader: the database runs in WAL journal
//! mode so range reads are not blocked by an in-progress import. Every
//! upsert is an independent `INSERT OR REPLACE` by primary key; batches
//! run inside one transaction but are not atomic as a unit of work.

use crate::error::{Result, StoreError};
use crate::records::{
    AlphaFactorRow, BalanceRow, CashflowRow, DailyBar, IncomeRow, RangeFilter, RatiosRow,
    StatementKind, SymbolRecord,
};
use crate::schema;
use chrono::NaiveDate;
use polars::prelude::*;
use rusqlite::{Connection, OptionalExtension, ToSql, params, params_from_iter};
use std::path::Path;

/// Handle to the research database.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

/// Row counts and date coverage of the database.
#[derive(Debug, Clone)]
pub struct StoreStats {
    /// Number of symbol master records.
    pub symbols: usize,
    /// Number of daily price rows.
    pub daily_rows: usize,
    /// Number of quarterly ratio rows.
    pub ratio_rows: usize,
    /// Number of income statement rows.
    pub income_rows: usize,
    /// Number of balance sheet rows.
    pub balance_rows: usize,
    /// Number of cash flow rows.
    pub cashflow_rows: usize,
    /// Number of precomputed factor rows.
    pub factor_rows: usize,
    /// Earliest daily price date.
    pub first_date: Option<NaiveDate>,
    /// Latest daily price date.
    pub last_date: Option<NaiveDate>,
}

impl Store {
    /// Open (or create) the database at the given path and initialize
    /// the schema.
    ///
    /// The parent directory is created if needed. The store location is
    /// always explicit; there is no module-level default path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // WAL keeps readers unblocked during imports; journal_mode
        // returns a result row, so it has to go through query_row.
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        conn.execute_batch("PRAGMA synchronous=NORMAL; PRAGMA cache_size=10000;")?;
        let store = Self { conn };
        schema::initialize(&store.conn)?;
        Ok(store)
    }

    // ------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------

    /// Insert a symbol, or partially update it if it already exists.
    ///
    /// Provided (non-null) attribute fields overwrite the stored ones;
    /// absent fields are left untouched. Symbols are never deleted.
    pub fn put_symbol(&self, record: &SymbolRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO symbols
                (symbol, name, exchange, industry, industry_en,
                 no_employees, foreign_percent, outstanding_shares, listed_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(symbol) DO UPDATE SET
                name = COALESCE(excluded.name, name),
                exchange = COALESCE(excluded.exchange, exchange),
                industry = COALESCE(excluded.industry, industry),
                industry_en = COALESCE(excluded.industry_en, industry_en),
                no_employees = COALESCE(excluded.no_employees, no_employees),
                foreign_percent = COALESCE(excluded.foreign_percent, foreign_percent),
                outstanding_shares = COALESCE(excluded.outstanding_shares, outstanding_shares),
                listed_date = COALESCE(excluded.listed_date, listed_date),
                updated_at = CURRENT_TIMESTAMP",
            params![
                record.symbol,
                record.name,
                record.exchange,
                record.industry,
                record.industry_en,
                record.no_employees,
                record.foreign_percent,
                record.outstanding_shares,
                record.listed_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(())
    }

    /// Fetch a symbol master record.
    pub fn get_symbol(&self, symbol: &str) -> Result<Option<SymbolRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT symbol, name, exchange, industry, industry_en,
                        no_employees, foreign_percent, outstanding_shares, listed_date
                 FROM symbols WHERE symbol = ?1",
                params![symbol],
                |row| {
                    Ok((
                        SymbolRecord {
                            symbol: row.get(0)?,
                            name: row.get(1)?,
                            exchange: row.get(2)?,
                            industry: row.get(3)?,
                            industry_en: row.get(4)?,
                            no_employees: row.get(5)?,
                            foreign_percent: row.get(6)?,
                            outstanding_shares: row.get(7)?,
                            listed_date: None,
                        },
                        row.get::<_, Option<String>>(8)?,
                    ))
                },
            )
            .optional()?;

        match record {
            None => Ok(None),
            Some((mut record, listed)) => {
                record.listed_date = listed
                    .map(|s| {
                        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                            .map_err(|e| StoreError::Parse(e.to_string()))
                    })
                    .transpose()?;
                Ok(Some(record))
            }
        }
    }

    /// All known symbols, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT symbol FROM symbols ORDER BY symbol")?;
        let symbols = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(symbols)
    }

    // ------------------------------------------------------------------
    // Upserts
    // ------------------------------------------------------------------

    /// Insert or replace daily bars by `(symbol, date)`.
    ///
    /// Auto-creates a bare symbol record for unseen tickers. Returns the
    /// number of rows written.
    pub fn upsert_daily(&self, rows: &[DailyBar]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for bar in rows {
            tx.execute(
                "INSERT OR IGNORE INTO symbols (symbol) VALUES (?1)",
                params![bar.symbol],
            )?;
            tx.execute(
                "INSERT OR REPLACE INTO daily_prices
                    (symbol, date, open, high, low, close, adj_close, volume, value,
                     deal_volume, deal_value, change_pct, returns, volatility_20d, avg_volume_20d)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    bar.symbol,
                    bar.date.to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.adj_close,
                    bar.volume,
                    bar.value,
                    bar.deal_volume,
                    bar.deal_value,
                    bar.change_pct,
                    bar.returns,
                    bar.volatility_20d,
                    bar.avg_volume_20d,
                ],
            )?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Insert or replace quarterly ratio rows by `(symbol, year, quarter)`.
    pub fn upsert_ratios(&self, rows: &[RatiosRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for row in rows {
            tx.execute(
                "INSERT OR IGNORE INTO symbols (symbol) VALUES (?1)",
                params![row.symbol],
            )?;
            tx.execute(
                "INSERT OR REPLACE INTO fundamentals_quarterly
                    (symbol, year, quarter, report_date,
                     pe, pb, ps, ev_ebitda,
                     roe, roa, gross_margin, operating_margin, net_margin,
                     eps, bvps, dividend,
                     revenue_growth_yoy, eps_growth_yoy,
                     asset_turnover, days_receivable, days_inventory, days_payable, cash_cycle,
                     debt_to_equity, debt_to_assets, current_ratio, quick_ratio, interest_coverage,
                     accruals, earnings_quality)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                         ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30)",
                params![
                    row.symbol,
                    row.year,
                    row.quarter,
                    row.report_date.map(|d| d.to_string()),
                    row.pe,
                    row.pb,
                    row.ps,
                    row.ev_ebitda,
                    row.roe,
                    row.roa,
                    row.gross_margin,
                    row.operating_margin,
                    row.net_margin,
                    row.eps,
                    row.bvps,
                    row.dividend,
                    row.revenue_growth_yoy,
                    row.eps_growth_yoy,
                    row.asset_turnover,
                    row.days_receivable,
                    row.days_inventory,
                    row.days_payable,
                    row.cash_cycle,
                    row.debt_to_equity,
                    row.debt_to_assets,
                    row.current_ratio,
                    row.quick_ratio,
                    row.interest_coverage,
                    row.accruals,
                    row.earnings_quality,
                ],
            )?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Insert or replace income statement rows by `(symbol, year, quarter)`.
    pub fn upsert_income(&self, rows: &[IncomeRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for row in rows {
            tx.execute(
                "INSERT OR IGNORE INTO symbols (symbol) VALUES (?1)",
                params![row.symbol],
            )?;
            tx.execute(
                "INSERT OR REPLACE INTO income_statement
                    (symbol, year, quarter,
                     revenue, cost_of_goods, gross_profit, operating_expense, operating_profit,
                     interest_expense, pretax_profit, tax, net_profit, shareholder_income, ebitda,
                     revenue_growth_yoy, revenue_growth_qoq, profit_growth_yoy, profit_growth_qoq)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                         ?15, ?16, ?17, ?18)",
                params![
                    row.symbol,
                    row.year,
                    row.quarter,
                    row.revenue,
                    row.cost_of_goods,
                    row.gross_profit,
                    row.operating_expense,
                    row.operating_profit,
                    row.interest_expense,
                    row.pretax_profit,
                    row.tax,
                    row.net_profit,
                    row.shareholder_income,
                    row.ebitda,
                    row.revenue_growth_yoy,
                    row.revenue_growth_qoq,
                    row.profit_growth_yoy,
                    row.profit_growth_qoq,
                ],
            )?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Insert or replace balance sheet rows by `(symbol, year, quarter)`.
    pub fn upsert_balance(&self, rows: &[BalanceRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for row in rows {
            tx.execute(
                "INSERT OR IGNORE INTO symbols (symbol) VALUES (?1)",
                params![row.symbol],
            )?;
            tx.execute(
                "INSERT OR REPLACE INTO balance_sheet
                    (symbol, year, quarter,
                     total_assets, current_assets, cash, short_term_investments, receivables,
                     inventory, fixed_assets, total_liabilities, current_liabilities,
                     short_term_debt, long_term_debt, total_debt, total_equity, retained_earnings)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                params![
                    row.symbol,
                    row.year,
                    row.quarter,
                    row.total_assets,
                    row.current_assets,
                    row.cash,
                    row.short_term_investments,
                    row.receivables,
                    row.inventory,
                    row.fixed_assets,
                    row.total_liabilities,
                    row.current_liabilities,
                    row.short_term_debt,
                    row.long_term_debt,
                    row.total_debt,
                    row.total_equity,
                    row.retained_earnings,
                ],
            )?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Insert or replace cash flow rows by `(symbol, year, quarter)`.
    pub fn upsert_cashflow(&self, rows: &[CashflowRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for row in rows {
            tx.execute(
                "INSERT OR IGNORE INTO symbols (symbol) VALUES (?1)",
                params![row.symbol],
            )?;
            tx.execute(
                "INSERT OR REPLACE INTO cashflow
                    (symbol, year, quarter, cfo, cfi, cff, net_cash_change, capex, fcf, dividends_paid)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    row.symbol,
                    row.year,
                    row.quarter,
                    row.cfo,
                    row.cfi,
                    row.cff,
                    row.net_cash_change,
                    row.capex,
                    row.fcf,
                    row.dividends_paid,
                ],
            )?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Insert or replace precomputed factor rows by `(symbol, date)`.
    pub fn upsert_factors(&self, rows: &[AlphaFactorRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for row in rows {
            tx.execute(
                "INSERT OR IGNORE INTO symbols (symbol) VALUES (?1)",
                params![row.symbol],
            )?;
            tx.execute(
                "INSERT OR REPLACE INTO alpha_factors
                    (symbol, date, mom_1m, mom_3m, mom_6m, mom_12m, vol_20d, vol_60d)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.symbol,
                    row.date.to_string(),
                    row.mom_1m,
                    row.mom_3m,
                    row.mom_6m,
                    row.mom_12m,
                    row.vol_20d,
                    row.vol_60d,
                ],
            )?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    // ------------------------------------------------------------------
    // Range reads
    // ------------------------------------------------------------------

    /// Read a long-format daily panel, projected to the requested value
    /// columns and sorted by `(date, symbol)`.
    ///
    /// Absent filters mean "all"; a query matching nothing returns an
    /// empty frame with the requested columns. Column names are checked
    /// against the schema before any SQL is built.
    pub fn query_range(&self, filter: &RangeFilter, columns: &[&str]) -> Result<DataFrame> {
        self.query_dated_table("daily_prices", schema::DAILY_COLUMNS, filter, columns)
    }

    /// Read precomputed factor rows; same shape, ordering and filter
    /// semantics as [`Store::query_range`]. `columns = None` selects
    /// every factor column.
    pub fn query_factors(
        &self,
        filter: &RangeFilter,
        columns: Option<&[&str]>,
    ) -> Result<DataFrame> {
        let columns = columns.unwrap_or(schema::FACTOR_COLUMNS);
        self.query_dated_table("alpha_factors", schema::FACTOR_COLUMNS, filter, columns)
    }

    fn query_dated_table(
        &self,
        table: &'static str,
        known_columns: &[&str],
        filter: &RangeFilter,
        columns: &[&str],
    ) -> Result<DataFrame> {
        validate_columns(columns, known_columns, table)?;

        if matches!(&filter.symbols, Some(s) if s.is_empty()) {
            return empty_panel_frame(columns);
        }

        let mut sql = String::from("SELECT symbol, date");
        for c in columns {
            sql.push_str(", ");
            sql.push_str(c);
        }
        sql.push_str(" FROM ");
        sql.push_str(table);
        sql.push_str(" WHERE 1=1");

        let mut bind: Vec<String> = Vec::new();
        if let Some(symbols) = &filter.symbols {
            sql.push_str(" AND symbol IN (");
            sql.push_str(&placeholders(bind.len(), symbols.len()));
            sql.push(')');
            bind.extend(symbols.iter().cloned());
        }
        if let Some(start) = filter.start {
            bind.push(start.to_string());
            sql.push_str(&format!(" AND date >= ?{}", bind.len()));
        }
        if let Some(end) = filter.end {
            bind.push(end.to_string());
            sql.push_str(&format!(" AND date <= ?{}", bind.len()));
        }
        sql.push_str(" ORDER BY date, symbol");

        let mut stmt = self.conn.prepare(&sql)?;
        let ncols = columns.len();
        let rows = stmt.query_map(params_from_iter(bind.iter()), |row| {
            let symbol: String = row.get(0)?;
            let date: String = row.get(1)?;
            let mut values = Vec::with_capacity(ncols);
            for i in 0..ncols {
                values.push(row.get::<_, Option<f64>>(2 + i)?);
            }
            Ok((symbol, date, values))
        })?;

        let mut symbols = Vec::new();
        let mut dates = Vec::new();
        let mut value_cols: Vec<Vec<Option<f64>>> = vec![Vec::new(); ncols];
        for row in rows {
            let (symbol, date, values) = row?;
            symbols.push(symbol);
            dates.push(date);
            for (i, v) in values.into_iter().enumerate() {
                value_cols[i].push(v);
            }
        }

        if dates.is_empty() {
            return empty_panel_frame(columns);
        }

        let mut out: Vec<Column> = Vec::with_capacity(2 + ncols);
        out.push(Series::new("symbol".into(), symbols).into());
        out.push(Series::new("date".into(), dates).into());
        for (name, values) in columns.iter().zip(value_cols) {
            out.push(Series::new((*name).into(), values).into());
        }
        let df = DataFrame::new(out)?
            .lazy()
            .with_column(col("date").cast(DataType::Date))
            .collect()?;
        Ok(df)
    }

    /// Read quarterly fundamental rows for one statement kind, sorted by
    /// `(symbol, year, quarter)`.
    ///
    /// `columns = None` selects every value column of the statement.
    pub fn query_fundamentals(
        &self,
        kind: StatementKind,
        symbols: Option<&[String]>,
        years: Option<&[i32]>,
        columns: Option<&[&str]>,
    ) -> Result<DataFrame> {
        let all_columns = schema::statement_columns(kind);
        let columns = columns.unwrap_or(all_columns);
        validate_columns(columns, all_columns, kind.table_name())?;

        if matches!(symbols, Some(s) if s.is_empty()) || matches!(years, Some(y) if y.is_empty()) {
            return empty_fundamental_frame(columns);
        }

        let mut sql = String::from("SELECT symbol, year, quarter");
        for c in columns {
            sql.push_str(", ");
            sql.push_str(c);
        }
        sql.push_str(" FROM ");
        sql.push_str(kind.table_name());
        sql.push_str(" WHERE 1=1");

        let mut bind: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(symbols) = symbols {
            sql.push_str(" AND symbol IN (");
            sql.push_str(&placeholders(bind.len(), symbols.len()));
            sql.push(')');
            for s in symbols {
                bind.push(Box::new(s.clone()));
            }
        }
        if let Some(years) = years {
            sql.push_str(" AND year IN (");
            sql.push_str(&placeholders(bind.len(), years.len()));
            sql.push(')');
            for y in years {
                bind.push(Box::new(*y));
            }
        }
        sql.push_str(" ORDER BY symbol, year, quarter");

        let mut stmt = self.conn.prepare(&sql)?;
        let ncols = columns.len();
        let rows = stmt.query_map(params_from_iter(bind.iter().map(|b| b.as_ref())), |row| {
            let symbol: String = row.get(0)?;
            let year: i32 = row.get(1)?;
            let quarter: i32 = row.get(2)?;
            let mut values = Vec::with_capacity(ncols);
            for i in 0..ncols {
                values.push(row.get::<_, Option<f64>>(3 + i)?);
            }
            Ok((symbol, year, quarter, values))
        })?;

        let mut symbols_out = Vec::new();
        let mut years_out: Vec<i32> = Vec::new();
        let mut quarters_out: Vec<i32> = Vec::new();
        let mut value_cols: Vec<Vec<Option<f64>>> = vec![Vec::new(); ncols];
        for row in rows {
            let (symbol, year, quarter, values) = row?;
            symbols_out.push(symbol);
            years_out.push(year);
            quarters_out.push(quarter);
            for (i, v) in values.into_iter().enumerate() {
                value_cols[i].push(v);
            }
        }

        let mut out: Vec<Column> = Vec::with_capacity(3 + ncols);
        out.push(Series::new("symbol".into(), symbols_out).into());
        out.push(Series::new("year".into(), years_out).into());
        out.push(Series::new("quarter".into(), quarters_out).into());
        for (name, values) in columns.iter().zip(value_cols) {
            out.push(Series::new((*name).into(), values).into());
        }
        Ok(DataFrame::new(out)?)
    }

    // ------------------------------------------------------------------
    // Derived columns
    // ------------------------------------------------------------------

    /// Batch-fill the derived daily columns for one symbol: log returns,
    /// 20-day return volatility and 20-day average volume.
    ///
    /// Reads the stored closes/volumes in date order and rewrites the
    /// derived columns in one transaction. Returns the number of rows
    /// updated.
    pub fn recompute_derived(&self, symbol: &str) -> Result<usize> {
        let mut stmt = self.conn.prepare(
            "SELECT date, close, volume FROM daily_prices
             WHERE symbol = ?1 ORDER BY date ASC",
        )?;
        let rows = stmt.query_map(params![symbol], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?;

        let mut dates = Vec::new();
        let mut closes = Vec::new();
        let mut volumes = Vec::new();
        for row in rows {
            let (date, close, volume) = row?;
            dates.push(date);
            closes.push(close);
            volumes.push(volume);
        }

        let n = dates.len();
        let mut returns: Vec<Option<f64>> = vec![None; n];
        for i in 1..n {
            if let (Some(prev), Some(curr)) = (closes[i - 1], closes[i])
                && prev > 0.0
                && curr > 0.0
            {
                returns[i] = Some((curr / prev).ln());
            }
        }

        const WINDOW: usize = 20;
        let mut vol_20d: Vec<Option<f64>> = vec![None; n];
        let mut avg_volume_20d: Vec<Option<f64>> = vec![None; n];
        for i in 0..n {
            if i + 1 >= WINDOW {
                vol_20d[i] = full_window(&returns[i + 1 - WINDOW..=i]).and_then(|w| sample_std(&w));
                avg_volume_20d[i] = full_window(&volumes[i + 1 - WINDOW..=i]).map(|w| mean(&w));
            }
        }

        let tx = self.conn.unchecked_transaction()?;
        for i in 0..n {
            tx.execute(
                "UPDATE daily_prices
                 SET returns = ?1, volatility_20d = ?2, avg_volume_20d = ?3
                 WHERE symbol = ?4 AND date = ?5",
                params![returns[i], vol_20d[i], avg_volume_20d[i], symbol, dates[i]],
            )?;
        }
        tx.commit()?;
        Ok(n)
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    /// Row counts and date coverage.
    pub fn stats(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                        row.get(0)
                    })?;
            Ok(n as usize)
        };

        let (first, last): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(date), MAX(date) FROM daily_prices",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let parse = |s: Option<String>| -> Result<Option<NaiveDate>> {
            s.map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| StoreError::Parse(e.to_string()))
            })
            .transpose()
        };

        Ok(StoreStats {
            symbols: count("symbols")?,
            daily_rows: count("daily_prices")?,
            ratio_rows: count("fundamentals_quarterly")?,
            income_rows: count("income_statement")?,
            balance_rows: count("balance_sheet")?,
            cashflow_rows: count("cashflow")?,
            factor_rows: count("alpha_factors")?,
            first_date: parse(first)?,
            last_date: parse(last)?,
        })
    }
}

/// `?N, ?N+1, ...` placeholder list starting after `offset` bound values.
fn placeholders(offset: usize, count: usize) -> String {
    (0..count)
        .map(|i| format!("?{}", offset + i + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

fn validate_columns(requested: &[&str], known: &[&str], table: &'static str) -> Result<()> {
    for c in requested {
        if !known.contains(c) {
            return Err(StoreError::UnknownColumn {
                column: (*c).to_string(),
                table,
            });
        }
    }
    Ok(())
}

fn empty_panel_frame(columns: &[&str]) -> Result<DataFrame> {
    let mut out: Vec<Column> = Vec::with_capacity(2 + columns.len());
    out.push(Series::new_empty("symbol".into(), &DataType::String).into());
    out.push(Series::new_empty("date".into(), &DataType::Date).into());
    for c in columns {
        out.push(Series::new_empty((*c).into(), &DataType::Float64).into());
    }
    Ok(DataFrame::new(out)?)
}

fn empty_fundamental_frame(columns: &[&str]) -> Result<DataFrame> {
    let mut out: Vec<Column> = Vec::with_capacity(3 + columns.len());
    out.push(Series::new_empty("symbol".into(), &DataType::String).into());
    out.push(Series::new_empty("year".into(), &DataType::Int32).into());
    out.push(Series::new_empty("quarter".into(), &DataType::Int32).into());
    for c in columns {
        out.push(Series::new_empty((*c).into(), &DataType::Float64).into());
    }
    Ok(DataFrame::new(out)?)
}

/// All-present window, or `None` if any element is null.
fn full_window(window: &[Option<f64>]) -> Option<Vec<f64>> {
    window.iter().copied().collect()
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (ddof = 1).
fn sample_std(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bar(symbol: &str, d: NaiveDate, close: f64) -> DailyBar {
        DailyBar {
            close: Some(close),
            volume: Some(1000),
            ..DailyBar::new(symbol, d)
        }
    }

    #[test]
    fn test_store_initialization() {
        assert!(Store::in_memory().is_ok());
    }

    #[test]
    fn test_put_symbol_partial_update() {
        let store = Store::in_memory().unwrap();

        store
            .put_symbol(&SymbolRecord {
                name: Some("Vingroup".to_string()),
                exchange: Some("HOSE".to_string()),
                ..SymbolRecord::bare("VIC")
            })
            .unwrap();

        // Update only the industry; name and exchange must survive.
        store
            .put_symbol(&SymbolRecord {
                industry: Some("Real Estate".to_string()),
                ..SymbolRecord::bare("VIC")
            })
            .unwrap();

        let record = store.get_symbol("VIC").unwrap().unwrap();
        assert_eq!(record.name.as_deref(), Some("Vingroup"));
        assert_eq!(record.exchange.as_deref(), Some("HOSE"));
        assert_eq!(record.industry.as_deref(), Some("Real Estate"));
    }

    #[test]
    fn test_get_symbol_absent() {
        let store = Store::in_memory().unwrap();
        assert!(store.get_symbol("VIC").unwrap().is_none());
    }

    #[test]
    fn test_upsert_daily_replaces_by_key() {
        let store = Store::in_memory().unwrap();
        let d = date(2024, 1, 2);

        store.upsert_daily(&[bar("VIC", d, 100.0)]).unwrap();
        store.upsert_daily(&[bar("VIC", d, 101.0)]).unwrap();

        let df = store
            .query_range(&RangeFilter::all(), &["close"])
            .unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("close").unwrap().f64().unwrap().get(0), Some(101.0));
    }

    #[test]
    fn test_upsert_daily_auto_creates_symbol() {
        let store = Store::in_memory().unwrap();
        store
            .upsert_daily(&[bar("VNM", date(2024, 1, 2), 70.0)])
            .unwrap();
        assert_eq!(store.list_symbols().unwrap(), vec!["VNM".to_string()]);
    }

    #[test]
    fn test_query_range_sorted_and_unique() {
        let store = Store::in_memory().unwrap();
        let bars = vec![
            bar("VCB", date(2024, 1, 3), 90.0),
            bar("VIC", date(2024, 1, 2), 100.0),
            bar("VCB", date(2024, 1, 2), 89.0),
            bar("VIC", date(2024, 1, 3), 101.0),
        ];
        store.upsert_daily(&bars).unwrap();

        let df = store
            .query_range(&RangeFilter::all(), &["close"])
            .unwrap();
        assert_eq!(df.height(), 4);

        let symbols = df.column("symbol").unwrap().str().unwrap();
        assert_eq!(symbols.get(0), Some("VCB"));
        assert_eq!(symbols.get(1), Some("VIC"));
        assert_eq!(symbols.get(2), Some("VCB"));
        assert_eq!(symbols.get(3), Some("VIC"));

        // Per symbol, dates are strictly increasing.
        for symbol in ["VIC", "VCB"] {
            let filtered = store
                .query_range(&RangeFilter::all().with_symbols([symbol]), &["close"])
                .unwrap();
            let dates = filtered.column("date").unwrap().cast(&DataType::Int32).unwrap();
            let dates = dates.i32().unwrap();
            let mut prev = i32::MIN;
            for d in dates.into_iter().flatten() {
                assert!(d > prev);
                prev = d;
            }
        }
    }

    #[test]
    fn test_query_range_date_filters() {
        let store = Store::in_memory().unwrap();
        store
            .upsert_daily(&[
                bar("VIC", date(2024, 1, 2), 100.0),
                bar("VIC", date(2024, 1, 3), 101.0),
                bar("VIC", date(2024, 1, 4), 102.0),
            ])
            .unwrap();

        let filter = RangeFilter::all()
            .with_start(date(2024, 1, 3))
            .with_end(date(2024, 1, 3));
        let df = store.query_range(&filter, &["close"]).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("close").unwrap().f64().unwrap().get(0), Some(101.0));
    }

    #[test]
    fn test_query_range_empty_result() {
        let store = Store::in_memory().unwrap();
        let df = store
            .query_range(&RangeFilter::all().with_symbols(["VIC"]), &["close", "volume"])
            .unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(
            df.get_column_names_str(),
            vec!["symbol", "date", "close", "volume"]
        );
    }

    #[test]
    fn test_query_range_unknown_column() {
        let store = Store::in_memory().unwrap();
        let err = store
            .query_range(&RangeFilter::all(), &["nonexistent"])
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));
    }

    #[test]
    fn test_fundamentals_roundtrip_sorted() {
        let store = Store::in_memory().unwrap();
        let rows = vec![
            RatiosRow {
                symbol: "VIC".to_string(),
                year: 2024,
                quarter: 2,
                pe: Some(12.0),
                ..RatiosRow::default()
            },
            RatiosRow {
                symbol: "VIC".to_string(),
                year: 2024,
                quarter: 1,
                pe: Some(10.0),
                ..RatiosRow::default()
            },
            RatiosRow {
                symbol: "ACB".to_string(),
                year: 2024,
                quarter: 1,
                pe: Some(8.0),
                ..RatiosRow::default()
            },
        ];
        store.upsert_ratios(&rows).unwrap();

        let df = store
            .query_fundamentals(StatementKind::Ratios, None, None, Some(&["pe"]))
            .unwrap();
        assert_eq!(df.height(), 3);

        let symbols = df.column("symbol").unwrap().str().unwrap();
        let quarters = df.column("quarter").unwrap().i32().unwrap();
        assert_eq!(symbols.get(0), Some("ACB"));
        assert_eq!(symbols.get(1), Some("VIC"));
        assert_eq!(quarters.get(1), Some(1));
        assert_eq!(quarters.get(2), Some(2));
    }

    #[test]
    fn test_fundamentals_replace_by_key() {
        let store = Store::in_memory().unwrap();
        let row = |pe| RatiosRow {
            symbol: "VIC".to_string(),
            year: 2024,
            quarter: 1,
            pe: Some(pe),
            ..RatiosRow::default()
        };
        store.upsert_ratios(&[row(10.0)]).unwrap();
        store.upsert_ratios(&[row(11.0)]).unwrap();

        let df = store
            .query_fundamentals(StatementKind::Ratios, None, None, Some(&["pe"]))
            .unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("pe").unwrap().f64().unwrap().get(0), Some(11.0));
    }

    #[test]
    fn test_fundamentals_year_filter() {
        let store = Store::in_memory().unwrap();
        let row = |year| IncomeRow {
            symbol: "VIC".to_string(),
            year,
            quarter: 1,
            revenue: Some(100.0),
            ..IncomeRow::default()
        };
        store.upsert_income(&[row(2023), row(2024)]).unwrap();

        let df = store
            .query_fundamentals(StatementKind::Income, None, Some(&[2024]), Some(&["revenue"]))
            .unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("year").unwrap().i32().unwrap().get(0), Some(2024));
    }

    #[test]
    fn test_recompute_derived_returns() {
        let store = Store::in_memory().unwrap();
        store
            .upsert_daily(&[
                bar("VIC", date(2024, 1, 2), 100.0),
                bar("VIC", date(2024, 1, 3), 110.0),
            ])
            .unwrap();

        let updated = store.recompute_derived("VIC").unwrap();
        assert_eq!(updated, 2);

        let df = store
            .query_range(&RangeFilter::all(), &["returns"])
            .unwrap();
        let returns = df.column("returns").unwrap().f64().unwrap();
        assert!(returns.get(0).is_none());
        assert_relative_eq!(returns.get(1).unwrap(), (1.1_f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_recompute_derived_rolling_window() {
        let store = Store::in_memory().unwrap();
        let start = date(2024, 1, 1);
        let bars: Vec<DailyBar> = (0..25)
            .map(|i| {
                bar(
                    "VIC",
                    start + chrono::Duration::days(i),
                    100.0 + (i % 2) as f64,
                )
            })
            .collect();
        store.upsert_daily(&bars).unwrap();
        store.recompute_derived("VIC").unwrap();

        let df = store
            .query_range(&RangeFilter::all(), &["volatility_20d", "avg_volume_20d"])
            .unwrap();
        let vol = df.column("volatility_20d").unwrap().f64().unwrap();
        let avg = df.column("avg_volume_20d").unwrap().f64().unwrap();

        // Row 19 is the first with a full 20-observation volume window;
        // volatility additionally needs 20 returns, first complete at row 20.
        assert!(avg.get(18).is_none());
        assert_relative_eq!(avg.get(19).unwrap(), 1000.0, epsilon = 1e-12);
        assert!(vol.get(19).is_none());
        assert!(vol.get(20).is_some());
    }

    #[test]
    fn test_factor_cache_roundtrip() {
        let store = Store::in_memory().unwrap();
        store
            .upsert_factors(&[AlphaFactorRow {
                mom_1m: Some(0.05),
                vol_20d: Some(0.3),
                ..AlphaFactorRow::new("VIC", date(2024, 1, 2))
            }])
            .unwrap();

        let df = store
            .query_factors(&RangeFilter::all(), Some(&["mom_1m", "vol_20d"]))
            .unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("mom_1m").unwrap().f64().unwrap().get(0), Some(0.05));
        assert_eq!(df.column("vol_20d").unwrap().f64().unwrap().get(0), Some(0.3));
    }

    #[test]
    fn test_stats() {
        let store = Store::in_memory().unwrap();
        store
            .upsert_daily(&[
                bar("VIC", date(2024, 1, 2), 100.0),
                bar("VCB", date(2024, 1, 3), 90.0),
            ])
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.symbols, 2);
        assert_eq!(stats.daily_rows, 2);
        assert_eq!(stats.ratio_rows, 0);
        assert_eq!(stats.first_date, Some(date(2024, 1, 2)));
        assert_eq!(stats.last_date, Some(date(2024, 1, 3)));
    }
}
