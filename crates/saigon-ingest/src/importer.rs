//! Batch importer: raw records in, canonical rows out.

use crate::error::Result;
use crate::mapping::{self, FieldMap, Source, TableKind};
use crate::value;
use saigon_store::{
    BalanceRow, CashflowRow, DailyBar, IncomeRow, RatiosRow, Store, SymbolRecord,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// One raw record: source-specific field name to value, as delivered by
/// the external scraper or poller.
pub type RawRecord = serde_json::Map<String, Value>;

/// Outcome of one import batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows successfully written to the store.
    pub written: usize,
    /// Rows skipped because their primary key was missing or invalid.
    pub skipped: usize,
}

/// Maps one batch of raw records onto the canonical schema and applies
/// it through the store.
#[derive(Debug)]
pub struct Importer<'a> {
    store: &'a Store,
}

/// Canonical field name to raw value, for one record.
type Fields<'r> = BTreeMap<&'static str, &'r Value>;

impl<'a> Importer<'a> {
    /// Importer writing through the given store.
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Import one batch of raw records for `symbol`.
    ///
    /// Per-row problems are recovered locally: malformed values null the
    /// field, rows without a usable primary key are counted in
    /// `skipped`. Only store-level failures (and an unsupported
    /// (source, kind) pair) return an error.
    pub fn import(
        &self,
        source: Source,
        kind: TableKind,
        symbol: &str,
        records: &[RawRecord],
    ) -> Result<ImportSummary> {
        let map = mapping::field_map(source, kind)?;
        match kind {
            TableKind::DailyPrices => self.import_daily(symbol, map, records),
            TableKind::Overview => self.import_overview(symbol, map, records),
            TableKind::Ratios => self.import_ratios(symbol, map, records),
            TableKind::Income => self.import_income(symbol, map, records),
            TableKind::BalanceSheet => self.import_balance(symbol, map, records),
            TableKind::CashFlow => self.import_cashflow(symbol, map, records),
        }
    }

    fn import_daily(
        &self,
        symbol: &str,
        map: FieldMap,
        records: &[RawRecord],
    ) -> Result<ImportSummary> {
        let mut rows = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for record in records {
            let fields = canonical_fields(record, map);
            let Some(date) = fields.get("date").and_then(|v| value::parse_date(v)) else {
                skipped += 1;
                continue;
            };
            let mut bar = DailyBar::new(symbol, date);
            bar.open = num(&fields, "open");
            bar.high = num(&fields, "high");
            bar.low = num(&fields, "low");
            bar.close = num(&fields, "close");
            bar.adj_close = num(&fields, "adj_close");
            bar.volume = int(&fields, "volume");
            bar.value = num(&fields, "value");
            bar.deal_volume = int(&fields, "deal_volume");
            bar.deal_value = num(&fields, "deal_value");
            // Composite "delta(pct %)" token; tokens without the
            // parenthesized percentage leave the field null.
            bar.change_pct = fields
                .get("change")
                .and_then(|v| v.as_str())
                .and_then(value::change_percent);
            rows.push(bar);
        }
        let written = self.store.upsert_daily(&rows)?;
        Ok(ImportSummary { written, skipped })
    }

    fn import_overview(
        &self,
        symbol: &str,
        map: FieldMap,
        records: &[RawRecord],
    ) -> Result<ImportSummary> {
        // Overview batches describe a single company; only the first
        // record is meaningful.
        let Some(record) = records.first() else {
            return Ok(ImportSummary::default());
        };
        let fields = canonical_fields(record, map);
        let record = SymbolRecord {
            symbol: symbol.to_string(),
            name: text(&fields, "name"),
            exchange: text(&fields, "exchange"),
            industry: text(&fields, "industry"),
            industry_en: text(&fields, "industry_en"),
            no_employees: int(&fields, "no_employees"),
            foreign_percent: num(&fields, "foreign_percent"),
            outstanding_shares: num(&fields, "outstanding_shares"),
            listed_date: fields.get("listed_date").and_then(|v| value::parse_date(v)),
        };
        self.store.put_symbol(&record)?;
        Ok(ImportSummary {
            written: 1,
            skipped: 0,
        })
    }

    fn import_ratios(
        &self,
        symbol: &str,
        map: FieldMap,
        records: &[RawRecord],
    ) -> Result<ImportSummary> {
        let mut rows = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for record in records {
            let fields = canonical_fields(record, map);
            let Some((year, quarter)) = period_key(&fields) else {
                skipped += 1;
                continue;
            };
            rows.push(RatiosRow {
                symbol: symbol.to_string(),
                year,
                quarter,
                report_date: fields.get("report_date").and_then(|v| value::parse_date(v)),
                pe: num(&fields, "pe"),
                pb: num(&fields, "pb"),
                ps: num(&fields, "ps"),
                ev_ebitda: num(&fields, "ev_ebitda"),
                roe: num(&fields, "roe"),
                roa: num(&fields, "roa"),
                gross_margin: num(&fields, "gross_margin"),
                operating_margin: num(&fields, "operating_margin"),
                net_margin: num(&fields, "net_margin"),
                eps: num(&fields, "eps"),
                bvps: num(&fields, "bvps"),
                dividend: num(&fields, "dividend"),
                revenue_growth_yoy: num(&fields, "revenue_growth_yoy"),
                eps_growth_yoy: num(&fields, "eps_growth_yoy"),
                asset_turnover: num(&fields, "asset_turnover"),
                days_receivable: num(&fields, "days_receivable"),
                days_inventory: num(&fields, "days_inventory"),
                days_payable: num(&fields, "days_payable"),
                cash_cycle: num(&fields, "cash_cycle"),
                debt_to_equity: num(&fields, "debt_to_equity"),
                debt_to_assets: num(&fields, "debt_to_assets"),
                current_ratio: num(&fields, "current_ratio"),
                quick_ratio: num(&fields, "quick_ratio"),
                interest_coverage: num(&fields, "interest_coverage"),
                accruals: num(&fields, "accruals"),
                earnings_quality: num(&fields, "earnings_quality"),
            });
        }
        let written = self.store.upsert_ratios(&rows)?;
        Ok(ImportSummary { written, skipped })
    }

    fn import_income(
        &self,
        symbol: &str,
        map: FieldMap,
        records: &[RawRecord],
    ) -> Result<ImportSummary> {
        let mut rows = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for record in records {
            let fields = canonical_fields(record, map);
            let Some((year, quarter)) = period_key(&fields) else {
                skipped += 1;
                continue;
            };
            rows.push(IncomeRow {
                symbol: symbol.to_string(),
                year,
                quarter,
                revenue: num(&fields, "revenue"),
                cost_of_goods: num(&fields, "cost_of_goods"),
                gross_profit: num(&fields, "gross_profit"),
                operating_expense: num(&fields, "operating_expense"),
                operating_profit: num(&fields, "operating_profit"),
                interest_expense: num(&fields, "interest_expense"),
                pretax_profit: num(&fields, "pretax_profit"),
                tax: num(&fields, "tax"),
                net_profit: num(&fields, "net_profit"),
                shareholder_income: num(&fields, "shareholder_income"),
                ebitda: num(&fields, "ebitda"),
                revenue_growth_yoy: num(&fields, "revenue_growth_yoy"),
                revenue_growth_qoq: num(&fields, "revenue_growth_qoq"),
                profit_growth_yoy: num(&fields, "profit_growth_yoy"),
                profit_growth_qoq: num(&fields, "profit_growth_qoq"),
            });
        }
        let written = self.store.upsert_income(&rows)?;
        Ok(ImportSummary { written, skipped })
    }

    fn import_balance(
        &self,
        symbol: &str,
        map: FieldMap,
        records: &[RawRecord],
    ) -> Result<ImportSummary> {
        let mut rows = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for record in records {
            let fields = canonical_fields(record, map);
            let Some((year, quarter)) = period_key(&fields) else {
                skipped += 1;
                continue;
            };
            let short_term_debt = num(&fields, "short_term_debt");
            let long_term_debt = num(&fields, "long_term_debt");
            // Combined figure is rarely reported; derive it from the
            // components when absent.
            let total_debt = num(&fields, "total_debt").or_else(|| {
                (short_term_debt.is_some() || long_term_debt.is_some()).then(|| {
                    short_term_debt.unwrap_or(0.0) + long_term_debt.unwrap_or(0.0)
                })
            });
            rows.push(BalanceRow {
                symbol: symbol.to_string(),
                year,
                quarter,
                total_assets: num(&fields, "total_assets"),
                current_assets: num(&fields, "current_assets"),
                cash: num(&fields, "cash"),
                short_term_investments: num(&fields, "short_term_investments"),
                receivables: num(&fields, "receivables"),
                inventory: num(&fields, "inventory"),
                fixed_assets: num(&fields, "fixed_assets"),
                total_liabilities: num(&fields, "total_liabilities"),
                current_liabilities: num(&fields, "current_liabilities"),
                short_term_debt,
                long_term_debt,
                total_debt,
                total_equity: num(&fields, "total_equity"),
                retained_earnings: num(&fields, "retained_earnings"),
            });
        }
        let written = self.store.upsert_balance(&rows)?;
        Ok(ImportSummary { written, skipped })
    }

    fn import_cashflow(
        &self,
        symbol: &str,
        map: FieldMap,
        records: &[RawRecord],
    ) -> Result<ImportSummary> {
        let mut rows = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for record in records {
            let fields = canonical_fields(record, map);
            let Some((year, quarter)) = period_key(&fields) else {
                skipped += 1;
                continue;
            };
            rows.push(CashflowRow {
                symbol: symbol.to_string(),
                year,
                quarter,
                cfo: num(&fields, "cfo"),
                cfi: num(&fields, "cfi"),
                cff: num(&fields, "cff"),
                net_cash_change: num(&fields, "net_cash_change"),
                capex: num(&fields, "capex"),
                fcf: num(&fields, "fcf"),
                dividends_paid: num(&fields, "dividends_paid"),
            });
        }
        let written = self.store.upsert_cashflow(&rows)?;
        Ok(ImportSummary { written, skipped })
    }
}

/// Project a raw record onto canonical field names. Unmapped source
/// fields are dropped; where several source fields feed one canonical
/// field, the first non-null value wins.
fn canonical_fields<'r>(record: &'r RawRecord, map: FieldMap) -> Fields<'r> {
    let mut fields = Fields::new();
    for &(source_field, canonical) in map {
        if let Some(value) = record.get(source_field)
            && !value.is_null()
        {
            fields.entry(canonical).or_insert(value);
        }
    }
    fields
}

fn num(fields: &Fields<'_>, key: &str) -> Option<f64> {
    fields.get(key).and_then(|v| value::parse_f64(v))
}

fn int(fields: &Fields<'_>, key: &str) -> Option<i64> {
    fields.get(key).and_then(|v| value::parse_i64(v))
}

fn text(fields: &Fields<'_>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `(year, quarter)` primary key of a statement row. Quarter must fall
/// in 1..=5 (5 is the annual rollup); anything else invalidates the key.
fn period_key(fields: &Fields<'_>) -> Option<(i32, i32)> {
    let year = int(fields, "year")? as i32;
    let quarter = int(fields, "quarter")? as i32;
    (1..=5).contains(&quarter).then_some((year, quarter))
}
