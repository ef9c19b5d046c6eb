//! Lenient parsing of raw field values.
//!
//! External sources deliver numbers as JSON numbers, locale-formatted
//! strings ("1.234,5", "1.234.567") or percent tokens, and dates in
//! `DD/MM/YYYY` or ISO form. Anything unparseable becomes `None`; the
//! caller decides whether that nulls a field or skips a row.

use chrono::NaiveDate;
use serde_json::Value;

/// Parse a date from a raw value. Accepts ISO `YYYY-MM-DD` (optionally
/// with a trailing time component) and `DD/MM/YYYY`.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        return Some(date);
    }
    // ISO timestamp: keep the date part.
    if raw.len() > 10 && raw.as_bytes().get(10) == Some(&b'T') {
        return NaiveDate::parse_from_str(&raw[..10], "%Y-%m-%d").ok();
    }
    None
}

/// Parse a float from a raw value, tolerating locale formatting.
pub fn parse_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => clean_number(s),
        _ => None,
    }
}

/// Parse an integer from a raw value (floats are truncated).
pub fn parse_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => clean_number(s).map(|f| f as i64),
        _ => None,
    }
}

/// Extract the percentage from a composite change token such as
/// `"6(4.80 %)"`. Tokens without a parenthesized percentage yield `None`.
pub fn change_percent(raw: &str) -> Option<f64> {
    let open = raw.find('(')?;
    let close = raw[open + 1..].find(')')? + open + 1;
    let inner = raw[open + 1..close].trim();
    let inner = inner.strip_suffix('%').unwrap_or(inner).trim();
    clean_number(inner)
}

/// Locale-tolerant number cleaning.
///
/// A single dot with no comma reads as a plain decimal. Otherwise dots
/// are treated as thousands separators and a comma as the decimal mark
/// (Vietnamese convention): `"1.234,5"` is 1234.5, `"1.234.567"` is
/// 1234567.
fn clean_number(raw: &str) -> Option<f64> {
    let t: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    let t = t.trim_end_matches('%');
    if t.is_empty() || t == "-" || t == "\u{2013}" {
        return None;
    }
    if t.matches('.').count() == 1 && !t.contains(',') {
        return t.parse().ok();
    }
    let t: String = t
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    t.parse().ok()
}
