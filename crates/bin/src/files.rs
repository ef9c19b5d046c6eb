//! CSV file discovery and loading for the import command.
//!
//! The crawler drops `historical/<SYMBOL>.csv` price files and
//! `fundamental/<SYMBOL>_<kind>.csv` statement files into a data
//! directory; this module finds them and turns each into the raw record
//! batches the importer consumes. Field values stay as strings; the
//! importer's lenient parsers handle the rest.

use saigon::ingest::RawRecord;
use saigon::{Source, TableKind};
use serde_json::Value;
use std::error::Error;
use std::path::{Path, PathBuf};

/// One discovered CSV file and how to import it.
#[derive(Debug, Clone)]
pub(crate) struct ImportFile {
    /// Path of the CSV file.
    pub(crate) path: PathBuf,
    /// Source whose field mapping applies.
    pub(crate) source: Source,
    /// Table kind the file feeds.
    pub(crate) kind: TableKind,
    /// Symbol the file belongs to.
    pub(crate) symbol: String,
}

/// Suffix to table kind mapping for fundamental file names.
const FUNDAMENTAL_KINDS: &[(&str, TableKind)] = &[
    ("_overview", TableKind::Overview),
    ("_ratios", TableKind::Ratios),
    ("_income", TableKind::Income),
    ("_balance", TableKind::BalanceSheet),
    ("_cashflow", TableKind::CashFlow),
];

/// Discover importable CSV files under `data_dir`.
///
/// `historical/*.csv` are daily price files named by symbol;
/// `fundamental/*_{overview,ratios,income,balance,cashflow}.csv` are
/// statement files. Unrecognized files are ignored.
pub(crate) fn discover(data_dir: &Path) -> Result<Vec<ImportFile>, Box<dyn Error>> {
    let mut files = Vec::new();

    for path in csv_files(&data_dir.join("historical"))? {
        let Some(symbol) = file_stem(&path) else {
            continue;
        };
        files.push(ImportFile {
            path,
            source: Source::Cafef,
            kind: TableKind::DailyPrices,
            symbol,
        });
    }

    for path in csv_files(&data_dir.join("fundamental"))? {
        let Some(stem) = file_stem(&path) else {
            continue;
        };
        for (suffix, kind) in FUNDAMENTAL_KINDS {
            if let Some(symbol) = stem.strip_suffix(suffix) {
                files.push(ImportFile {
                    path: path.clone(),
                    source: Source::Tcbs,
                    kind: *kind,
                    symbol: symbol.to_string(),
                });
                break;
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Read a CSV file into raw records, one per data row. Empty cells are
/// omitted so the importer sees them as absent fields.
pub(crate) fn read_records(path: &Path) -> Result<Vec<RawRecord>, Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = RawRecord::new();
        for (header, field) in headers.iter().zip(row.iter()) {
            if !field.is_empty() {
                record.insert(header.to_string(), Value::String(field.to_string()));
            }
        }
        records.push(record);
    }
    Ok(records)
}

fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut paths = Vec::new();
    if !dir.exists() {
        return Ok(paths);
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            paths.push(path);
        }
    }
    Ok(paths)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}
