//! Saigon CLI binary.
//!
//! Argument parsing, CSV file discovery and output formatting for the
//! research store. Everything else lives in the library crates.

mod factors;
mod files;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use saigon::{
    Importer, RangeFilter, StatementKind, Store, get_merged_data, get_price_matrix,
};
use std::error::Error;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "saigon")]
#[command(about = "Saigon: point-in-time equity research store", long_about = None)]
#[command(version)]
struct Cli {
    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema
    Init,

    /// Import crawler CSV output into the database
    Import {
        /// Data directory containing historical/ and fundamental/
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Recompute derived daily columns after importing
        #[arg(long)]
        derive: bool,
    },

    /// Query data from the database
    Query {
        /// Data type to query
        #[arg(long, value_enum, default_value_t = QueryKind::Prices)]
        r#type: QueryKind,

        /// Comma-separated symbols (e.g. VIC,VCB,VNM)
        #[arg(long)]
        symbols: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Price column for the matrix view
        #[arg(long, default_value = "close")]
        column: String,

        /// Number of rows to display
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Export data to CSV files
    Export {
        /// Data type to export
        #[arg(long, value_enum, default_value_t = ExportKind::All)]
        r#type: ExportKind,

        /// Comma-separated symbols
        #[arg(long)]
        symbols: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Output directory
        #[arg(long, default_value = "data/export")]
        outdir: PathBuf,
    },

    /// Compute momentum/volatility factors into the factor cache
    Factors {
        /// Comma-separated symbols (default: whole universe)
        #[arg(long)]
        symbols: Option<String>,
    },

    /// Show database statistics
    Info,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QueryKind {
    Prices,
    Fundamentals,
    Merged,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportKind {
    Prices,
    Fundamentals,
    All,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(default_db_path);

    match cli.command {
        Commands::Init => {
            Store::open(&db_path)?;
            println!("Database initialized at {}", db_path.display());
        }
        Commands::Import { data_dir, derive } => {
            let store = Store::open(&db_path)?;
            import_data_dir(&store, &data_dir, derive)?;
        }
        Commands::Query {
            r#type,
            symbols,
            start,
            end,
            column,
            limit,
        } => {
            let store = Store::open(&db_path)?;
            let filter = build_filter(symbols.as_deref(), start.as_deref(), end.as_deref())?;
            query(&store, r#type, &filter, &column, limit)?;
        }
        Commands::Export {
            r#type,
            symbols,
            start,
            end,
            outdir,
        } => {
            let store = Store::open(&db_path)?;
            let filter = build_filter(symbols.as_deref(), start.as_deref(), end.as_deref())?;
            export(&store, r#type, &filter, &outdir)?;
        }
        Commands::Factors { symbols } => {
            let store = Store::open(&db_path)?;
            let filter = build_filter(symbols.as_deref(), None, None)?;
            let written = factors::build_factor_cache(&store, &filter)?;
            println!("Factor cache updated: {} rows", written);
        }
        Commands::Info => {
            let store = Store::open(&db_path)?;
            info(&store, &db_path)?;
        }
    }

    Ok(())
}

/// Platform default database location, e.g. `~/.local/share/saigon/`.
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("saigon")
        .join("stock_data.db")
}

fn build_filter(
    symbols: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<RangeFilter, Box<dyn Error>> {
    let mut filter = RangeFilter::all();
    if let Some(symbols) = symbols {
        let list: Vec<String> = symbols
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        filter = filter.with_symbols(list);
    }
    if let Some(start) = start {
        filter = filter.with_start(parse_date(start)?);
    }
    if let Some(end) = end {
        filter = filter.with_end(parse_date(end)?);
    }
    Ok(filter)
}

fn parse_date(raw: &str) -> Result<NaiveDate, Box<dyn Error>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid date `{raw}`, expected YYYY-MM-DD").into())
}

fn import_data_dir(store: &Store, data_dir: &std::path::Path, derive: bool) -> Result<(), Box<dyn Error>> {
    let import_files = files::discover(data_dir)?;
    if import_files.is_empty() {
        println!("No importable CSV files under {}", data_dir.display());
        return Ok(());
    }

    let pb = ProgressBar::new(import_files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("█▓░"),
    );

    let importer = Importer::new(store);
    let mut written = 0;
    let mut skipped = 0;
    let mut symbols: Vec<String> = Vec::new();
    for file in &import_files {
        pb.set_message(format!("{} ({})", file.symbol, file.kind));
        let records = files::read_records(&file.path)?;
        let summary = importer.import(file.source, file.kind, &file.symbol, &records)?;
        written += summary.written;
        skipped += summary.skipped;
        if !symbols.contains(&file.symbol) {
            symbols.push(file.symbol.clone());
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if derive {
        print!("Recomputing derived columns for {} symbols...", symbols.len());
        std::io::Write::flush(&mut std::io::stdout())?;
        for symbol in &symbols {
            store.recompute_derived(symbol)?;
        }
        println!(" ✓");
    }

    println!(
        "Import complete: {} files, {} rows written, {} rows skipped",
        import_files.len(),
        written,
        skipped
    );
    Ok(())
}

fn query(
    store: &Store,
    kind: QueryKind,
    filter: &RangeFilter,
    column: &str,
    limit: usize,
) -> Result<(), Box<dyn Error>> {
    match kind {
        QueryKind::Prices => {
            let matrix = get_price_matrix(store, column, filter)?;
            println!("\nPrice matrix ({}):", column);
            println!("{}", matrix.tail(Some(limit)));
        }
        QueryKind::Fundamentals => {
            let df = store.query_fundamentals(
                StatementKind::Ratios,
                filter.symbols.as_deref(),
                None,
                None,
            )?;
            println!("\nFundamentals:");
            println!("{}", df.tail(Some(limit)));
        }
        QueryKind::Merged => {
            let df = get_merged_data(
                store,
                filter,
                &["close", "volume"],
                &["pe", "pb", "roe", "eps"],
            )?;
            println!("\nMerged data:");
            println!("{}", df.tail(Some(limit)));
        }
    }
    Ok(())
}

fn export(
    store: &Store,
    kind: ExportKind,
    filter: &RangeFilter,
    outdir: &std::path::Path,
) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(outdir)?;

    if matches!(kind, ExportKind::Prices | ExportKind::All) {
        let mut matrix = get_price_matrix(store, "close", filter)?;
        if matrix.height() > 0 {
            let path = outdir.join("prices_matrix.csv");
            write_csv(&mut matrix, &path)?;
            println!("Exported prices to {}", path.display());
        }
    }

    if matches!(kind, ExportKind::Fundamentals | ExportKind::All) {
        let mut df = store.query_fundamentals(
            StatementKind::Ratios,
            filter.symbols.as_deref(),
            None,
            None,
        )?;
        if df.height() > 0 {
            let path = outdir.join("fundamentals.csv");
            write_csv(&mut df, &path)?;
            println!("Exported fundamentals to {}", path.display());
        }
    }

    Ok(())
}

fn write_csv(df: &mut DataFrame, path: &std::path::Path) -> Result<(), Box<dyn Error>> {
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

fn info(store: &Store, db_path: &std::path::Path) -> Result<(), Box<dyn Error>> {
    let stats = store.stats()?;

    println!("\nDatabase: {}", db_path.display());
    println!("--------------------------------------------------");
    println!("  symbols: {} rows", stats.symbols);
    println!("  daily_prices: {} rows", stats.daily_rows);
    println!("  fundamentals_quarterly: {} rows", stats.ratio_rows);
    println!("  income_statement: {} rows", stats.income_rows);
    println!("  balance_sheet: {} rows", stats.balance_rows);
    println!("  cashflow: {} rows", stats.cashflow_rows);
    println!("  alpha_factors: {} rows", stats.factor_rows);

    println!("\nCoverage:");
    if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
        println!("  Date range: {} to {}", first, last);
    } else {
        println!("  No price data yet");
    }
    let symbols = store.list_symbols()?;
    if !symbols.is_empty() {
        println!("  Symbols: {}", symbols.join(", "));
    }
    Ok(())
}
