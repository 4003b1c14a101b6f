use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

use ledger_metrics::{
    load_records, parse_date_str, BatchSummary, FileLedger, LedgerConfig, MetricsEngine,
    RecordKind, TransactionValidator, ValidationReport,
};
use serde::Serialize;

const USAGE: &str = "\
Usage:
  ledger-metrics report <expenses> <contributions> [--config <path>] [--date <YYYY-MM-DD>]
  ledger-metrics validate <expense|contribution> <records>

Record files are JSON arrays or CSV (splitBetween separated by ';' or '|').";

#[derive(Serialize)]
struct ValidationOutput<'a> {
    reports: &'a [ValidationReport],
    summary: &'a BatchSummary,
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("report") => run_report(&args[1..]),
        Some("validate") => run_validate(&args[1..]),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_report(args: &[String]) -> Result<()> {
    let mut positional: Vec<&String> = Vec::new();
    let mut config_path: Option<PathBuf> = None;
    let mut reference: Option<NaiveDate> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
            }
            "--date" => {
                let raw = iter.next().context("--date needs a date")?;
                match parse_date_str(raw) {
                    Some(date) => reference = Some(date),
                    None => bail!("Invalid --date: {}", raw),
                }
            }
            _ => positional.push(arg),
        }
    }

    if positional.len() != 2 {
        bail!("report needs <expenses> and <contributions>\n\n{}", USAGE);
    }

    let config = match config_path {
        Some(path) => LedgerConfig::from_file(&path)?,
        None => LedgerConfig::default(),
    };
    let reference = reference.unwrap_or_else(|| Local::now().date_naive());

    let ledger = FileLedger::load(Path::new(positional[0]), Path::new(positional[1]))?;
    let engine = MetricsEngine::new(config);
    let metrics = engine.compute_from_source(&ledger, reference);

    info!("{}", metrics.summary());
    println!(
        "{}",
        serde_json::to_string_pretty(&metrics).context("Failed to serialize metrics")?
    );

    Ok(())
}

fn run_validate(args: &[String]) -> Result<()> {
    if args.len() != 2 {
        bail!("validate needs <expense|contribution> and <records>\n\n{}", USAGE);
    }

    let kind: RecordKind = args[0]
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let records = load_records(Path::new(&args[1]))?;

    let validator = TransactionValidator::new();
    let reports = validator.validate_batch(&records, kind);
    let summary = validator.batch_summary(&reports);

    info!("{}", summary.summary());
    println!(
        "{}",
        serde_json::to_string_pretty(&ValidationOutput {
            reports: &reports,
            summary: &summary,
        })
        .context("Failed to serialize validation reports")?
    );

    Ok(())
}
