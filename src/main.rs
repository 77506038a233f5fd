//! CallBill command-line runner
//!
//! Reads a rate table and a call record, rates every call, and writes one
//! invoice and one CDR export per subscriber and month.

use anyhow::{Context, Result};
use callbill_core::config::LoggingConfig;
use callbill_core::models::{CallDuration, CallTotals};
use callbill_core::AppConfig;
use callbill_index::{RateIndex, SubscriberIndex};
use callbill_io::{open_csv, CallReader, FileReportWriter, RateReader, ReaderOptions};
use callbill_services::{load_calls, load_rates, ReportProjection, ReportSummary};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "callbill", version, about = "Monthly invoices and CDR exports from call records")]
struct Cli {
    /// Rate table CSV: region_code,region_name,rate
    #[arg(value_name = "RATES")]
    rates: PathBuf,

    /// Call record CSV: caller,callee,duration,YYYY-MM-DD[ HH:MM:SS]
    #[arg(value_name = "CALLS")]
    calls: PathBuf,

    /// Extra configuration file layered over config/default
    #[arg(short, long)]
    config: Option<String>,

    /// Directory for bill and CDR files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print the rate table in region code order
    #[arg(long)]
    list_rates: bool,

    /// Print every subscriber with its aggregates in number order
    #[arg(long)]
    list_subscribers: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

/// Initialize tracing/logging
fn init_tracing(logging: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "callbill={level},callbill_core={level},callbill_index={level},callbill_services={level},callbill_io={level}",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn list_rates(rates: &RateIndex) {
    println!("Rate table ({} entries, height {}):", rates.len(), rates.height());
    rates.traverse_inorder(|code, rate| println!("  {code:<11} {rate}"));
}

fn list_subscribers(subscribers: &SubscriberIndex) {
    println!(
        "Subscribers ({} entries, height {}):",
        subscribers.len(),
        subscribers.height()
    );
    subscribers.traverse_inorder(|sub| {
        println!(
            "  {:<15} calls: {:>6}  duration: {:>10}  bill: {:.2}",
            sub.number(),
            sub.total_call_number(),
            CallDuration(sub.total_call_duration()).to_string(),
            sub.total_bill()
        )
    });
}

fn print_summary(totals: &CallTotals, report: &ReportSummary, as_json: bool) -> Result<()> {
    if as_json {
        let value = json!({
            "totals": totals,
            "reports": report,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "Total calls: {}, total duration: {}, total price: {:.2}",
            totals.call_count,
            CallDuration(totals.total_duration),
            totals.total_price
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = cli.output_dir {
        config.output.directory = dir;
    }

    init_tracing(&config.logging);

    info!("Starting CallBill v{}", env!("CARGO_PKG_VERSION"));

    let options = ReaderOptions::from_config(&config)?;

    let rate_file = open_csv(&cli.rates)
        .with_context(|| format!("Cannot open rate table {}", cli.rates.display()))?;
    let (rates, _) = load_rates(RateReader::new(rate_file, &options))?;
    if cli.list_rates {
        list_rates(&rates);
    }

    let call_file = open_csv(&cli.calls)
        .with_context(|| format!("Cannot open call record {}", cli.calls.display()))?;
    let load = load_calls(CallReader::new(call_file, &options), &rates)?;
    if cli.list_subscribers {
        list_subscribers(&load.subscribers);
    }

    let mut writer = FileReportWriter::from_config(&config.output)?;
    let summary = ReportProjection::new(&load.subscribers).run(&mut writer)?;

    info!(
        directory = %writer.directory().display(),
        files = writer.files_written(),
        "Reports written"
    );
    print_summary(&load.totals, &summary, cli.json)?;

    let mut released = 0usize;
    load.subscribers.teardown(|_| released += 1);
    rates.teardown(|_| released += 1);
    debug!(nodes = released, "Indexes released");

    Ok(())
}
