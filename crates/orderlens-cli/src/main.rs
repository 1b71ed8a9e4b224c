// crates/orderlens-cli/src/main.rs

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use orderlens_core::{
    loader, run_report, AggregateOutcome, DateRange, ReportOutput, ReportRequest, RunOutcome,
    TableCache, TableSource,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Order/payment report generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join order items with payments and summarize a date window.
    Report(ReportArgs),
    /// Print a table's columns and row count without running the pipeline.
    Inspect {
        /// Path to a delimited-text table
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Path to the order items dataset
    #[arg(long)]
    items: PathBuf,

    /// Path to the order payments dataset
    #[arg(long)]
    payments: PathBuf,

    /// Window start (YYYY-MM-DD); defaults to the data's first day
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Window end (YYYY-MM-DD); defaults to the data's last day
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Emit the report as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Report(args) => report_command(args),
        Command::Inspect { path } => inspect_command(&path),
    }
}

fn report_command(args: ReportArgs) -> Result<()> {
    let range = match (args.start, args.end) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)?),
        (None, None) => None,
        _ => bail!("--start and --end must be given together"),
    };

    let request = ReportRequest {
        items: TableSource::from_path("Order Items Dataset", &args.items),
        payments: TableSource::from_path("Order Payments Dataset", &args.payments),
        range,
    };

    let mut cache = TableCache::new();
    let outcome = run_report(&mut cache, &request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome)?)?);
        return Ok(());
    }

    match outcome {
        RunOutcome::NoRowsInRange { range: Some(range) } => {
            println!("No data in the selected window ({range}).");
        }
        RunOutcome::NoRowsInRange { range: None } => {
            println!("No rows with a valid shipping date; nothing to report.");
        }
        RunOutcome::Report(report) => print_report(&report)?,
    }

    Ok(())
}

fn print_report(report: &ReportOutput) -> Result<()> {
    println!("Window: {} ({} rows)", report.range, report.row_count);
    if report.dropped_invalid_dates > 0 {
        println!(
            "Dropped {} rows with unparseable shipping dates.",
            report.dropped_invalid_dates
        );
    }

    print_summary(
        "Total payment value by payment method",
        &report.payment_summary,
        "payment type",
        "total payment value",
    )?;
    print_summary(
        "Mean item price by installment count",
        &report.installment_price_summary,
        "installments",
        "mean price",
    )?;

    Ok(())
}

fn print_summary(
    title: &str,
    outcome: &AggregateOutcome,
    key_header: &str,
    value_header: &str,
) -> Result<()> {
    println!("\n{title}");
    match outcome {
        AggregateOutcome::Unavailable { missing } => {
            println!("  unavailable: missing columns {}", missing.join(", "));
        }
        AggregateOutcome::Available(summary) => {
            let mut table = Table::new();
            table.set_header([key_header, value_header]);
            for (key, value) in summary.rows()? {
                table.add_row([key, format!("{value:.2}")]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn outcome_json(outcome: &RunOutcome) -> Result<Value> {
    let value = match outcome {
        RunOutcome::NoRowsInRange { range } => json!({
            "status": "empty-result",
            "range": range,
        }),
        RunOutcome::Report(report) => json!({
            "status": "ok",
            "range": report.range,
            "row_count": report.row_count,
            "dropped_invalid_dates": report.dropped_invalid_dates,
            "payment_summary": aggregate_json(&report.payment_summary)?,
            "installment_price_summary": aggregate_json(&report.installment_price_summary)?,
        }),
    };
    Ok(value)
}

fn aggregate_json(outcome: &AggregateOutcome) -> Result<Value> {
    let value = match outcome {
        AggregateOutcome::Unavailable { missing } => json!({
            "status": "missing-columns",
            "missing": missing,
        }),
        AggregateOutcome::Available(summary) => {
            let rows: Vec<Value> = summary
                .rows()?
                .into_iter()
                .map(|(key, value)| json!({ "key": key, "value": value }))
                .collect();
            json!({
                "status": "ok",
                "key_column": summary.key_column,
                "value_column": summary.value_column,
                "rows": rows,
            })
        }
    };
    Ok(value)
}

fn inspect_command(path: &PathBuf) -> Result<()> {
    let source = TableSource::from_path("Table", path);
    let df = loader::load_table(&source)
        .with_context(|| format!("failed to load {}", path.display()))?;

    println!("{} rows, {} columns", df.height(), df.width());
    let mut table = Table::new();
    table.set_header(["column", "dtype"]);
    for column in df.get_columns() {
        table.add_row([column.name().to_string(), column.dtype().to_string()]);
    }
    println!("{table}");

    Ok(())
}
