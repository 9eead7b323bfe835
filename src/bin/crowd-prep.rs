//! Run the preparation pipeline on an event log and print what came out.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --bin crowd-prep -- data/hajj_events.csv
//! cargo run --bin crowd-prep -- data/hajj_events.csv --config prep.toml --rows 10
//! RUST_LOG=debug cargo run --bin crowd-prep -- data/hajj_events.csv
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crowd_prep::aggregation::{dashboard_summary, days_present};
use crowd_prep::{load_and_clean_with, PipelineConfig, PrepError};

#[derive(Parser, Debug)]
#[command(about = "Clean and enrich a crowd-monitoring event log")]
struct Args {
    /// Path to the CSV event log.
    csv: PathBuf,

    /// Optional TOML file overriding seed, jitter and zones.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of cleaned rows to print (0 to skip).
    #[arg(long, default_value_t = 5)]
    rows: usize,
}

fn run(args: &Args) -> Result<(), PrepError> {
    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    let prepared = load_and_clean_with(&args.csv, &config)?;
    let df = &prepared.frame;

    println!("File:         {}", args.csv.display());
    println!("Rows kept:    {:>8}", df.height());
    println!("Rows dropped: {:>8}", prepared.dropped_count());
    println!("Columns:      {:>8}", df.width());
    println!("Days:         {}", days_present(df)?.join(", "));

    match dashboard_summary(df) {
        Ok(summary) => {
            println!("Incidents:    {:>8}", summary.total_incidents);
            match summary.avg_movement_speed {
                Some(speed) => println!("Avg speed:    {speed:>8.2} m/s"),
                None => println!("Avg speed:         n/a"),
            }
            println!(
                "Top zone:     {}",
                summary.top_zone.as_deref().unwrap_or("n/a")
            );
        }
        // Summary columns are optional in the source log.
        Err(PrepError::MissingColumn(name)) => println!("Summary:      skipped (no {name})"),
        Err(e) => return Err(e),
    }

    if args.rows > 0 {
        println!();
        println!("{}", df.head(Some(args.rows)));
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
