//! Loadings CLI binary.
//!
//! Estimates rolling factor loadings for every fund in a return table and
//! writes them as CSV or JSON.

mod integration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::data_pipeline::{RunConfig, load_universe};
use loadings::output::{ExportFormat, Exporter, LoadingsTable, UniverseSummary};
use loadings::regression::{Estimator, FundRun};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loadings")]
#[command(about = "Loadings: rolling multi-factor exposures for investment funds", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate rolling loadings for every fund
    Estimate {
        /// Fund return table (CSV)
        #[arg(long)]
        returns: PathBuf,

        /// Factor return table (CSV)
        #[arg(long)]
        factors: PathBuf,

        /// JSON file with `estimation` and `ingest` settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Periods per regression window
        #[arg(long)]
        window: Option<usize>,

        /// Comma-separated factor columns, in beta order
        #[arg(long)]
        factor_names: Option<String>,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format (csv, json or pretty-json)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Print a per-fund summary to stderr
        #[arg(long)]
        summary: bool,
    },

    /// Show how many observations and windows each fund has
    Inspect {
        /// Fund return table (CSV)
        #[arg(long)]
        returns: PathBuf,

        /// Factor return table (CSV)
        #[arg(long)]
        factors: PathBuf,

        /// JSON file with `estimation` and `ingest` settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Periods per regression window
        #[arg(long)]
        window: Option<usize>,

        /// Comma-separated factor columns, in beta order
        #[arg(long)]
        factor_names: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate {
            returns,
            factors,
            config,
            window,
            factor_names,
            output,
            format,
            summary,
        } => {
            let config = RunConfig::load(config.as_deref())?
                .with_overrides(window, factor_names.as_deref())?;
            estimate(&returns, &factors, config, output, format, summary)?;
        }
        Commands::Inspect {
            returns,
            factors,
            config,
            window,
            factor_names,
        } => {
            let config = RunConfig::load(config.as_deref())?
                .with_overrides(window, factor_names.as_deref())?;
            inspect(&returns, &factors, &config)?;
        }
    }

    Ok(())
}

fn estimate(
    returns: &Path,
    factors: &Path,
    config: RunConfig,
    output: Option<PathBuf>,
    format: ExportFormat,
    summary: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let universe = load_universe(returns, factors, &config)?;
    let estimator = Estimator::new(config.estimation)?;

    let pb = ProgressBar::new((universe.len() + universe.rejected().len()) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Estimating loadings...");

    let run = estimator.estimate_universe_with_progress(&universe, |_: &FundRun| pb.inc(1));
    let run = match run {
        Ok(run) => {
            pb.finish_with_message(format!(
                "{} records from {} funds",
                run.record_count(),
                run.runs().len()
            ));
            run
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    for (fund, reason) in run.failed_funds() {
        tracing::warn!(%fund, reason, "fund produced no loadings");
    }

    if summary {
        eprintln!("{}", UniverseSummary::from_run(&run));
    }

    let table = LoadingsTable::from_run(&run);
    match output {
        Some(path) => {
            table.export_to_file(&path, format)?;
            tracing::info!(path = %path.display(), records = table.records.len(), "wrote loadings");
        }
        None => print!("{}", table.export_to_string(format)?),
    }

    Ok(())
}

fn inspect(
    returns: &Path,
    factors: &Path,
    config: &RunConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let universe = load_universe(returns, factors, config)?;
    let window = config.estimation.window_size;

    println!("Fund Universe");
    println!("=============\n");
    println!("Factors: {}", universe.factor_names().join(", "));
    println!("Window:  {} periods\n", window);

    println!(
        "{:<40} {:>8} {:>8} {:>11} {:>11}",
        "Fund", "Obs", "Windows", "First", "Last"
    );
    println!("{}", "-".repeat(82));

    let mut total_windows = 0;
    for series in universe.funds() {
        let windows = series.window_count(window);
        total_windows += windows;
        println!(
            "{:<40} {:>8} {:>8} {:>11} {:>11}",
            series.fund().as_str(),
            series.len(),
            windows,
            series.first_date().map(|d| d.to_string()).unwrap_or_default(),
            series.last_date().map(|d| d.to_string()).unwrap_or_default()
        );
    }

    for rejected in universe.rejected() {
        println!("{:<40} rejected: {}", rejected.fund.as_str(), rejected.reason);
    }

    println!("{}", "-".repeat(82));
    println!(
        "{} funds, {} windows, {} rejected",
        universe.len(),
        total_windows,
        universe.rejected().len()
    );

    Ok(())
}
