//! Foresight CLI binary.
//!
//! Provides command-line interface for ZIP-level home value forecasts.

mod integration;

use clap::{ArgAction, Parser, Subcommand};
use foresight::{ForecastConfig, ModelKind, PipelineError, run_forecast};
use indicatif::{ProgressBar, ProgressStyle};
use integration::data_pipeline::{FetchConfig, clear_cache, load_market, print_cache_info};
use std::process;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "foresight")]
#[command(about = "Foresight: five-year home value forecasts by ZIP code", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast home values for a ZIP code
    Forecast {
        /// ZIP code, with or without leading zeros
        zip: String,

        /// Model to run (sarimax or gradient-boosting)
        #[arg(long, default_value = "sarimax")]
        model: String,

        /// Forecast horizon in months
        #[arg(long, default_value = "60")]
        horizon: usize,

        /// Disable caching (always fetch fresh data)
        #[arg(long)]
        no_cache: bool,

        /// Force refresh cached data
        #[arg(long)]
        refresh: bool,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Inspect or clear the data cache
    Cache {
        /// Show cache location and contents
        #[arg(long)]
        stats: bool,

        /// Remove every cached entry
        #[arg(long)]
        clear: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Forecast {
            zip,
            model,
            horizon,
            no_cache,
            refresh,
            format,
        } => {
            let fetch = FetchConfig {
                use_cache: !no_cache,
                force_refresh: refresh,
            };
            let config = ForecastConfig::for_model(model.parse::<ModelKind>()?).with_horizon(horizon);
            forecast_zip(&zip, &config, &fetch, &format).await?;
        }
        Commands::Cache { stats, clear } => {
            manage_cache(stats, clear)?;
        }
    }

    Ok(())
}

async fn forecast_zip(
    zip: &str,
    config: &ForecastConfig,
    fetch: &FetchConfig,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_json = format.eq_ignore_ascii_case("json");

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let series = match load_market(zip, fetch, Some(&pb)).await {
        Ok(series) => series,
        Err(e) => {
            pb.finish_and_clear();
            return Err(with_hint(e));
        }
    };

    pb.set_message(format!("Fitting {} model...", config.model));
    let report = match run_forecast(zip, &series, config) {
        Ok(report) => {
            pb.finish_and_clear();
            report
        }
        Err(e) => {
            pb.finish_and_clear();
            return Err(with_hint(e));
        }
    };

    if is_json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }

    Ok(())
}

fn with_hint(e: PipelineError) -> Box<dyn std::error::Error> {
    if e.is_region_lookup() {
        format!("{}\nTry a different ZIP code.", e).into()
    } else {
        e.into()
    }
}

fn manage_cache(stats: bool, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    if clear {
        let removed = clear_cache()?;
        println!("Cleared {} cached entries.", removed);
    }
    if stats || !clear {
        println!("Foresight cache");
        println!("===============\n");
        print_cache_info();
    }
    Ok(())
}
