//! CLI entry point for the car listings analyzer.
//!
//! Provides subcommands for the full report and for the individual brand,
//! model, damage and descriptive tables.

use anyhow::Result;
use car_listings::analyzers::analyzer::Pipeline;
use car_listings::analyzers::damage::{damage_deltas, outliers};
use car_listings::analyzers::types::Baseline;
use car_listings::{
    analyzers::aggregate::{brand_aggregates, model_aggregates},
    config::AnalysisConfig,
    fetch::load_source,
    output::{
        print_pretty, render_brands, render_damage, render_description, render_models,
        render_text, write_json, write_table,
    },
    stats::describe_listings,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "car_listings")]
#[command(about = "A tool to analyze used-car listing exports", long_about = None)]
struct Cli {
    /// JSON file with analysis settings (falls back to CAR_LISTINGS_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Stop at the first malformed record instead of skipping it
    #[arg(long, global = true, default_value_t = false)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage and print the full report
    Report {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Mean price and mileage for brands above the share threshold
    Brands {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to export the table to
        #[arg(long)]
        csv: Option<String>,
    },
    /// Mean price and mileage for the most common brand/model combinations
    Models {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to export the table to
        #[arg(long)]
        csv: Option<String>,
    },
    /// Price deltas of damaged listings against their brand/model baseline
    Damage {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Only show names where damaged listings are dearer
        #[arg(long, default_value_t = false)]
        outliers: bool,

        /// Compare against undamaged listings only
        #[arg(long, default_value_t = false)]
        corrected: bool,

        /// CSV file to export the table to
        #[arg(long)]
        csv: Option<String>,
    },
    /// Summaries of price, mileage, registration year and listing dates
    Describe {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/car_listings.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("car_listings.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut config = AnalysisConfig::resolve(cli.config.as_deref())?;
    config.strict |= cli.strict;
    let pipeline = Pipeline::new(config);

    match cli.command {
        Commands::Report {
            source,
            format,
            output,
        } => {
            let bytes = load_source(&source)?;
            let report = pipeline.run(&bytes)?;
            print_pretty(&report);

            match format {
                Format::Json => write_json(&report, output.as_deref())?,
                Format::Text => {
                    let text = render_text(&report);
                    match output {
                        Some(path) => std::fs::write(&path, text)?,
                        None => print!("{text}"),
                    }
                }
            }
        }
        Commands::Brands { source, csv } => {
            let prepared = pipeline.prepare(&load_source(&source)?)?;
            let brands = brand_aggregates(&prepared.listings, pipeline.config().min_share)?;

            print!("{}", render_brands(brands.values()));
            if let Some(path) = csv {
                write_table(&path, brands.values())?;
                info!(path = %path, rows = brands.len(), "Brand table exported");
            }
        }
        Commands::Models { source, csv } => {
            let prepared = pipeline.prepare(&load_source(&source)?)?;
            let models = model_aggregates(&prepared.listings, pipeline.config().min_share)?;

            print!("{}", render_models(models.values()));
            if let Some(path) = csv {
                write_table(&path, models.values())?;
                info!(path = %path, rows = models.len(), "Model table exported");
            }
        }
        Commands::Damage {
            source,
            outliers: only_outliers,
            corrected,
            csv,
        } => {
            let prepared = pipeline.prepare(&load_source(&source)?)?;
            let baseline = if corrected {
                Baseline::UndamagedOnly
            } else {
                Baseline::AllListings
            };
            let mut deltas = damage_deltas(&prepared.listings, baseline)?;
            if only_outliers {
                deltas = outliers(&deltas);
            }

            print!("{}", render_damage(deltas.values()));
            if let Some(path) = csv {
                write_table(&path, deltas.values())?;
                info!(path = %path, rows = deltas.len(), "Damage table exported");
            }
        }
        Commands::Describe { source } => {
            let prepared = pipeline.prepare(&load_source(&source)?)?;
            let description =
                describe_listings(&prepared.listings, pipeline.config().histogram_bins);
            print!("{}", render_description(&description));
        }
    }

    Ok(())
}
