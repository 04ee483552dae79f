use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use store_dedup::app::dedup_use_case::{preview_dedup, run_dedup, DedupSettings};
use store_dedup::app::DedupReport;
use store_dedup::config::Config;
use store_dedup::observability::{init_logging, MetricsRecorder};
use store_dedup::pipeline::processing::normalize::{normalize_name, AddressNormalizer};

#[derive(Parser)]
#[command(name = "store_dedup")]
#[command(about = "Normalize and deduplicate convenience stores collected around Seoul Daiso branches")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./store_dedup.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deduplicate the input table and write the unique stores to a new file
    Dedup {
        /// Input CSV (overrides config)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output CSV; must differ from the input (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Write Prometheus text-format metrics here after the run
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },
    /// Print diagnostics and a dedup preview without writing anything
    Report {
        /// Input CSV (overrides config)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the normalized form of store names and addresses
    Normalize {
        /// Store name to normalize (repeatable)
        #[arg(long = "name")]
        names: Vec<String>,
        /// Address to normalize (repeatable)
        #[arg(long = "address")]
        addresses: Vec<String>,
    },
}

fn print_report(report: &DedupReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config.logging);

    let settings = DedupSettings::from(&config);

    match cli.command {
        Commands::Dedup {
            input,
            output,
            json,
            metrics_out,
        } => {
            let input = input.unwrap_or_else(|| config.input_path.clone());
            let output = output.unwrap_or_else(|| config.output_path.clone());
            let metrics_out = metrics_out.or_else(|| config.metrics.textfile.clone());

            let recorder = if metrics_out.is_some() {
                Some(MetricsRecorder::install()?)
            } else {
                None
            };

            info!("🔄 Deduplicating {} -> {}", input.display(), output.display());
            let result = run_dedup(&input, &output, &settings);

            // Metrics are written for failed runs too
            if let (Some(recorder), Some(path)) = (&recorder, &metrics_out) {
                recorder.write_textfile(path)?;
            }

            let report = result.with_context(|| format!("Dedup of {} failed", input.display()))?;
            print_report(&report, json)?;
        }
        Commands::Report { input, json } => {
            let input = input.unwrap_or_else(|| config.input_path.clone());

            info!("🔍 Previewing {}", input.display());
            let report = preview_dedup(&input, &settings)
                .with_context(|| format!("Report on {} failed", input.display()))?;
            print_report(&report, json)?;
        }
        Commands::Normalize { names, addresses } => {
            let normalizer = AddressNormalizer::with_districts(&settings.districts);

            for name in &names {
                println!("{}\t{}", name, normalize_name(Some(name.as_str())));
            }
            for address in &addresses {
                println!("{}\t{}", address, normalizer.normalize(Some(address.as_str())));
            }
        }
    }

    Ok(())
}
