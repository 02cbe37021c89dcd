mod analysis;
mod config;
mod data;
mod monitoring;
mod pipeline;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use config::{Config, EnvConfig};
use data::types::LookbackPeriod;
use monitoring::report::{format_summary, SummaryMetrics};
use pipeline::{AnalysisRequest, PipelineError};
use render::chart::ChartSpec;

#[derive(Parser)]
#[command(name = "volproj")]
#[command(about = "Project short-horizon price ranges from historical volatility", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch history, estimate volatility and project the price distribution
    Analyze {
        /// Ticker, exchange-qualified where needed
        #[arg(short, long, default_value = "GGAL.BA")]
        symbol: String,

        /// Lookback period (1mo, 3mo, 6mo, 1y, 2y, 5y)
        #[arg(short, long)]
        period: Option<LookbackPeriod>,

        /// Projection horizon in trading days
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=90))]
        horizon: Option<u32>,

        /// Rolling volatility window
        #[arg(short, long)]
        window: Option<usize>,

        /// Write the chart description as JSON
        #[arg(long)]
        chart_out: Option<PathBuf>,

        /// Label stamped on the chart
        #[arg(long)]
        watermark: Option<String>,

        /// Print the summary metrics as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the supported lookback periods
    Periods,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Periods => {
            for period in LookbackPeriod::ALL {
                println!("{:<4} {}", period, period.label());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Analyze {
            symbol,
            period,
            horizon,
            window,
            chart_out,
            watermark,
            json,
        } => {
            let config = Config::load_or_default(&cli.config)?.with_env(&EnvConfig::load()?);

            let request = AnalysisRequest::new(
                &symbol,
                period.unwrap_or(config.analysis.default_period),
                horizon.unwrap_or(config.analysis.default_horizon_days),
                window.unwrap_or(config.analysis.window),
            );

            let outcome = match request {
                Ok(request) => pipeline::run_with_config(&config.data, &request).await,
                Err(e) => Err(e),
            };

            let report = match outcome {
                Ok(report) => report,
                Err(e) => {
                    report_failure(&symbol, &e);
                    return Ok(ExitCode::FAILURE);
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&SummaryMetrics::from_report(&report))?);
            } else {
                println!("{}", format_summary(&report));
            }

            if let Some(path) = chart_out {
                let chart = ChartSpec::from_report(&report, watermark.or(config.display.watermark));
                chart.write_json(&path)?;
            }

            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Turn a pipeline failure into a message for the user; no chart is produced.
fn report_failure(symbol: &str, err: &PipelineError) {
    use analysis::AnalysisError;
    use data::DataError;

    tracing::error!("Analysis of {} failed: {}", symbol, err);

    let message = match err {
        PipelineError::Data(DataError::NotFound) => {
            format!("No data available for '{}' in the selected period.", symbol)
        }
        PipelineError::Data(DataError::NetworkFailure(_)) => {
            "Could not reach the market data provider. Try again later.".to_string()
        }
        PipelineError::Analysis(AnalysisError::InsufficientHistory { required, available }) => {
            format!(
                "Not enough history for '{}': need {} prices, got {}. Choose a longer period.",
                symbol, required, available
            )
        }
        other => other.to_string(),
    };

    eprintln!("Error: {}", message);
}
