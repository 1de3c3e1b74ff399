//! Volatility forecast runner
//!
//! Migrates a trained single-head checkpoint into the mean/variance network,
//! rolls it over the test period and writes the forecast CSV and chart.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;
use volcast::application::pipeline::ForecastPipeline;
use volcast::config::PipelineConfig;

#[derive(Parser)]
#[command(author, version, about = "Rolling mean/variance forecasts with confidence bands", long_about = None)]
struct Args {
    /// TOML configuration file (environment variables are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the processed_*.csv shards
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Legacy checkpoint to migrate
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Window size in rows
    #[arg(short, long)]
    window: Option<usize>,

    /// Horizon bounding the last window start
    #[arg(long)]
    horizon: Option<usize>,

    /// Confidence multiplier z
    #[arg(short, long)]
    z: Option<f64>,

    /// Forecast CSV output path
    #[arg(long)]
    output_csv: Option<PathBuf>,

    /// Forecast chart output path (PNG)
    #[arg(long)]
    output_chart: Option<PathBuf>,
}

impl Args {
    fn apply(self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(dir) = self.data_dir {
            config.data.data_dir = dir;
        }
        if let Some(model) = self.model {
            config.model.checkpoint_path = model;
        }
        if let Some(window) = self.window {
            config.forecast.window_size = window;
        }
        if let Some(horizon) = self.horizon {
            config.forecast.horizon = horizon;
        }
        if let Some(z) = self.z {
            config.forecast.confidence_multiplier = z;
        }
        if let Some(csv) = self.output_csv {
            config.output.forecast_csv = csv;
        }
        if let Some(chart) = self.output_chart {
            config.output.forecast_chart = chart;
        }
        config
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::from_env().context("Failed to load configuration from environment")?,
    };
    let config = args.apply(config);
    config.validate().context("Invalid configuration")?;

    info!(
        "Starting volcast: data {:?}, checkpoint {:?}, W={}, H={}, z={}",
        config.data.data_dir,
        config.model.checkpoint_path,
        config.forecast.window_size,
        config.forecast.horizon,
        config.forecast.confidence_multiplier
    );

    let outcome = ForecastPipeline::new(config).run()?;
    info!(
        "Done: {} rows in, {} forecasts out",
        outcome.rows_loaded,
        outcome.forecasts.len()
    );
    Ok(())
}
