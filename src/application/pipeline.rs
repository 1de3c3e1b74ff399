use crate::application::forecasting::RollingForecaster;
use crate::application::ml::model_adapter::ModelAdapter;
use crate::application::reporting::IntervalReporter;
use crate::config::PipelineConfig;
use crate::domain::forecast::{ForecastSummary, IntervalForecast};
use crate::infrastructure::{CheckpointStore, CsvForecastWriter, ForecastChartRenderer, ShardLoader};
use anyhow::{Context, Result};
use tracing::info;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub rows_loaded: usize,
    pub forecasts: Vec<IntervalForecast>,
    pub summary: ForecastSummary,
}

/// Load, adapt, forecast, report. Each stage runs to completion before the
/// next starts and any error ends the run.
pub struct ForecastPipeline {
    config: PipelineConfig,
}

impl ForecastPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<PipelineOutcome> {
        let cfg = &self.config;
        cfg.validate().context("Invalid pipeline configuration")?;
        cfg.model.device.resolve();

        // 1. Data (schema problems surface before any model work)
        let table = ShardLoader::new(cfg.data.clone())
            .load()
            .context("Failed to load observation shards")?;

        // 2. Model
        let model = ModelAdapter::new(cfg.model.clone())
            .adapt_from_path(&cfg.model.checkpoint_path)?;
        if let Some(path) = &cfg.output.migrated_checkpoint {
            CheckpointStore::save(path, &model.state_dict())
                .context("Failed to export migrated checkpoint")?;
        }

        // 3. Forecast
        let forecasts = RollingForecaster::new(&cfg.forecast)
            .forecast(&model, &table)
            .context("Rolling forecast failed")?;

        // 4. Report
        let reporter = IntervalReporter::new(cfg.forecast.confidence_multiplier)
            .with_sink(Box::new(CsvForecastWriter::new(cfg.output.forecast_csv.clone())))
            .with_sink(Box::new(ForecastChartRenderer::new(cfg.output.forecast_chart.clone())));
        let (intervals, summary) = reporter.report(&forecasts)?;

        match (summary.first, summary.last) {
            (Some(first), Some(last)) => info!(
                "Forecast run complete: {} forecasts from {} to {}, mean predicted mean {:.6}",
                summary.count, first, last, summary.mean_predicted_mean
            ),
            _ => info!(
                "Forecast run complete: no forecasts ({} rows, need at least {})",
                table.len(),
                cfg.forecast.window_size + cfg.forecast.horizon
            ),
        }

        Ok(PipelineOutcome {
            rows_loaded: table.len(),
            forecasts: intervals,
            summary,
        })
    }
}
