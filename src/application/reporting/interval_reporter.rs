use crate::domain::errors::ForecastError;
use crate::domain::forecast::{Forecast, ForecastSummary, IntervalForecast};
use crate::domain::ports::ForecastSink;
use anyhow::{Context, Result};
use tracing::info;

/// Turns forecasts into `mean ± z·sqrt(variance)` bands and hands the result
/// to every registered sink.
pub struct IntervalReporter {
    z: f64,
    sinks: Vec<Box<dyn ForecastSink>>,
}

impl IntervalReporter {
    pub fn new(z: f64) -> Self {
        Self {
            z,
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn ForecastSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Fails on the first negative or NaN variance instead of producing a NaN band.
    pub fn enrich(&self, forecasts: &[Forecast]) -> Result<Vec<IntervalForecast>, ForecastError> {
        forecasts
            .iter()
            .map(|f| {
                let variance = f.predicted_variance;
                if variance.is_nan() || variance < 0.0 {
                    return Err(ForecastError::NegativeVariance {
                        timestamp: f.timestamp.to_rfc3339(),
                        variance,
                    });
                }
                let half_width = self.z * variance.sqrt();
                Ok(IntervalForecast {
                    timestamp: f.timestamp,
                    predicted_mean: f.predicted_mean,
                    predicted_variance: variance,
                    upper_bound: f.predicted_mean + half_width,
                    lower_bound: f.predicted_mean - half_width,
                })
            })
            .collect()
    }

    /// Enriches, writes to every sink in registration order and summarizes the run.
    pub fn report(&self, forecasts: &[Forecast]) -> Result<(Vec<IntervalForecast>, ForecastSummary)> {
        let intervals = self.enrich(forecasts)?;

        for sink in &self.sinks {
            sink.write(&intervals)
                .with_context(|| format!("Failed to write forecasts to {}", sink.describe()))?;
        }

        let summary = ForecastSummary::from_intervals(&intervals);
        info!(
            "Reported {} forecasts (z = {}) to {} sinks; mean variance {:.6}, mean band width {:.6}",
            summary.count,
            self.z,
            self.sinks.len(),
            summary.mean_predicted_variance,
            summary.mean_band_width
        );
        Ok((intervals, summary))
    }
}
