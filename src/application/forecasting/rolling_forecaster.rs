use crate::config::ForecastConfig;
use crate::domain::errors::ForecastError;
use crate::domain::forecast::Forecast;
use crate::domain::market::ObservationTable;
use crate::domain::ports::VolatilityModel;
use std::ops::Range;
use tracing::{debug, info};

/// Slides a fixed-size window over the observation table and asks the model
/// for the next step's mean and variance at every position.
///
/// The window starting at `i` covers rows `[i, i + W)` and its forecast is
/// stamped with row `i + W`. The horizon only bounds how far the last window
/// may start: `i` runs over `[0, N - W - H]`.
pub struct RollingForecaster {
    window_size: usize,
    horizon: usize,
}

impl RollingForecaster {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            window_size: config.window_size,
            horizon: config.horizon,
        }
    }

    /// Valid window start indices for a table of `rows` observations.
    pub fn window_starts(&self, rows: usize) -> Range<usize> {
        match rows.checked_sub(self.window_size + self.horizon) {
            Some(last) => 0..last + 1,
            None => 0..0,
        }
    }

    pub fn expected_count(&self, rows: usize) -> usize {
        self.window_starts(rows).len()
    }

    pub fn forecast(
        &self,
        model: &dyn VolatilityModel,
        table: &ObservationTable,
    ) -> Result<Vec<Forecast>, ForecastError> {
        let starts = self.window_starts(table.len());
        let total = starts.len();
        info!(
            "Forecasting {} windows (W={}, H={}) over {} rows with {} {}",
            total,
            self.window_size,
            self.horizon,
            table.len(),
            model.name(),
            model.version()
        );

        let mut forecasts = Vec::with_capacity(total);
        for start in starts {
            let target = start + self.window_size;
            let (Some(window), Some(timestamp)) =
                (table.window(start, self.window_size), table.timestamp(target))
            else {
                break;
            };

            let output = model.predict(window)?;
            forecasts.push(Forecast {
                timestamp,
                predicted_mean: f64::from(output.mean),
                predicted_variance: f64::from(output.variance),
            });

            if (start + 1) % 1000 == 0 {
                debug!("Forecast {}/{}", start + 1, total);
            }
        }

        info!("Produced {} forecasts", forecasts.len());
        Ok(forecasts)
    }
}
