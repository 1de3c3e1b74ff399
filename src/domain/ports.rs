use crate::domain::errors::ForecastError;
use crate::domain::forecast::IntervalForecast;
use ndarray::ArrayView2;

/// Mean and variance of the next step's return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanVariance {
    pub mean: f32,
    pub variance: f32,
}

/// Interface for networks that forecast the distribution of the next step.
///
/// Implementations take one window of shape `[window_size, feature_count]`
/// and must return a variance that is never negative.
pub trait VolatilityModel: Send + Sync {
    fn predict(&self, window: ArrayView2<'_, f32>) -> Result<MeanVariance, ForecastError>;

    /// Number of features each window row must carry
    fn input_size(&self) -> usize;

    /// Get model name/type
    fn name(&self) -> &str;

    /// Get model version/id
    fn version(&self) -> &str;
}

/// Destination for a finished forecast run (CSV file, chart, ...).
pub trait ForecastSink {
    fn write(&self, forecasts: &[IntervalForecast]) -> anyhow::Result<()>;

    fn describe(&self) -> String;
}
