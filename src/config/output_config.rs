use super::VarLookup;
use serde::Deserialize;
use std::path::PathBuf;

/// Output artifact locations. Existing files are overwritten.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub forecast_csv: PathBuf,
    pub forecast_chart: PathBuf,
    /// When set, the migrated dual-head state dict is written here
    pub migrated_checkpoint: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            forecast_csv: PathBuf::from("output/garch_like_forecasts.csv"),
            forecast_chart: PathBuf::from("output/garch_like_forecast.png"),
            migrated_checkpoint: None,
        }
    }
}

impl OutputConfig {
    pub fn from_vars(vars: VarLookup<'_>) -> Self {
        let defaults = Self::default();
        Self {
            forecast_csv: vars("FORECAST_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.forecast_csv),
            forecast_chart: vars("FORECAST_CHART")
                .map(PathBuf::from)
                .unwrap_or(defaults.forecast_chart),
            migrated_checkpoint: vars("MIGRATED_MODEL_PATH").map(PathBuf::from),
        }
    }
}
