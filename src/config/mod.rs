//! Configuration module for volcast.
//!
//! Configuration is loaded from environment variables (optionally seeded from a
//! `.env` file) or from a TOML file, organized by pipeline stage: Data, Model,
//! Forecast and Output. The resulting [`PipelineConfig`] is passed explicitly to
//! every component.

mod data_config;
mod forecast_config;
mod model_config;
mod output_config;

pub use data_config::DataConfig;
pub use forecast_config::{DEFAULT_CONFIDENCE_MULTIPLIER, ForecastConfig, z_for_confidence_level};
pub use model_config::{ComputeDevice, ModelConfig};
pub use output_config::OutputConfig;

use crate::domain::errors::ConfigError;
use crate::domain::ml::feature_registry::FEATURE_COUNT;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Reads a variable by name. `env::var` in production, a map in tests.
pub type VarLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn parse_var<T>(vars: VarLookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match vars(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}", key)),
        None => Ok(default),
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub forecast: ForecastConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&|key| env::var(key).ok())
    }

    pub fn from_vars(vars: VarLookup<'_>) -> Result<Self> {
        let config = Self {
            data: DataConfig::from_vars(vars).context("Failed to load data config")?,
            model: ModelConfig::from_vars(vars).context("Failed to load model config")?,
            forecast: ForecastConfig::from_vars(vars).context("Failed to load forecast config")?,
            output: OutputConfig::from_vars(vars),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file. Missing sections and keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: PipelineConfig =
            toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("window_size", self.forecast.window_size)?;
        positive("horizon", self.forecast.horizon)?;
        positive("hidden_size", self.model.hidden_size)?;
        positive("num_layers", self.model.num_layers)?;
        positive("head_hidden_size", self.model.head_hidden_size)?;
        positive("legacy_output_size", self.model.legacy_output_size)?;
        positive("loader_threads", self.data.loader_threads)?;

        if self.model.input_size != FEATURE_COUNT {
            return Err(ConfigError::FeatureCountMismatch {
                expected: FEATURE_COUNT,
                actual: self.model.input_size,
            });
        }

        let z = self.forecast.confidence_multiplier;
        if !z.is_finite() || z <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "confidence_multiplier".to_string(),
                value: z.to_string(),
            });
        }

        Ok(())
    }
}

fn positive(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}
