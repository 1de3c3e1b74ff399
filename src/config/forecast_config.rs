//! Rolling forecast parameters.

use super::{VarLookup, parse_var};
use crate::domain::errors::ConfigError;
use anyhow::Result;
use serde::Deserialize;
use statrs::distribution::{ContinuousCDF, Normal};

/// Two-sided 95% multiplier under a normal assumption.
pub const DEFAULT_CONFIDENCE_MULTIPLIER: f64 = 1.96;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    /// Rows per model input
    pub window_size: usize,
    /// Look-ahead bound on the last window start; outputs stay one-step-ahead
    pub horizon: usize,
    /// `z` in `mean ± z·sqrt(variance)`
    pub confidence_multiplier: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            horizon: 5,
            confidence_multiplier: DEFAULT_CONFIDENCE_MULTIPLIER,
        }
    }
}

impl ForecastConfig {
    /// `CONFIDENCE_Z` wins over `CONFIDENCE_LEVEL` when both are set.
    pub fn from_vars(vars: VarLookup<'_>) -> Result<Self> {
        let defaults = Self::default();

        let confidence_multiplier = match (vars("CONFIDENCE_Z"), vars("CONFIDENCE_LEVEL")) {
            (Some(_), _) => parse_var(vars, "CONFIDENCE_Z", defaults.confidence_multiplier)?,
            (None, Some(_)) => z_for_confidence_level(parse_var(vars, "CONFIDENCE_LEVEL", 0.95)?)?,
            (None, None) => defaults.confidence_multiplier,
        };

        Ok(Self {
            window_size: parse_var(vars, "WINDOW_SIZE", defaults.window_size)?,
            horizon: parse_var(vars, "HORIZON", defaults.horizon)?,
            confidence_multiplier,
        })
    }
}

/// Two-sided standard normal quantile for a confidence level in `(0, 1)`.
pub fn z_for_confidence_level(level: f64) -> Result<f64, ConfigError> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ConfigError::InvalidValue {
            field: "confidence_level".to_string(),
            value: level.to_string(),
        });
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| ConfigError::InvalidValue {
        field: "confidence_level".to_string(),
        value: e.to_string(),
    })?;
    Ok(normal.inverse_cdf(0.5 + level / 2.0))
}
