use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading market data shards
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("Shard {file:?} is missing required columns: {missing:?}")]
    MissingColumns { file: PathBuf, missing: Vec<String> },

    #[error("Shard {file:?} row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        file: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("Shard {file:?} has no header row")]
    MissingHeader { file: PathBuf },
}

/// Errors raised while loading checkpoints or moving parameters between networks
#[derive(Debug, Error, PartialEq)]
pub enum TransferError {
    #[error("Parameter '{name}' not found in {side}")]
    MissingParameter { name: String, side: &'static str },

    #[error("Unexpected parameter '{name}' in state dict")]
    UnexpectedParameter { name: String },

    #[error("Shape mismatch for '{source_name}' -> '{target_name}': {source_shape:?} vs {target_shape:?}")]
    ShapeMismatch {
        source_name: String,
        target_name: String,
        source_shape: Vec<usize>,
        target_shape: Vec<usize>,
    },

    #[error("Tensor '{name}' declares shape {shape:?} but holds {len} values")]
    CorruptTensor {
        name: String,
        shape: Vec<usize>,
        len: usize,
    },
}

/// Errors raised during rolling inference and interval reporting
#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    #[error("Window has shape {rows}x{cols}, model expects {expected_cols} features")]
    WindowShape {
        rows: usize,
        cols: usize,
        expected_cols: usize,
    },

    #[error("Negative variance {variance} at {timestamp}")]
    NegativeVariance { timestamp: String, variance: f64 },
}

/// Errors raised by configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("{field} must be > 0")]
    MustBePositive { field: String },

    #[error("input_size = {actual} does not match the {expected} registered features")]
    FeatureCountMismatch { expected: usize, actual: usize },
}
