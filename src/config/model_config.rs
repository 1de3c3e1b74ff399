//! Network geometry, checkpoint location and compute device.

use super::{VarLookup, parse_var};
use crate::domain::ml::encoder_shape::EncoderShape;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Requested compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    Cuda,
    Cpu,
}

impl FromStr for ComputeDevice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cuda" | "gpu" => Ok(ComputeDevice::Cuda),
            "cpu" => Ok(ComputeDevice::Cpu),
            _ => anyhow::bail!("Invalid DEVICE: {}. Must be 'cuda' or 'cpu'", s),
        }
    }
}

impl ComputeDevice {
    /// Device the forward passes will actually run on. Only the CPU backend
    /// is built in, so an accelerator request falls back to it.
    pub fn resolve(self) -> ComputeDevice {
        let resolved = match self {
            ComputeDevice::Cuda => {
                warn!("CUDA requested but no accelerator backend is available, falling back to CPU");
                ComputeDevice::Cpu
            }
            ComputeDevice::Cpu => ComputeDevice::Cpu,
        };
        info!("Using device: {:?}", resolved);
        resolved
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Legacy single-head checkpoint (JSON state dict)
    pub checkpoint_path: PathBuf,
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub bidirectional: bool,
    /// Width of the hidden layer inside each output head
    pub head_hidden_size: usize,
    /// Outputs of the legacy regressor's final layer
    pub legacy_output_size: usize,
    pub device: ComputeDevice,
    /// Seed for the freshly initialized heads; random when unset
    pub init_seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: PathBuf::from("models/best_model.json"),
            input_size: 9,
            hidden_size: 256,
            num_layers: 2,
            bidirectional: true,
            head_hidden_size: 128,
            legacy_output_size: 5,
            device: ComputeDevice::Cuda,
            init_seed: None,
        }
    }
}

impl ModelConfig {
    pub fn from_vars(vars: VarLookup<'_>) -> Result<Self> {
        let defaults = Self::default();

        let init_seed = match vars("INIT_SEED") {
            Some(_) => Some(parse_var(vars, "INIT_SEED", 0u64)?),
            None => defaults.init_seed,
        };

        Ok(Self {
            checkpoint_path: vars("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.checkpoint_path),
            input_size: parse_var(vars, "INPUT_SIZE", defaults.input_size)?,
            hidden_size: parse_var(vars, "HIDDEN_SIZE", defaults.hidden_size)?,
            num_layers: parse_var(vars, "NUM_LAYERS", defaults.num_layers)?,
            bidirectional: parse_var(vars, "BIDIRECTIONAL", defaults.bidirectional)?,
            head_hidden_size: parse_var(vars, "HEAD_HIDDEN_SIZE", defaults.head_hidden_size)?,
            legacy_output_size: parse_var(vars, "LEGACY_OUTPUT_SIZE", defaults.legacy_output_size)?,
            device: match vars("DEVICE") {
                Some(raw) => ComputeDevice::from_str(raw.trim())?,
                None => defaults.device,
            },
            init_seed,
        })
    }

    pub fn encoder_shape(&self) -> EncoderShape {
        EncoderShape {
            input_size: self.input_size,
            hidden_size: self.hidden_size,
            num_layers: self.num_layers,
            bidirectional: self.bidirectional,
        }
    }
}
