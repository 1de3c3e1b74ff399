use super::dual_head_model::{self, DualHeadVolatilityModel};
use super::legacy_model::{self, LegacyLstmRegressor};
use super::weight_transfer::{ParameterMapping, transfer_parameters};
use crate::config::ModelConfig;
use crate::domain::errors::TransferError;
use crate::domain::ml::tensor::StateDict;
use crate::domain::ports::VolatilityModel;
use crate::infrastructure::persistence::CheckpointStore;
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use tracing::info;

/// Migrates a trained single-head checkpoint into the dual-head network.
///
/// The recurrent encoder is copied tensor for tensor; both heads keep the
/// values they were initialized with.
pub struct ModelAdapter {
    config: ModelConfig,
}

impl ModelAdapter {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    fn rng(&self) -> StdRng {
        match self.config.init_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Rebuilds the legacy regressor from its checkpoint, strictly.
    pub fn load_legacy(&self, checkpoint: &StateDict) -> Result<LegacyLstmRegressor, TransferError> {
        let mut model = LegacyLstmRegressor::new(
            self.config.encoder_shape(),
            self.config.legacy_output_size,
            &mut self.rng(),
        );
        model.load_state_dict(checkpoint)?;
        Ok(model)
    }

    pub fn adapt(&self, checkpoint: &StateDict) -> Result<DualHeadVolatilityModel, TransferError> {
        let shape = self.config.encoder_shape();
        let mut model = DualHeadVolatilityModel::new(shape, self.config.head_hidden_size, &mut self.rng());

        let mapping = ParameterMapping::encoder(
            legacy_model::ENCODER_MODULE,
            dual_head_model::ENCODER_MODULE,
            &shape,
        );
        let report = transfer_parameters(checkpoint, &model.state_dict(), &mapping)?;
        model.load_state_dict(&report.state)?;

        info!(
            "Transferred {} encoder tensors ({} values) into {} {}",
            report.tensors,
            report.values,
            model.name(),
            model.version(),
        );
        Ok(model)
    }

    /// Loads the legacy checkpoint strictly, then migrates its encoder.
    pub fn adapt_from_path(&self, path: &Path) -> Result<DualHeadVolatilityModel> {
        let checkpoint = CheckpointStore::load(path)?;
        let legacy = self
            .load_legacy(&checkpoint)
            .with_context(|| format!("Checkpoint {:?} does not match the legacy network", path))?;
        info!(
            "Loaded legacy regressor ({} outputs) from {:?}",
            legacy.output_size(),
            path
        );

        self.adapt(&legacy.state_dict())
            .with_context(|| format!("Failed to adapt checkpoint {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::encoder_shape::EncoderShape;
    use ndarray::Array2;

    fn config(seed: u64) -> ModelConfig {
        ModelConfig {
            hidden_size: 4,
            head_hidden_size: 8,
            init_seed: Some(seed),
            ..ModelConfig::default()
        }
    }

    fn trained_checkpoint(seed: u64) -> (LegacyLstmRegressor, StateDict) {
        let cfg = config(seed);
        let legacy = LegacyLstmRegressor::new(
            cfg.encoder_shape(),
            cfg.legacy_output_size,
            &mut StdRng::seed_from_u64(seed),
        );
        let state = legacy.state_dict();
        (legacy, state)
    }

    #[test]
    fn test_encoder_output_identical_after_transfer() {
        let (legacy, checkpoint) = trained_checkpoint(11);
        let adapted = ModelAdapter::new(config(99)).adapt(&checkpoint).unwrap();

        let x = Array2::from_shape_fn((30, 9), |(t, j)| ((t * 9 + j) as f32 * 0.13).sin());
        assert_eq!(
            legacy.encoder().last_step(x.view()),
            adapted.encoder().last_step(x.view())
        );
        assert_eq!(legacy.encoder().encode(x.view()), adapted.encoder().encode(x.view()));
    }

    #[test]
    fn test_heads_keep_fresh_initialization() {
        let (_, checkpoint) = trained_checkpoint(11);
        let adapted = ModelAdapter::new(config(99)).adapt(&checkpoint).unwrap();

        let fresh = DualHeadVolatilityModel::new(
            config(99).encoder_shape(),
            8,
            &mut StdRng::seed_from_u64(99),
        );
        let (a, f) = (adapted.state_dict(), fresh.state_dict());
        for key in ["mean_head.0.weight", "mean_head.2.bias", "variance_head.0.bias", "variance_head.2.weight"] {
            assert_eq!(a[key], f[key], "{} changed", key);
        }
        assert_ne!(a["lstm.weight_ih_l0"], f["lstm.weight_ih_l0"]);
    }

    #[test]
    fn test_adapt_rejects_mismatched_hidden_size() {
        let legacy = LegacyLstmRegressor::new(
            EncoderShape {
                hidden_size: 6,
                ..config(1).encoder_shape()
            },
            5,
            &mut StdRng::seed_from_u64(1),
        );

        let err = ModelAdapter::new(config(2)).adapt(&legacy.state_dict()).unwrap_err();
        assert!(matches!(err, TransferError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_load_legacy_strict() {
        let (legacy, mut checkpoint) = trained_checkpoint(5);
        let adapter = ModelAdapter::new(config(6));

        let loaded = adapter.load_legacy(&checkpoint).unwrap();
        let x = Array2::from_elem((10, 9), 0.25f32);
        assert_eq!(loaded.forward(x.view()), legacy.forward(x.view()));

        checkpoint.remove("fc3.bias");
        assert_eq!(
            adapter.load_legacy(&checkpoint).unwrap_err(),
            TransferError::MissingParameter {
                name: "fc3.bias".to_string(),
                side: "state dict"
            }
        );
    }
}
