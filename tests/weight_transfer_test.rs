use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use volcast::application::ml::dual_head_model::DualHeadVolatilityModel;
use volcast::application::ml::legacy_model::LegacyLstmRegressor;
use volcast::application::ml::lstm::EncoderShape;
use volcast::application::ml::model_adapter::ModelAdapter;
use volcast::application::ml::weight_transfer::{ParameterMapping, transfer_parameters};
use volcast::config::ModelConfig;
use volcast::domain::errors::TransferError;
use volcast::domain::ports::VolatilityModel;
use volcast::infrastructure::CheckpointStore;

fn model_config(seed: u64) -> ModelConfig {
    ModelConfig {
        hidden_size: 6,
        num_layers: 2,
        head_hidden_size: 8,
        init_seed: Some(seed),
        ..ModelConfig::default()
    }
}

fn window() -> Array2<f32> {
    Array2::from_shape_fn((30, 9), |(t, j)| ((t as f32) * 0.21 - (j as f32) * 0.4).cos())
}

#[test]
fn test_checkpoint_file_migrates_encoder_exactly() {
    let dir = std::env::temp_dir().join(format!("volcast_transfer_test_{}", std::process::id()));
    let path = dir.join("best_model.json");

    let cfg = model_config(3);
    let legacy = LegacyLstmRegressor::new(cfg.encoder_shape(), 5, &mut StdRng::seed_from_u64(17));
    CheckpointStore::save(&path, &legacy.state_dict()).unwrap();

    let adapted = ModelAdapter::new(cfg).adapt_from_path(&path).unwrap();
    let x = window();
    assert_eq!(legacy.encoder().encode(x.view()), adapted.encoder().encode(x.view()));

    let out = adapted.predict(x.view()).unwrap();
    assert!(out.variance >= 0.0);

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_failed_transfer_leaves_target_untouched() {
    let shape = model_config(1).encoder_shape();
    let source = LegacyLstmRegressor::new(
        EncoderShape {
            num_layers: 1,
            ..shape
        },
        5,
        &mut StdRng::seed_from_u64(1),
    );
    let target = DualHeadVolatilityModel::new(shape, 8, &mut StdRng::seed_from_u64(2));
    let before = target.state_dict();

    let mapping = ParameterMapping::encoder("lstm", "lstm", &shape);
    let err = transfer_parameters(&source.state_dict(), &before, &mapping).unwrap_err();

    assert!(matches!(
        err,
        TransferError::MissingParameter { side: "source", .. }
    ));
    assert_eq!(target.state_dict(), before);
}

#[test]
fn test_mapping_covers_every_encoder_tensor() {
    let shape = model_config(1).encoder_shape();
    let target = DualHeadVolatilityModel::new(shape, 8, &mut StdRng::seed_from_u64(5));
    let state = target.state_dict();

    let mapping = ParameterMapping::encoder("lstm", "lstm", &shape);
    let encoder_keys = state.keys().filter(|k| k.starts_with("lstm.")).count();
    assert_eq!(mapping.len(), encoder_keys);
    for (_, target_key) in mapping.keys() {
        assert!(state.contains_key(&target_key), "{} not in target", target_key);
    }
}
