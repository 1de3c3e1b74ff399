use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use volcast::application::ml::dual_head_model::DualHeadVolatilityModel;
use volcast::application::ml::legacy_model::LegacyLstmRegressor;
use volcast::application::pipeline::ForecastPipeline;
use volcast::config::{ComputeDevice, PipelineConfig};
use volcast::domain::errors::SchemaError;
use volcast::domain::forecast::IntervalForecast;
use volcast::infrastructure::CheckpointStore;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

const HEADER: &str = "ts_event,n_delta,log_normalized_returns,returns_squared_log_normalized,\
rolling_vol_5_log_normalized,rolling_vol_15_log_normalized,rolling_vol_30_log_normalized,\
rolling_mean_5_log_normalized,rolling_mean_15_log_normalized,rolling_mean_30_log_normalized";

const CUTOFF_SECS: i64 = 1_726_473_600;

fn create_test_dir() -> PathBuf {
    let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "volcast_pipeline_test_{}_{}",
        std::process::id(),
        unique_id
    ));
    fs::create_dir_all(&dir).expect("Failed to create test temp dir");
    dir
}

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

fn row(secs: i64) -> String {
    let values: Vec<String> = (0..9)
        .map(|j| format!("{:.4}", ((secs + j) as f64 * 0.37).sin()))
        .collect();
    format!("{},{}", ts(secs).to_rfc3339(), values.join(","))
}

/// Writes `rows` observations after the cutoff (plus three before it),
/// split across two shards with interleaved timestamps.
fn write_shards(dir: &Path, rows: i64) {
    let mut even = vec![HEADER.to_string()];
    let mut odd = vec![HEADER.to_string()];
    for i in -3..rows {
        let line = row(CUTOFF_SECS + i * 10);
        if i.rem_euclid(2) == 0 {
            even.push(line);
        } else {
            odd.push(line);
        }
    }
    fs::write(dir.join("processed_a.csv"), even.join("\n")).unwrap();
    fs::write(dir.join("processed_b.csv"), odd.join("\n")).unwrap();
}

fn config(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.data.data_dir = dir.join("shards");
    config.data.test_start = ts(CUTOFF_SECS);
    config.data.loader_threads = 2;
    config.model.checkpoint_path = dir.join("best_model.json");
    config.model.hidden_size = 4;
    config.model.head_hidden_size = 8;
    config.model.device = ComputeDevice::Cpu;
    config.model.init_seed = Some(7);
    config.output.forecast_csv = dir.join("out").join("forecasts.csv");
    config.output.forecast_chart = dir.join("out").join("forecast.png");
    config
}

fn write_checkpoint(config: &PipelineConfig) {
    let legacy = LegacyLstmRegressor::new(
        config.model.encoder_shape(),
        config.model.legacy_output_size,
        &mut StdRng::seed_from_u64(2024),
    );
    CheckpointStore::save(&config.model.checkpoint_path, &legacy.state_dict()).unwrap();
}

#[test]
fn test_end_to_end_forty_rows() {
    let dir = create_test_dir();
    fs::create_dir_all(dir.join("shards")).unwrap();
    write_shards(&dir.join("shards"), 40);

    let mut config = config(&dir);
    config.output.migrated_checkpoint = Some(dir.join("out").join("migrated.json"));
    write_checkpoint(&config);

    let outcome = ForecastPipeline::new(config.clone()).run().unwrap();

    assert_eq!(outcome.rows_loaded, 40);
    assert_eq!(outcome.forecasts.len(), 6);
    let stamps: Vec<i64> = outcome.forecasts.iter().map(|f| f.timestamp.timestamp()).collect();
    let expected: Vec<i64> = (30..36).map(|i| CUTOFF_SECS + i * 10).collect();
    assert_eq!(stamps, expected);

    for f in &outcome.forecasts {
        assert!(f.predicted_variance >= 0.0);
        assert!(f.upper_bound >= f.predicted_mean && f.predicted_mean >= f.lower_bound);
        let gap = f.upper_bound - f.lower_bound;
        assert!((gap - 2.0 * 1.96 * f.predicted_variance.sqrt()).abs() < 1e-9);
    }

    let mut reader = csv::Reader::from_path(&config.output.forecast_csv).unwrap();
    let written: Vec<IntervalForecast> = reader.deserialize().map(|r| r.unwrap()).collect();
    assert_eq!(written, outcome.forecasts);

    let chart = image::open(&config.output.forecast_chart).unwrap().to_rgb8();
    assert_eq!(chart.dimensions(), (1500, 700));

    let migrated = CheckpointStore::load(&dir.join("out").join("migrated.json")).unwrap();
    let mut reloaded = DualHeadVolatilityModel::new(
        config.model.encoder_shape(),
        config.model.head_hidden_size,
        &mut StdRng::seed_from_u64(1),
    );
    reloaded.load_state_dict(&migrated).unwrap();

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_short_table_writes_empty_outputs() {
    let dir = create_test_dir();
    fs::create_dir_all(dir.join("shards")).unwrap();
    write_shards(&dir.join("shards"), 34);

    let config = config(&dir);
    write_checkpoint(&config);

    let outcome = ForecastPipeline::new(config.clone()).run().unwrap();
    assert_eq!(outcome.rows_loaded, 34);
    assert!(outcome.forecasts.is_empty());
    assert_eq!(outcome.summary.count, 0);

    let content = fs::read_to_string(&config.output.forecast_csv).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(config.output.forecast_chart.exists());

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_missing_column_fails_before_model_work() {
    let dir = create_test_dir();
    let shards = dir.join("shards");
    fs::create_dir_all(&shards).unwrap();
    write_shards(&shards, 40);

    // Second-to-last column dropped from a third shard
    let header: Vec<&str> = HEADER.split(',').filter(|c| *c != "rolling_mean_15_log_normalized").collect();
    fs::write(shards.join("processed_c.csv"), header.join(",")).unwrap();

    // No checkpoint on disk: reaching the model stage would fail differently
    let config = config(&dir);
    let err = ForecastPipeline::new(config.clone()).run().unwrap_err();

    let schema = err
        .chain()
        .find_map(|e| e.downcast_ref::<SchemaError>())
        .unwrap_or_else(|| panic!("expected schema error, got {:#}", err));
    match schema {
        SchemaError::MissingColumns { file, missing } => {
            assert!(file.ends_with("processed_c.csv"));
            assert_eq!(missing, &vec!["rolling_mean_15_log_normalized".to_string()]);
        }
        other => panic!("unexpected schema error: {:?}", other),
    }
    assert!(!config.output.forecast_csv.exists());

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_checkpoint_shape_mismatch_is_reported() {
    let dir = create_test_dir();
    fs::create_dir_all(dir.join("shards")).unwrap();
    write_shards(&dir.join("shards"), 40);

    let config = config(&dir);
    let mut wider = config.clone();
    wider.model.hidden_size = 6;
    write_checkpoint(&wider);

    let err = ForecastPipeline::new(config.clone()).run().unwrap_err();
    assert!(format!("{:#}", err).contains("Shape mismatch"));
    assert!(!config.output.forecast_csv.exists());

    fs::remove_dir_all(dir).ok();
}
