//! Market data configuration: where the shards live and which rows to keep.

use super::{VarLookup, parse_var};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_TEST_START: &str = "2024-09-16T08:00:04.248723179Z";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    /// Only `<shard_prefix>*.csv` files are loaded
    pub shard_prefix: String,
    /// Rows strictly before this instant are dropped
    pub test_start: DateTime<Utc>,
    /// Size of the shard reader pool
    pub loader_threads: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/finaltest"),
            shard_prefix: "processed_".to_string(),
            test_start: default_test_start(),
            loader_threads: 4,
        }
    }
}

fn default_test_start() -> DateTime<Utc> {
    DEFAULT_TEST_START
        .parse::<DateTime<Utc>>()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl DataConfig {
    pub fn from_vars(vars: VarLookup<'_>) -> Result<Self> {
        let defaults = Self::default();

        let test_start = match vars("TEST_START") {
            Some(raw) => raw
                .trim()
                .parse::<DateTime<Utc>>()
                .with_context(|| format!("Failed to parse TEST_START '{}'", raw))?,
            None => defaults.test_start,
        };

        Ok(Self {
            data_dir: vars("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            shard_prefix: vars("SHARD_PREFIX").unwrap_or(defaults.shard_prefix),
            test_start,
            loader_threads: parse_var(vars, "LOADER_THREADS", defaults.loader_threads)?,
        })
    }
}
