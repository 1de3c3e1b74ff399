use crate::config::DataConfig;
use crate::domain::errors::SchemaError;
use crate::domain::market::observation::{Observation, ObservationTable};
use crate::domain::ml::feature_registry::{
    FEATURE_COUNT, FEATURE_NAMES, TIMESTAMP_COLUMN, missing_columns,
};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reads `<prefix>*.csv` shards from a directory into one time-ordered table.
///
/// Every shard header is checked before any row is parsed, so a schema
/// problem in the last shard fails the load before work starts on the first.
pub struct ShardLoader {
    config: DataConfig,
}

/// Column positions of the required fields inside one shard.
struct ColumnIndex {
    timestamp: usize,
    features: [usize; FEATURE_COUNT],
}

impl ShardLoader {
    pub fn new(config: DataConfig) -> Self {
        Self { config }
    }

    /// Shard files sorted by name.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.config.data_dir;
        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to read data directory {:?}", dir))?;

        let mut shards = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to list data directory {:?}", dir))?
                .path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.is_file() && name.starts_with(&self.config.shard_prefix) && name.ends_with(".csv") {
                shards.push(path);
            }
        }
        shards.sort();
        Ok(shards)
    }

    pub fn load(&self) -> Result<ObservationTable> {
        let shards = self.discover()?;
        if shards.is_empty() {
            warn!(
                "No '{}*.csv' shards found in {:?}",
                self.config.shard_prefix, self.config.data_dir
            );
            return Ok(ObservationTable::from_observations(Vec::new()));
        }
        info!("Found {} shards in {:?}", shards.len(), self.config.data_dir);

        let indices = shards
            .iter()
            .map(|path| Self::column_index(path))
            .collect::<Result<Vec<_>>>()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.loader_threads)
            .build()
            .context("Failed to build shard reader pool")?;

        let cutoff = self.config.test_start;
        let per_shard: Vec<Vec<Observation>> = pool.install(|| {
            shards
                .par_iter()
                .zip(indices.par_iter())
                .map(|(path, index)| Self::read_shard(path, index, cutoff))
                .collect::<Result<Vec<_>>>()
        })?;

        let rows: Vec<Observation> = per_shard.into_iter().flatten().collect();
        let table = ObservationTable::from_observations(rows);
        info!(
            "Loaded {} rows at or after {} ({:?} .. {:?})",
            table.len(),
            cutoff,
            table.first_timestamp(),
            table.last_timestamp()
        );
        Ok(table)
    }

    fn column_index(path: &Path) -> Result<ColumnIndex> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to open shard {:?}", path))?;
        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read header of {:?}", path))?
            .clone();

        if headers.is_empty() {
            return Err(SchemaError::MissingHeader {
                file: path.to_path_buf(),
            }
            .into());
        }

        let missing = missing_columns(headers.iter());
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns {
                file: path.to_path_buf(),
                missing,
            }
            .into());
        }

        let position = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
        let mut features = [0usize; FEATURE_COUNT];
        for (slot, name) in features.iter_mut().zip(FEATURE_NAMES.iter()) {
            *slot = position(name);
        }

        Ok(ColumnIndex {
            timestamp: position(TIMESTAMP_COLUMN),
            features,
        })
    }

    fn read_shard(path: &Path, index: &ColumnIndex, cutoff: DateTime<Utc>) -> Result<Vec<Observation>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to open shard {:?}", path))?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for (i, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read row {} of {:?}", i + 1, path))?;
            let invalid = |column: &str, value: &str| SchemaError::InvalidValue {
                file: path.to_path_buf(),
                row: i + 1,
                column: column.to_string(),
                value: value.to_string(),
            };

            let raw_ts = record.get(index.timestamp).unwrap_or("");
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| invalid(TIMESTAMP_COLUMN, raw_ts))?;

            let mut features = [0f32; FEATURE_COUNT];
            for (j, (&col, &name)) in index.features.iter().zip(FEATURE_NAMES.iter()).enumerate() {
                let raw = record.get(col).unwrap_or("");
                features[j] = raw.parse::<f32>().map_err(|_| invalid(name, raw))?;
            }

            if timestamp < cutoff {
                skipped += 1;
                continue;
            }
            rows.push(Observation {
                timestamp,
                features,
            });
        }

        debug!("{:?}: kept {} rows, {} before cutoff", path, rows.len(), skipped);
        Ok(rows)
    }
}

/// Accepts RFC 3339 (`T` or space separated, any offset) or integer epoch nanoseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::<FixedOffset>::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    raw.parse::<i64>().ok().map(DateTime::<Utc>::from_timestamp_nanos)
}
