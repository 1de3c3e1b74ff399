use crate::domain::ml::feature_registry::FEATURE_COUNT;
use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView2, s};

/// One timestamped row of engineered tick features.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub features: [f32; FEATURE_COUNT],
}

/// Time-ordered table of observations backed by a dense feature matrix.
///
/// # Invariants
///
/// - `timestamps.len() == features.nrows()`
/// - timestamps are non-decreasing
#[derive(Debug, Clone)]
pub struct ObservationTable {
    timestamps: Vec<DateTime<Utc>>,
    features: Array2<f32>,
}

impl ObservationTable {
    /// Builds a table from rows, sorting them by timestamp.
    /// The sort is stable so rows sharing a timestamp keep their input order.
    pub fn from_observations(mut rows: Vec<Observation>) -> Self {
        rows.sort_by_key(|row| row.timestamp);

        let mut features = Array2::<f32>::zeros((rows.len(), FEATURE_COUNT));
        let mut timestamps = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            for (j, value) in row.features.iter().enumerate() {
                features[[i, j]] = *value;
            }
            timestamps.push(row.timestamp);
        }

        Self {
            timestamps,
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn timestamp(&self, index: usize) -> Option<DateTime<Utc>> {
        self.timestamps.get(index).copied()
    }

    /// Borrowed `[start, start + len)` slice of the feature matrix.
    pub fn window(&self, start: usize, len: usize) -> Option<ArrayView2<'_, f32>> {
        let end = start.checked_add(len)?;
        if end > self.len() {
            return None;
        }
        Some(self.features.slice(s![start..end, ..]))
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }
}
