/// Ordered list of feature columns.
/// This order MUST match exactly with the order used when the network was trained.
/// Any change here is a breaking change for every checkpoint.
pub const FEATURE_NAMES: &[&str] = &[
    "n_delta",
    "log_normalized_returns",
    "returns_squared_log_normalized",
    "rolling_vol_5_log_normalized",
    "rolling_vol_15_log_normalized",
    "rolling_vol_30_log_normalized",
    "rolling_mean_5_log_normalized",
    "rolling_mean_15_log_normalized",
    "rolling_mean_30_log_normalized",
];

pub const FEATURE_COUNT: usize = 9;

/// Name of the event timestamp column in every shard.
pub const TIMESTAMP_COLUMN: &str = "ts_event";

/// Required columns of a shard, timestamp first.
pub fn required_columns() -> Vec<&'static str> {
    std::iter::once(TIMESTAMP_COLUMN)
        .chain(FEATURE_NAMES.iter().copied())
        .collect()
}

/// Returns the required columns absent from `headers`.
pub fn missing_columns<'a, I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = headers.into_iter().map(str::trim).collect();
    required_columns()
        .into_iter()
        .filter(|col| !present.contains(col))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count_matches_names() {
        assert_eq!(FEATURE_NAMES.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_required_columns_start_with_timestamp() {
        let cols = required_columns();
        assert_eq!(cols[0], "ts_event");
        assert_eq!(cols.len(), FEATURE_COUNT + 1);
    }

    #[test]
    fn test_missing_columns_detected() {
        let headers = vec![
            "ts_event",
            "n_delta",
            "log_normalized_returns",
            "returns_squared_log_normalized",
            "rolling_vol_5_log_normalized",
            "rolling_vol_15_log_normalized",
            "rolling_vol_30_log_normalized",
            "rolling_mean_5_log_normalized",
            "rolling_mean_15_log_normalized",
            "symbol",
        ];

        let missing = missing_columns(headers);
        assert_eq!(missing, vec!["rolling_mean_30_log_normalized".to_string()]);
    }
}
