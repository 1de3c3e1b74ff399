use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One-step-ahead model output aligned to the observation after its window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    pub timestamp: DateTime<Utc>,
    pub predicted_mean: f64,
    pub predicted_variance: f64,
}

/// Forecast enriched with its symmetric confidence band.
/// Field order is the column order of the forecast CSV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalForecast {
    pub timestamp: DateTime<Utc>,
    pub predicted_mean: f64,
    pub predicted_variance: f64,
    pub upper_bound: f64,
    pub lower_bound: f64,
}

impl IntervalForecast {
    pub fn band_width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Aggregate view of a forecast run, logged after reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSummary {
    pub count: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
    pub mean_predicted_mean: f64,
    pub mean_predicted_variance: f64,
    pub mean_band_width: f64,
}

impl ForecastSummary {
    pub fn from_intervals(intervals: &[IntervalForecast]) -> Self {
        let count = intervals.len();
        if count == 0 {
            return Self {
                count,
                first: None,
                last: None,
                mean_predicted_mean: 0.0,
                mean_predicted_variance: 0.0,
                mean_band_width: 0.0,
            };
        }

        let n = count as f64;
        Self {
            count,
            first: intervals.first().map(|f| f.timestamp),
            last: intervals.last().map(|f| f.timestamp),
            mean_predicted_mean: intervals.iter().map(|f| f.predicted_mean).sum::<f64>() / n,
            mean_predicted_variance: intervals.iter().map(|f| f.predicted_variance).sum::<f64>()
                / n,
            mean_band_width: intervals.iter().map(IntervalForecast::band_width).sum::<f64>() / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn interval(secs: i64, mean: f64, half_width: f64) -> IntervalForecast {
        IntervalForecast {
            timestamp: Utc.timestamp_opt(secs, 0).single().unwrap(),
            predicted_mean: mean,
            predicted_variance: 1.0,
            upper_bound: mean + half_width,
            lower_bound: mean - half_width,
        }
    }

    #[test]
    fn test_summary_of_empty_run() {
        let summary = ForecastSummary::from_intervals(&[]);
        assert_eq!(summary.count, 0);
        assert!(summary.first.is_none());
        assert_eq!(summary.mean_band_width, 0.0);
    }

    #[test]
    fn test_summary_averages() {
        let summary = ForecastSummary::from_intervals(&[interval(10, 1.0, 1.0), interval(20, 3.0, 2.0)]);

        assert_eq!(summary.count, 2);
        assert_eq!(summary.first.unwrap().timestamp(), 10);
        assert_eq!(summary.last.unwrap().timestamp(), 20);
        assert!((summary.mean_predicted_mean - 2.0).abs() < 1e-12);
        assert!((summary.mean_band_width - 3.0).abs() < 1e-12);
    }
}
