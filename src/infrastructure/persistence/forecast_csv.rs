use crate::domain::forecast::IntervalForecast;
use crate::domain::ports::ForecastSink;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Writes forecasts to CSV with columns
/// `timestamp,predicted_mean,predicted_variance,upper_bound,lower_bound`.
/// The file is replaced on every run.
pub struct CsvForecastWriter {
    output_path: PathBuf,
}

impl CsvForecastWriter {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }
}

impl ForecastSink for CsvForecastWriter {
    fn write(&self, forecasts: &[IntervalForecast]) -> Result<()> {
        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {:?}", parent))?;
        }

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(true)
            .from_path(&self.output_path)
            .with_context(|| format!("Failed to open forecast file {:?}", self.output_path))?;

        if forecasts.is_empty() {
            wtr.write_record([
                "timestamp",
                "predicted_mean",
                "predicted_variance",
                "upper_bound",
                "lower_bound",
            ])
            .context("Failed to write forecast header")?;
        }
        for forecast in forecasts {
            wtr.serialize(forecast)
                .context("Failed to serialize forecast row")?;
        }
        wtr.flush().context("Failed to flush forecast CSV writer")?;

        info!("Wrote {} forecasts to {:?}", forecasts.len(), self.output_path);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("CSV {:?}", self.output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("volcast_csv_test_{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_header_and_rows() {
        let path = temp_path("forecasts.csv");
        let writer = CsvForecastWriter::new(path.clone());
        let forecast = IntervalForecast {
            timestamp: "2024-09-16T08:00:04.248723179Z".parse::<DateTime<Utc>>().unwrap(),
            predicted_mean: 0.5,
            predicted_variance: 0.25,
            upper_bound: 1.48,
            lower_bound: -0.48,
        };
        writer.write(&[forecast]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,predicted_mean,predicted_variance,upper_bound,lower_bound")
        );
        assert_eq!(
            lines.next(),
            Some("2024-09-16T08:00:04.248723179Z,0.5,0.25,1.48,-0.48")
        );

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let parsed: Vec<IntervalForecast> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(parsed, vec![forecast]);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_empty_run_still_writes_header() {
        let path = temp_path("empty.csv");
        CsvForecastWriter::new(path.clone()).write(&[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.trim(),
            "timestamp,predicted_mean,predicted_variance,upper_bound,lower_bound"
        );
        fs::remove_file(path).ok();
    }
}
