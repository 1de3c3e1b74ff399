pub mod checkpoint_store;
pub mod forecast_csv;

pub use checkpoint_store::CheckpointStore;
pub use forecast_csv::CsvForecastWriter;
