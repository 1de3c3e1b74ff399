pub mod charting;
pub mod data;
pub mod persistence;

pub use charting::ForecastChartRenderer;
pub use data::ShardLoader;
pub use persistence::{CheckpointStore, CsvForecastWriter};
