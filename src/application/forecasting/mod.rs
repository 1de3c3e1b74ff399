pub mod rolling_forecaster;

pub use rolling_forecaster::RollingForecaster;
