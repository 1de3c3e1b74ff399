pub mod interval_reporter;

pub use interval_reporter::IntervalReporter;
