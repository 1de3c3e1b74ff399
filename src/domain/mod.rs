// Domain-specific error types
pub mod errors;

// Forecast records
pub mod forecast;

// Market observations
pub mod market;

// Network parameter vocabulary
pub mod ml;

// Port interfaces
pub mod ports;
