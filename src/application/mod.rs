// Networks and weight transfer
pub mod ml;

// Rolling-window inference
pub mod forecasting;

// Confidence bands and output sinks
pub mod reporting;

// End-to-end orchestration
pub mod pipeline;
