pub mod dual_head_model;
pub mod layers;
pub mod legacy_model;
pub mod lstm;
pub mod model_adapter;
pub mod weight_transfer;
