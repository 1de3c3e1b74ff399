pub mod encoder_shape;
pub mod feature_registry;
pub mod parameter_id;
pub mod tensor;
