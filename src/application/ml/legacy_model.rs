use super::layers::{Activation, Linear};
use super::lstm::{EncoderShape, LstmEncoder};
use crate::domain::errors::TransferError;
use crate::domain::ml::tensor::{StateDict, validate_against};
use ndarray::{Array1, ArrayView2};
use rand::Rng;

pub const ENCODER_MODULE: &str = "lstm";

/// Width of the bottleneck between `fc2` and `fc3`.
const FC2_WIDTH: usize = 128;

/// The single-head regressor the checkpoints were trained with:
/// bidirectional LSTM, then `fc1 -> relu -> fc2 -> relu -> fc3`.
#[derive(Debug, Clone)]
pub struct LegacyLstmRegressor {
    lstm: LstmEncoder,
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
}

impl LegacyLstmRegressor {
    pub fn new<R: Rng + ?Sized>(shape: EncoderShape, output_size: usize, rng: &mut R) -> Self {
        let width = shape.output_size();
        Self {
            lstm: LstmEncoder::new(shape, rng),
            fc1: Linear::new(width, width, rng),
            fc2: Linear::new(width, FC2_WIDTH, rng),
            fc3: Linear::new(FC2_WIDTH, output_size, rng),
        }
    }

    pub fn encoder(&self) -> &LstmEncoder {
        &self.lstm
    }

    pub fn output_size(&self) -> usize {
        self.fc3.out_features()
    }

    pub fn forward(&self, window: ArrayView2<'_, f32>) -> Array1<f32> {
        let features = self.lstm.last_step(window);
        let hidden = self.fc1.forward(features.view()).mapv(|x| Activation::Relu.apply(x));
        let hidden = self.fc2.forward(hidden.view()).mapv(|x| Activation::Relu.apply(x));
        self.fc3.forward(hidden.view())
    }

    pub fn state_dict(&self) -> StateDict {
        let mut state = StateDict::new();
        self.lstm.export(ENCODER_MODULE, &mut state);
        self.fc1.export("fc1", &mut state);
        self.fc2.export("fc2", &mut state);
        self.fc3.export("fc3", &mut state);
        state
    }

    /// Strict load: every key must be present with the right shape and no extra
    /// keys are allowed. Nothing is written unless the whole dictionary validates.
    pub fn load_state_dict(&mut self, state: &StateDict) -> Result<(), TransferError> {
        validate_against(&self.state_dict(), state)?;
        self.lstm.import(ENCODER_MODULE, state)?;
        self.fc1.import("fc1", state)?;
        self.fc2.import("fc2", state)?;
        self.fc3.import("fc3", state)?;
        Ok(())
    }
}
