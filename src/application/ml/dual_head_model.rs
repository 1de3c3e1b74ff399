use super::layers::{Activation, Linear};
use super::lstm::{EncoderShape, LstmEncoder};
use crate::domain::errors::{ForecastError, TransferError};
use crate::domain::ml::tensor::{StateDict, validate_against};
use crate::domain::ports::{MeanVariance, VolatilityModel};
use ndarray::{Array1, ArrayView2};
use rand::Rng;

pub const ENCODER_MODULE: &str = "lstm";
pub const MEAN_HEAD_MODULE: &str = "mean_head";
pub const VARIANCE_HEAD_MODULE: &str = "variance_head";

/// `Linear -> ReLU -> Linear [-> activation]`, stored as `{module}.0` and `{module}.2`.
#[derive(Debug, Clone)]
struct Head {
    hidden: Linear,
    output: Linear,
    activation: Option<Activation>,
}

impl Head {
    fn new<R: Rng + ?Sized>(
        in_features: usize,
        hidden_size: usize,
        activation: Option<Activation>,
        rng: &mut R,
    ) -> Self {
        Self {
            hidden: Linear::new(in_features, hidden_size, rng),
            output: Linear::new(hidden_size, 1, rng),
            activation,
        }
    }

    fn forward(&self, features: &Array1<f32>) -> f32 {
        let hidden = self
            .hidden
            .forward(features.view())
            .mapv(|x| Activation::Relu.apply(x));
        let out = self.output.forward(hidden.view())[0];
        match self.activation {
            Some(activation) => activation.apply(out),
            None => out,
        }
    }

    fn export(&self, module: &str, state: &mut StateDict) {
        self.hidden.export(&format!("{}.0", module), state);
        self.output.export(&format!("{}.2", module), state);
    }

    fn import(&mut self, module: &str, state: &StateDict) -> Result<(), TransferError> {
        self.hidden.import(&format!("{}.0", module), state)?;
        self.output.import(&format!("{}.2", module), state)
    }
}

/// Recurrent encoder shared with the legacy regressor, followed by separate
/// mean and variance heads. Softplus on the variance head keeps the variance
/// non-negative.
#[derive(Debug, Clone)]
pub struct DualHeadVolatilityModel {
    lstm: LstmEncoder,
    mean_head: Head,
    variance_head: Head,
}

impl DualHeadVolatilityModel {
    pub fn new<R: Rng + ?Sized>(shape: EncoderShape, head_hidden_size: usize, rng: &mut R) -> Self {
        let width = shape.output_size();
        Self {
            lstm: LstmEncoder::new(shape, rng),
            mean_head: Head::new(width, head_hidden_size, None, rng),
            variance_head: Head::new(width, head_hidden_size, Some(Activation::Softplus), rng),
        }
    }

    pub fn encoder(&self) -> &LstmEncoder {
        &self.lstm
    }

    pub fn forward(&self, window: ArrayView2<'_, f32>) -> MeanVariance {
        let features = self.lstm.last_step(window);
        MeanVariance {
            mean: self.mean_head.forward(&features),
            variance: self.variance_head.forward(&features),
        }
    }

    pub fn state_dict(&self) -> StateDict {
        let mut state = StateDict::new();
        self.lstm.export(ENCODER_MODULE, &mut state);
        self.mean_head.export(MEAN_HEAD_MODULE, &mut state);
        self.variance_head.export(VARIANCE_HEAD_MODULE, &mut state);
        state
    }

    pub fn load_state_dict(&mut self, state: &StateDict) -> Result<(), TransferError> {
        validate_against(&self.state_dict(), state)?;
        self.lstm.import(ENCODER_MODULE, state)?;
        self.mean_head.import(MEAN_HEAD_MODULE, state)?;
        self.variance_head.import(VARIANCE_HEAD_MODULE, state)?;
        Ok(())
    }
}

impl VolatilityModel for DualHeadVolatilityModel {
    fn predict(&self, window: ArrayView2<'_, f32>) -> Result<MeanVariance, ForecastError> {
        let expected_cols = self.input_size();
        if window.ncols() != expected_cols {
            return Err(ForecastError::WindowShape {
                rows: window.nrows(),
                cols: window.ncols(),
                expected_cols,
            });
        }
        Ok(self.forward(window))
    }

    fn input_size(&self) -> usize {
        self.lstm.shape().input_size
    }

    fn name(&self) -> &str {
        "BiLSTM mean/variance"
    }

    fn version(&self) -> &str {
        "v2 (dual head)"
    }
}
