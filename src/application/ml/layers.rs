use crate::domain::errors::TransferError;
use crate::domain::ml::tensor::{ParamTensor, StateDict};
use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;

/// Above this input softplus is treated as linear.
const SOFTPLUS_THRESHOLD: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Softplus,
}

impl Activation {
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Softplus => softplus(x),
        }
    }
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub fn softplus(x: f32) -> f32 {
    if x > SOFTPLUS_THRESHOLD {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// Uniform `[-bound, bound)` matrix, the default init for linear and recurrent weights.
pub fn uniform_matrix<R: Rng + ?Sized>(rows: usize, cols: usize, bound: f32, rng: &mut R) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |_| rng.random_range(-bound..bound))
}

pub fn uniform_vector<R: Rng + ?Sized>(len: usize, bound: f32, rng: &mut R) -> Array1<f32> {
    Array1::from_shape_fn(len, |_| rng.random_range(-bound..bound))
}

/// Fully connected layer `y = W x + b` with `W` stored as `[out, in]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

impl Linear {
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (in_features.max(1) as f32).sqrt();
        Self {
            weight: uniform_matrix(out_features, in_features, bound, rng),
            bias: uniform_vector(out_features, bound, rng),
        }
    }

    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn forward(&self, x: ArrayView1<'_, f32>) -> Array1<f32> {
        self.weight.dot(&x) + &self.bias
    }

    pub fn export(&self, prefix: &str, state: &mut StateDict) {
        state.insert(format!("{}.weight", prefix), ParamTensor::from_matrix(&self.weight));
        state.insert(format!("{}.bias", prefix), ParamTensor::from_vector(&self.bias));
    }

    /// Reads `{prefix}.weight` and `{prefix}.bias`. Callers validate the whole
    /// dictionary first, so a failure here means a corrupt tensor.
    pub fn import(&mut self, prefix: &str, state: &StateDict) -> Result<(), TransferError> {
        let weight_key = format!("{}.weight", prefix);
        let bias_key = format!("{}.bias", prefix);
        let weight = lookup(state, &weight_key)?.to_matrix(&weight_key)?;
        let bias = lookup(state, &bias_key)?.to_vector(&bias_key)?;
        self.weight = weight;
        self.bias = bias;
        Ok(())
    }
}

pub(crate) fn lookup<'a>(state: &'a StateDict, key: &str) -> Result<&'a ParamTensor, TransferError> {
    state.get(key).ok_or_else(|| TransferError::MissingParameter {
        name: key.to_string(),
        side: "state dict",
    })
}
