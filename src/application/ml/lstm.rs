//! Stacked, optionally bidirectional LSTM encoder.
//!
//! Gate layout follows the usual checkpoint convention: the `4H` rows of every
//! weight and bias are the input, forget, cell and output gates in that order,
//! and input and hidden biases are stored separately.

use super::layers::{lookup, sigmoid, uniform_matrix, uniform_vector};
use crate::domain::errors::TransferError;
pub use crate::domain::ml::encoder_shape::EncoderShape;
use crate::domain::ml::parameter_id::{LstmParamId, LstmParamKind};
use crate::domain::ml::tensor::{ParamTensor, StateDict};
use ndarray::{Array1, Array2, ArrayView2, s};
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
struct LstmDirection {
    w_ih: Array2<f32>, // [4H, in]
    w_hh: Array2<f32>, // [4H, H]
    b_ih: Array1<f32>,
    b_hh: Array1<f32>,
}

impl LstmDirection {
    fn new<R: Rng + ?Sized>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (hidden_size.max(1) as f32).sqrt();
        let gates = 4 * hidden_size;
        Self {
            w_ih: uniform_matrix(gates, input_size, bound, rng),
            w_hh: uniform_matrix(gates, hidden_size, bound, rng),
            b_ih: uniform_vector(gates, bound, rng),
            b_hh: uniform_vector(gates, bound, rng),
        }
    }

    fn hidden_size(&self) -> usize {
        self.w_hh.ncols()
    }

    fn tensor(&self, kind: LstmParamKind) -> ParamTensor {
        match kind {
            LstmParamKind::WeightIh => ParamTensor::from_matrix(&self.w_ih),
            LstmParamKind::WeightHh => ParamTensor::from_matrix(&self.w_hh),
            LstmParamKind::BiasIh => ParamTensor::from_vector(&self.b_ih),
            LstmParamKind::BiasHh => ParamTensor::from_vector(&self.b_hh),
        }
    }

    fn set_tensor(&mut self, kind: LstmParamKind, key: &str, tensor: &ParamTensor) -> Result<(), TransferError> {
        match kind {
            LstmParamKind::WeightIh => self.w_ih = tensor.to_matrix(key)?,
            LstmParamKind::WeightHh => self.w_hh = tensor.to_matrix(key)?,
            LstmParamKind::BiasIh => self.b_ih = tensor.to_vector(key)?,
            LstmParamKind::BiasHh => self.b_hh = tensor.to_vector(key)?,
        }
        Ok(())
    }

    /// Runs the cell over every row of `input`, returning `[T, H]` hidden states
    /// indexed by input position (also when running in reverse).
    fn run(&self, input: ArrayView2<'_, f32>, reverse: bool) -> Array2<f32> {
        let steps = input.nrows();
        let h_size = self.hidden_size();
        let projected = input.dot(&self.w_ih.t()) + &self.b_ih + &self.b_hh;

        let mut h = Array1::<f32>::zeros(h_size);
        let mut c = Array1::<f32>::zeros(h_size);
        let mut out = Array2::<f32>::zeros((steps, h_size));

        for step in 0..steps {
            let t = if reverse { steps - 1 - step } else { step };
            let gates = &projected.row(t) + &self.w_hh.dot(&h);

            let i = gates.slice(s![0..h_size]).mapv(sigmoid);
            let f = gates.slice(s![h_size..2 * h_size]).mapv(sigmoid);
            let g = gates.slice(s![2 * h_size..3 * h_size]).mapv(f32::tanh);
            let o = gates.slice(s![3 * h_size..4 * h_size]).mapv(sigmoid);

            c = &f * &c + &i * &g;
            h = &o * &c.mapv(f32::tanh);
            out.row_mut(t).assign(&h);
        }

        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LstmEncoder {
    shape: EncoderShape,
    // layer-major, forward direction before reverse
    directions: Vec<LstmDirection>,
}

impl LstmEncoder {
    pub fn new<R: Rng + ?Sized>(shape: EncoderShape, rng: &mut R) -> Self {
        let mut directions = Vec::with_capacity(shape.num_layers * shape.num_directions());
        for layer in 0..shape.num_layers {
            for _ in 0..shape.num_directions() {
                directions.push(LstmDirection::new(
                    shape.layer_input_size(layer),
                    shape.hidden_size,
                    rng,
                ));
            }
        }
        Self { shape, directions }
    }

    pub fn shape(&self) -> EncoderShape {
        self.shape
    }

    fn index(&self, id: &LstmParamId) -> usize {
        id.layer * self.shape.num_directions() + usize::from(id.reverse)
    }

    /// Output of the last layer at every time step, `[T, output_size]`.
    pub fn encode(&self, input: ArrayView2<'_, f32>) -> Array2<f32> {
        let steps = input.nrows();
        let h_size = self.shape.hidden_size;
        let mut layer_input = input.to_owned();

        for layer in 0..self.shape.num_layers {
            let mut layer_output = Array2::<f32>::zeros((steps, self.shape.output_size()));
            for direction in 0..self.shape.num_directions() {
                let cell = &self.directions[layer * self.shape.num_directions() + direction];
                let hidden = cell.run(layer_input.view(), direction == 1);
                layer_output
                    .slice_mut(s![.., direction * h_size..(direction + 1) * h_size])
                    .assign(&hidden);
            }
            layer_input = layer_output;
        }

        layer_input
    }

    /// Features of the final time step, the summary the heads consume.
    pub fn last_step(&self, input: ArrayView2<'_, f32>) -> Array1<f32> {
        let encoded = self.encode(input);
        match encoded.nrows() {
            0 => Array1::zeros(self.shape.output_size()),
            rows => encoded.row(rows - 1).to_owned(),
        }
    }

    pub fn param_ids(&self) -> Vec<LstmParamId> {
        LstmParamId::enumerate(self.shape.num_layers, self.shape.bidirectional)
    }

    pub fn export(&self, module: &str, state: &mut StateDict) {
        for id in self.param_ids() {
            let cell = &self.directions[self.index(&id)];
            state.insert(id.key(module), cell.tensor(id.kind));
        }
    }

    pub fn import(&mut self, module: &str, state: &StateDict) -> Result<(), TransferError> {
        for id in self.param_ids() {
            let key = id.key(module);
            let tensor = lookup(state, &key)?;
            let index = self.index(&id);
            self.directions[index].set_tensor(id.kind, &key, tensor)?;
        }
        Ok(())
    }
}
