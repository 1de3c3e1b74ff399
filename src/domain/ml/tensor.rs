use crate::domain::errors::TransferError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named parameter tensors of a network, keyed by module path
/// (`lstm.weight_ih_l0`, `mean_head.0.bias`, ...).
pub type StateDict = BTreeMap<String, ParamTensor>;

/// Row-major parameter tensor as stored in checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl ParamTensor {
    pub fn from_matrix(matrix: &Array2<f32>) -> Self {
        Self {
            shape: matrix.shape().to_vec(),
            data: matrix.iter().copied().collect(),
        }
    }

    pub fn from_vector(vector: &Array1<f32>) -> Self {
        Self {
            shape: vec![vector.len()],
            data: vector.to_vec(),
        }
    }

    /// Number of elements implied by `shape`.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn validate(&self, name: &str) -> Result<(), TransferError> {
        if self.numel() != self.data.len() {
            return Err(TransferError::CorruptTensor {
                name: name.to_string(),
                shape: self.shape.clone(),
                len: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn to_matrix(&self, name: &str) -> Result<Array2<f32>, TransferError> {
        self.validate(name)?;
        match self.shape.as_slice() {
            [rows, cols] => Array2::from_shape_vec((*rows, *cols), self.data.clone()).map_err(
                |_| TransferError::CorruptTensor {
                    name: name.to_string(),
                    shape: self.shape.clone(),
                    len: self.data.len(),
                },
            ),
            _ => Err(TransferError::CorruptTensor {
                name: name.to_string(),
                shape: self.shape.clone(),
                len: self.data.len(),
            }),
        }
    }

    pub fn to_vector(&self, name: &str) -> Result<Array1<f32>, TransferError> {
        self.validate(name)?;
        if self.shape.len() != 1 {
            return Err(TransferError::CorruptTensor {
                name: name.to_string(),
                shape: self.shape.clone(),
                len: self.data.len(),
            });
        }
        Ok(Array1::from_vec(self.data.clone()))
    }
}

/// Checks that `provided` holds exactly the keys and shapes of `expected`.
///
/// Used by every strict `load_state_dict` so that nothing is written unless the
/// whole dictionary is compatible.
pub fn validate_against(expected: &StateDict, provided: &StateDict) -> Result<(), TransferError> {
    for (name, tensor) in expected {
        let Some(candidate) = provided.get(name) else {
            return Err(TransferError::MissingParameter {
                name: name.clone(),
                side: "state dict",
            });
        };
        candidate.validate(name)?;
        if candidate.shape != tensor.shape {
            return Err(TransferError::ShapeMismatch {
                source_name: name.clone(),
                target_name: name.clone(),
                source_shape: candidate.shape.clone(),
                target_shape: tensor.shape.clone(),
            });
        }
    }

    if let Some(extra) = provided.keys().find(|k| !expected.contains_key(*k)) {
        return Err(TransferError::UnexpectedParameter {
            name: extra.clone(),
        });
    }

    Ok(())
}
