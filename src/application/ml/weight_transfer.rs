//! Parameter transfer between network definitions.
//!
//! A [`ParameterMapping`] lists which source tensor feeds which target tensor.
//! [`transfer_parameters`] checks every pair before copying anything, so a
//! mismatch leaves the target untouched.

use super::lstm::EncoderShape;
use crate::domain::errors::TransferError;
use crate::domain::ml::parameter_id::LstmParamId;
use crate::domain::ml::tensor::StateDict;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    pub source: LstmParamId,
    pub target: LstmParamId,
}

/// Explicit source → target mapping for recurrent encoder parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMapping {
    source_module: String,
    target_module: String,
    entries: Vec<MappingEntry>,
}

impl ParameterMapping {
    /// Identity mapping over every tensor of an encoder with the given geometry.
    pub fn encoder(source_module: &str, target_module: &str, shape: &EncoderShape) -> Self {
        let entries = LstmParamId::enumerate(shape.num_layers, shape.bidirectional)
            .into_iter()
            .map(|id| MappingEntry {
                source: id,
                target: id,
            })
            .collect();

        Self {
            source_module: source_module.to_string(),
            target_module: target_module.to_string(),
            entries,
        }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(source key, target key)` pairs as they appear in state dicts.
    pub fn keys(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| (e.source.key(&self.source_module), e.target.key(&self.target_module)))
            .collect()
    }
}

/// Outcome of a successful transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    pub state: StateDict,
    pub tensors: usize,
    pub values: usize,
}

/// Returns a copy of `target` whose mapped tensors are replaced by the
/// corresponding `source` tensors. Fails without producing anything if a key is
/// missing on either side or any pair differs in shape.
pub fn transfer_parameters(
    source: &StateDict,
    target: &StateDict,
    mapping: &ParameterMapping,
) -> Result<TransferReport, TransferError> {
    let pairs = mapping.keys();

    for (source_key, target_key) in &pairs {
        let source_tensor = source
            .get(source_key)
            .ok_or_else(|| TransferError::MissingParameter {
                name: source_key.clone(),
                side: "source",
            })?;
        let target_tensor = target
            .get(target_key)
            .ok_or_else(|| TransferError::MissingParameter {
                name: target_key.clone(),
                side: "target",
            })?;

        source_tensor.validate(source_key)?;
        if source_tensor.shape != target_tensor.shape {
            return Err(TransferError::ShapeMismatch {
                source_name: source_key.clone(),
                target_name: target_key.clone(),
                source_shape: source_tensor.shape.clone(),
                target_shape: target_tensor.shape.clone(),
            });
        }
    }

    let mut state = target.clone();
    let mut values = 0;
    for (source_key, target_key) in &pairs {
        if let Some(tensor) = source.get(source_key) {
            values += tensor.data.len();
            debug!("Transferring {} -> {} {:?}", source_key, target_key, tensor.shape);
            state.insert(target_key.clone(), tensor.clone());
        }
    }

    Ok(TransferReport {
        state,
        tensors: pairs.len(),
        values,
    })
}
