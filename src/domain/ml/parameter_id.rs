//! Typed identifiers for recurrent encoder parameters.
//!
//! Checkpoints address tensors by string keys. Weight transfer works on these
//! identifiers instead so that a mapping can be enumerated from the encoder
//! geometry and rendered to keys only at the edges.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LstmParamKind {
    WeightIh,
    WeightHh,
    BiasIh,
    BiasHh,
}

impl LstmParamKind {
    pub const ALL: [LstmParamKind; 4] = [
        LstmParamKind::WeightIh,
        LstmParamKind::WeightHh,
        LstmParamKind::BiasIh,
        LstmParamKind::BiasHh,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            LstmParamKind::WeightIh => "weight_ih",
            LstmParamKind::WeightHh => "weight_hh",
            LstmParamKind::BiasIh => "bias_ih",
            LstmParamKind::BiasHh => "bias_hh",
        }
    }
}

/// One tensor of a (possibly bidirectional) stacked LSTM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LstmParamId {
    pub layer: usize,
    pub reverse: bool,
    pub kind: LstmParamKind,
}

impl LstmParamId {
    /// Every parameter of an encoder with the given depth and directionality.
    pub fn enumerate(num_layers: usize, bidirectional: bool) -> Vec<LstmParamId> {
        let directions: &[bool] = if bidirectional { &[false, true] } else { &[false] };
        let mut ids = Vec::with_capacity(num_layers * directions.len() * 4);
        for layer in 0..num_layers {
            for &reverse in directions {
                for kind in LstmParamKind::ALL {
                    ids.push(LstmParamId {
                        layer,
                        reverse,
                        kind,
                    });
                }
            }
        }
        ids
    }

    /// Checkpoint key under the given module prefix, e.g. `lstm.weight_hh_l1_reverse`.
    pub fn key(&self, module: &str) -> String {
        format!("{}.{}", module, self)
    }
}

impl fmt::Display for LstmParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_l{}", self.kind.as_str(), self.layer)?;
        if self.reverse {
            write!(f, "_reverse")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let id = LstmParamId {
            layer: 1,
            reverse: true,
            kind: LstmParamKind::WeightHh,
        };
        assert_eq!(id.key("lstm"), "lstm.weight_hh_l1_reverse");

        let id = LstmParamId {
            layer: 0,
            reverse: false,
            kind: LstmParamKind::BiasIh,
        };
        assert_eq!(id.key("lstm"), "lstm.bias_ih_l0");
    }

    #[test]
    fn test_enumerate_counts() {
        assert_eq!(LstmParamId::enumerate(2, true).len(), 16);
        assert_eq!(LstmParamId::enumerate(3, false).len(), 12);
    }
}
