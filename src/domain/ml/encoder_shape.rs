/// Geometry of the recurrent encoder. Two encoders with equal shapes can
/// exchange parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderShape {
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub bidirectional: bool,
}

impl EncoderShape {
    pub fn num_directions(&self) -> usize {
        if self.bidirectional { 2 } else { 1 }
    }

    /// Width of the per-step output (and of the last-step feature vector).
    pub fn output_size(&self) -> usize {
        self.hidden_size * self.num_directions()
    }

    pub fn layer_input_size(&self, layer: usize) -> usize {
        if layer == 0 {
            self.input_size
        } else {
            self.output_size()
        }
    }
}
