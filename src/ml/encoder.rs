// ============================================================
// Layer 5 — Bidirectional LSTM Encoder
// ============================================================
// embedding → dropout → [BiLstmLayer → dropout] × num_layers
//
// Each layer runs one Lstm left-to-right and one over the
// sequence reversed inside its valid length, then restores the
// backward outputs to the original step order:
//
//   tokens      a  b  c  <pad>
//   reversed    c  b  a  <pad>      (reverse_index = 2 1 0 3)
//
// so padding only ever follows the valid prefix in both
// directions and cannot leak into valid states.

use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
};

#[derive(Config, Debug)]
pub struct BiLstmEncoderConfig {
    pub vocab_size:    usize,
    pub embedding_dim: usize,
    pub hidden_size:   usize,
    #[config(default = 1)]
    pub num_layers:    usize,
    #[config(default = 0.0)]
    pub dropout:       f64,
}

impl BiLstmEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BiLstmEncoder<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);
        let layers = (0..self.num_layers.max(1))
            .map(|i| {
                let input = if i == 0 { self.embedding_dim } else { 2 * self.hidden_size };
                BiLstmLayer {
                    forward_cell:  LstmConfig::new(input, self.hidden_size, true).init(device),
                    backward_cell: LstmConfig::new(input, self.hidden_size, true).init(device),
                }
            })
            .collect();
        let dropout = DropoutConfig::new(self.dropout).init();
        BiLstmEncoder { embedding, layers, dropout, hidden_size: self.hidden_size }
    }
}

#[derive(Module, Debug)]
pub struct BiLstmLayer<B: Backend> {
    pub forward_cell:  Lstm<B>,
    pub backward_cell: Lstm<B>,
}

impl<B: Backend> BiLstmLayer<B> {
    /// x: [N, T, D] → [N, T, 2H]
    pub fn forward(&self, x: Tensor<B, 3>, reverse_index: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let (forward_out, _) = self.forward_cell.forward(x.clone(), None);

        let reversed = reverse_steps(x, reverse_index.clone());
        let (backward_out, _) = self.backward_cell.forward(reversed, None);
        let backward_out = reverse_steps(backward_out, reverse_index);

        Tensor::cat(vec![forward_out, backward_out], 2)
    }
}

/// Reorder steps along dim 1. The index is its own inverse.
fn reverse_steps<B: Backend>(x: Tensor<B, 3>, reverse_index: Tensor<B, 2, Int>) -> Tensor<B, 3> {
    let [batch, seq_len, width] = x.dims();
    let index = reverse_index.reshape([batch, seq_len, 1]).repeat_dim(2, width);
    x.gather(1, index)
}

#[derive(Module, Debug)]
pub struct BiLstmEncoder<B: Backend> {
    pub embedding:   Embedding<B>,
    pub layers:      Vec<BiLstmLayer<B>>,
    pub dropout:     Dropout,
    pub hidden_size: usize,
}

impl<B: Backend> BiLstmEncoder<B> {
    /// tokens: [N, T] → per-step states [N, T, 2H]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>, reverse_index: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let mut x = self.dropout.forward(self.embedding.forward(tokens));
        for layer in &self.layers {
            x = self.dropout.forward(layer.forward(x, reverse_index.clone()));
        }
        x
    }

    /// Width of every per-step state and of the pooled summary.
    pub fn output_size(&self) -> usize {
        2 * self.hidden_size
    }
}
