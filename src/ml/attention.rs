// ============================================================
// Layer 5 — Attention Pooling
// ============================================================
// Additive attention over the encoder states:
//
//   e_t = v · tanh(W h_t + b)            score per step
//   a   = softmax(e) over valid steps    padding gets -1e9
//   s   = Σ_t a_t h_t                    [N, 2H]
//
// Output width equals the final-state summary, so the
// classifier head is identical with or without attention.

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::{softmax, tanh},
};

use crate::ml::pooling::{PooledSummary, SummaryPooling};

const MASKED_SCORE: f32 = -1.0e9;

#[derive(Config, Debug)]
pub struct AttentionPoolingConfig {
    /// Width of each encoder state (2H).
    pub input_size:     usize,
    /// Width of the scoring projection.
    pub attention_size: usize,
}

impl AttentionPoolingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AttentionPooling<B> {
        AttentionPooling {
            projection: LinearConfig::new(self.input_size, self.attention_size).init(device),
            context:    LinearConfig::new(self.attention_size, 1).with_bias(false).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct AttentionPooling<B: Backend> {
    pub projection: Linear<B>,
    pub context:    Linear<B>,
}

impl<B: Backend> AttentionPooling<B> {
    /// Normalised weights [N, T]; zero on padding.
    pub fn weights(&self, hidden: Tensor<B, 3>, padding_mask: Tensor<B, 2, Bool>) -> Tensor<B, 2> {
        let [batch, seq_len, _] = hidden.dims();
        let scores = self
            .context
            .forward(tanh(self.projection.forward(hidden)))
            .reshape([batch, seq_len]);
        softmax(scores.mask_fill(padding_mask, MASKED_SCORE), 1)
    }
}

impl<B: Backend> SummaryPooling<B> for AttentionPooling<B> {
    fn pool(
        &self,
        hidden:       Tensor<B, 3>,
        _lengths:     Tensor<B, 1, Int>,
        padding_mask: Tensor<B, 2, Bool>,
    ) -> PooledSummary<B> {
        let [batch, _, width] = hidden.dims();
        let weights = self.weights(hidden.clone(), padding_mask);
        let summary = (hidden * weights.clone().unsqueeze_dim::<3>(2))
            .sum_dim(1)
            .reshape([batch, width]);
        PooledSummary { summary, weights: Some(weights) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;

    fn setup() -> (AttentionPooling<TestBackend>, Tensor<TestBackend, 3>, Tensor<TestBackend, 2, Bool>) {
        let device  = Default::default();
        let pooling = AttentionPoolingConfig::new(4, 3).init::<TestBackend>(&device);
        let values: Vec<f32> = (0..2 * 3 * 4).map(|v| (v as f32 * 0.37).sin()).collect();
        let hidden  = Tensor::<TestBackend, 3>::from_data(TensorData::new(values, [2, 3, 4]), &device);
        let mask    = Tensor::<TestBackend, 2, Bool>::from_data(
            TensorData::new(vec![false, false, false, false, true, true], [2, 3]),
            &device,
        );
        (pooling, hidden, mask)
    }

    #[test]
    fn test_weights_are_distribution_over_valid_steps() {
        let (pooling, hidden, mask) = setup();
        let w = pooling.weights(hidden, mask).into_data().to_vec::<f32>().unwrap();

        let row0: f32 = w[0..3].iter().sum();
        assert!((row0 - 1.0).abs() < 1e-5);
        // second example has a single valid step
        assert!((w[3] - 1.0).abs() < 1e-5);
        assert!(w[4].abs() < 1e-6 && w[5].abs() < 1e-6);
    }

    #[test]
    fn test_single_valid_step_returns_that_state() {
        let (pooling, hidden, mask) = setup();
        let lengths = Tensor::<TestBackend, 1, Int>::from_ints([3, 1], &Default::default());
        let first_state = hidden.clone().slice([1..2, 0..1, 0..4]).reshape([4]);

        let pooled = pooling.pool(hidden, lengths, mask);
        assert_eq!(pooled.summary.dims(), [2, 4]);

        let got  = pooled.summary.slice([1..2, 0..4]).reshape([4]).into_data().to_vec::<f32>().unwrap();
        let want = first_state.into_data().to_vec::<f32>().unwrap();
        for (a, b) in got.iter().zip(want.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
