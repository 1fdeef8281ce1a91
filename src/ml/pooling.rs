// ============================================================
// Layer 5 — Summary Pooling
// ============================================================
// Reduces the encoder's per-step states [N, T, 2H] to one
// summary vector [N, 2H] per example. Two strategies share this
// contract; the classifier picks one when it is built.
//
//   FinalStatePooling  forward state at step L-1 ‖ backward state at step 0
//   AttentionPooling   softmax-weighted sum over valid steps (attention.rs)

use burn::prelude::*;

pub struct PooledSummary<B: Backend> {
    /// [N, 2H]
    pub summary: Tensor<B, 2>,
    /// [N, T] attention distribution, when the strategy has one.
    pub weights: Option<Tensor<B, 2>>,
}

pub trait SummaryPooling<B: Backend> {
    fn pool(
        &self,
        hidden:       Tensor<B, 3>,
        lengths:      Tensor<B, 1, Int>,
        padding_mask: Tensor<B, 2, Bool>,
    ) -> PooledSummary<B>;
}

/// Concatenates the last valid forward state with the first backward state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalStatePooling;

impl<B: Backend> SummaryPooling<B> for FinalStatePooling {
    fn pool(
        &self,
        hidden:        Tensor<B, 3>,
        lengths:       Tensor<B, 1, Int>,
        _padding_mask: Tensor<B, 2, Bool>,
    ) -> PooledSummary<B> {
        let [batch, seq_len, width] = hidden.dims();
        let half = width / 2;

        // Index of the last valid step, broadcast over the forward half.
        let last = lengths
            .sub_scalar(1)
            .reshape([batch, 1, 1])
            .repeat_dim(2, half);

        let forward = hidden
            .clone()
            .slice([0..batch, 0..seq_len, 0..half])
            .gather(1, last)
            .reshape([batch, half]);
        let backward = hidden
            .slice([0..batch, 0..1, half..width])
            .reshape([batch, half]);

        PooledSummary {
            summary: Tensor::cat(vec![forward, backward], 1),
            weights: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_final_state_ignores_padding_steps() {
        let device = Default::default();
        // 2 examples, 3 steps, 2H = 4. Values encode (step, channel).
        let values: Vec<f32> = (0..2 * 3 * 4).map(|v| v as f32).collect();
        let hidden  = Tensor::<TestBackend, 3>::from_data(TensorData::new(values, [2, 3, 4]), &device);
        let lengths = Tensor::<TestBackend, 1, Int>::from_ints([3, 2], &device);
        let mask    = Tensor::<TestBackend, 2, Bool>::from_data(
            TensorData::new(vec![false, false, false, false, false, true], [2, 3]),
            &device,
        );

        let pooled  = FinalStatePooling.pool(hidden, lengths, mask);
        assert_eq!(pooled.summary.dims(), [2, 4]);
        assert!(pooled.weights.is_none());

        let out = pooled.summary.into_data().to_vec::<f32>().unwrap();
        // row 0: forward half of step 2 → [8, 9]; backward half of step 0 → [2, 3]
        // row 1: forward half of step 1 → [16, 17]; backward half of step 0 → [14, 15]
        assert_eq!(out, vec![8.0, 9.0, 2.0, 3.0, 16.0, 17.0, 14.0, 15.0]);
    }
}
