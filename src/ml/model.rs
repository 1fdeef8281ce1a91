use anyhow::{anyhow, ensure, Result};
use burn::{
    module::Param,
    nn::{
        loss::BinaryCrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{activation::sigmoid, TensorData},
};

use crate::data::batcher::FrameBatch;
use crate::data::vectors::EmbeddingMatrix;
use crate::domain::frame::{threshold_row, LabelRow, ModelKind, NUM_FRAMES};
use crate::ml::attention::{AttentionPooling, AttentionPoolingConfig};
use crate::ml::encoder::{BiLstmEncoder, BiLstmEncoderConfig};
use crate::ml::pooling::{FinalStatePooling, SummaryPooling};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct FrameClassifierConfig {
    pub vocab_size:    usize,
    #[config(default = 50)]
    pub embedding_dim: usize,
    #[config(default = 128)]
    pub hidden_size:   usize,
    #[config(default = 1)]
    pub num_layers:    usize,
    #[config(default = 7)]
    pub num_classes:   usize,
    #[config(default = 0.0)]
    pub dropout:       f64,
    #[config(default = false)]
    pub attention:     bool,
}

impl FrameClassifierConfig {
    #[cfg(test)]
    pub fn kind(&self) -> ModelKind {
        ModelKind::from_attention(self.attention)
    }

    /// The pooling strategy is fixed here, once, for the model's lifetime.
    pub fn init<B: Backend>(&self, device: &B::Device) -> FrameClassifier<B> {
        let encoder = BiLstmEncoderConfig::new(self.vocab_size, self.embedding_dim, self.hidden_size)
            .with_num_layers(self.num_layers)
            .with_dropout(self.dropout)
            .init(device);
        let summary_size = encoder.output_size();

        let attention = self
            .attention
            .then(|| AttentionPoolingConfig::new(summary_size, self.hidden_size).init(device));
        let head    = LinearConfig::new(summary_size, self.num_classes).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();

        FrameClassifier { encoder, attention, head, dropout }
    }
}

#[derive(Module, Debug)]
pub struct FrameClassifier<B: Backend> {
    pub encoder:   BiLstmEncoder<B>,
    pub attention: Option<AttentionPooling<B>>,
    pub head:      Linear<B>,
    pub dropout:   Dropout,
}

pub struct FrameOutput<B: Backend> {
    /// Raw class scores [N, 7], fed to the loss.
    pub logits:            Tensor<B, 2>,
    /// Independent sigmoid per class [N, 7].
    pub probabilities:     Tensor<B, 2>,
    pub attention_weights: Option<Tensor<B, 2>>,
}

impl<B: Backend> FrameOutput<B> {
    /// Threshold probabilities on the host with the strict `p > threshold` rule.
    pub fn predicted_rows(&self, threshold: f32) -> Result<Vec<LabelRow>> {
        let [_, classes] = self.probabilities.dims();
        ensure!(classes == NUM_FRAMES, "expected {NUM_FRAMES} class scores, got {classes}");

        let values = self
            .probabilities
            .to_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("cannot read probabilities: {e:?}"))?;

        Ok(values.chunks(classes).map(|row| threshold_row(row, threshold)).collect())
    }
}

impl<B: Backend> FrameClassifier<B> {
    pub fn forward(&self, batch: &FrameBatch<B>) -> FrameOutput<B> {
        let hidden = self.encoder.forward(batch.tokens.clone(), batch.reverse_index.clone());

        let lengths = batch.lengths.clone();
        let mask    = batch.padding_mask.clone();
        let pooled  = match &self.attention {
            Some(attention) => attention.pool(hidden, lengths, mask),
            None            => FinalStatePooling.pool(hidden, lengths, mask),
        };

        let logits        = self.head.forward(self.dropout.forward(pooled.summary));
        let probabilities = sigmoid(logits.clone());

        FrameOutput { logits, probabilities, attention_weights: pooled.weights }
    }

    /// Mean sigmoid + binary cross-entropy over every (example, class) cell.
    pub fn forward_loss(&self, batch: &FrameBatch<B>) -> (Tensor<B, 1>, FrameOutput<B>) {
        let output = self.forward(batch);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&output.logits.device());
        let loss = bce.forward(output.logits.clone(), batch.targets.clone());
        (loss, output)
    }

    pub fn kind(&self) -> ModelKind {
        ModelKind::from_attention(self.attention.is_some())
    }

    /// Replace the embedding table with pretrained vectors.
    pub fn with_pretrained_embeddings(mut self, matrix: &EmbeddingMatrix, device: &B::Device) -> Result<Self> {
        let [rows, dim] = self.encoder.embedding.weight.dims();
        ensure!(
            matrix.rows == rows && matrix.dim == dim,
            "pretrained matrix is {}x{}, embedding table is {rows}x{dim}",
            matrix.rows,
            matrix.dim,
        );

        let weight = Tensor::<B, 2>::from_data(
            TensorData::new(matrix.values.clone(), [rows, dim]),
            device,
        );
        self.encoder.embedding.weight = Param::from_tensor(weight);
        Ok(self)
    }
}
