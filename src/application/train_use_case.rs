// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the three CSV splits      (Layer 4 - data)
//   Step 2: Build + save the vocabulary    (Layer 6 - infra)
//   Step 3: Encode train / val datasets    (Layer 4 - data)
//   Step 4: Build the classifier           (Layer 5 - ml)
//   Step 5: Seed embeddings from GloVe     (Layer 4 - data)
//   Step 6: Save the architecture config   (Layer 6 - infra)
//   Step 7: Run the training loop          (Layer 5 - ml)
//   Step 8: Render the loss plot           (Layer 6 - infra)

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    batcher::{BatchOrdering, BucketLoader},
    dataset::FrameDataset,
    error::CorpusError,
    loader::CsvCorpusLoader,
    vectors::load_vectors,
    vocab::Vocabulary,
};
use crate::domain::{
    example::FrameExample,
    frame::ModelKind,
    traits::{CorpusSource, Split},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    plot::plot_loss,
    vocab_store::VocabStore,
};
use crate::ml::{
    model::{FrameClassifier, FrameClassifierConfig},
    trainer::{train_model, TrainerSettings, TrainingOutcome},
};

pub const DEFAULT_VECTORS: &str = "data/glove.6B.50d.txt";

/// Which numeric backend the run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceChoice {
    #[default]
    Cpu,
    Wgpu,
}

// ─── Run Configuration ────────────────────────────────────────────────────────
// Every option of a run, training or evaluation.
// Serialisable so a run can be logged or stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data_dir:      String,
    pub models_dir:    String,
    pub graphs_dir:    String,
    pub vectors:       String,
    pub batch_size:    usize,
    pub test:          bool,
    pub epochs:        usize,
    pub lr:            f64,
    pub weight_decay:  f64,
    pub dropout:       f64,
    /// Accepted for compatibility; Adam has no momentum term.
    pub momentum:      f64,
    pub step:          usize,
    pub gamma:         f64,
    /// Opt in to `weight_decay` and the `step`/`gamma` schedule.
    pub apply_decay:   bool,
    pub hidden_size:   usize,
    pub num_layers:    usize,
    pub embedding_dim: usize,
    pub attention:     bool,
    pub device:        DeviceChoice,
    pub seed:          u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir:      "data".to_string(),
            models_dir:    "models".to_string(),
            graphs_dir:    "graphs".to_string(),
            vectors:       DEFAULT_VECTORS.to_string(),
            batch_size:    64,
            test:          false,
            epochs:        15,
            lr:            0.001,
            weight_decay:  0.001,
            dropout:       0.0,
            momentum:      0.5,
            step:          3,
            gamma:         0.1,
            apply_decay:   false,
            hidden_size:   128,
            num_layers:    1,
            embedding_dim: 50,
            attention:     false,
            device:        DeviceChoice::Cpu,
            seed:          42,
        }
    }
}

impl RunConfig {
    pub fn model_kind(&self) -> ModelKind {
        ModelKind::from_attention(self.attention)
    }

    pub fn model_name(&self) -> &'static str {
        self.model_kind().model_name()
    }

    pub fn trainer_settings(&self) -> TrainerSettings {
        TrainerSettings {
            epochs:       self.epochs,
            lr:           self.lr,
            weight_decay: self.weight_decay,
            step:         self.step,
            gamma:        self.gamma,
            apply_decay:  self.apply_decay,
        }
    }

    /// Architecture for a vocabulary of `vocab_size` items.
    pub fn model_config(&self, vocab_size: usize) -> FrameClassifierConfig {
        FrameClassifierConfig::new(vocab_size)
            .with_embedding_dim(self.embedding_dim)
            .with_hidden_size(self.hidden_size)
            .with_num_layers(self.num_layers)
            .with_dropout(self.dropout)
            .with_attention(self.attention)
    }
}

/// All three splits, in Split::ALL order.
pub(crate) fn load_corpus(source: &impl CorpusSource) -> Result<[Vec<FrameExample>; 3]> {
    let [train, val, test] = Split::ALL;
    Ok([source.load_split(train)?, source.load_split(val)?, source.load_split(test)?])
}

pub(crate) fn corpus_texts<'a>(splits: &'a [Vec<FrameExample>]) -> impl Iterator<Item = &'a str> + 'a {
    splits.iter().flatten().map(|e| e.text.as_str())
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: RunConfig,
}

impl TrainUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Run training on the configured backend.
    pub fn execute(&self) -> Result<()> {
        match self.config.device {
            DeviceChoice::Cpu  => self.run::<Autodiff<NdArray<f32>>>(NdArrayDevice::Cpu).map(|_| ()),
            DeviceChoice::Wgpu => self.run::<Autodiff<Wgpu>>(WgpuDevice::default()).map(|_| ()),
        }
    }

    pub fn run<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainingOutcome<B>> {
        let cfg        = &self.config;
        let model_name = cfg.model_name();
        tracing::info!("Training {} on {:?}", model_name, cfg.device);
        tracing::debug!("momentum = {} is not used by Adam", cfg.momentum);

        // ── Step 1: Load the corpus ───────────────────────────────────────────
        let loader = CsvCorpusLoader::new(&cfg.data_dir);
        let splits = load_corpus(&loader)?;
        let [train_examples, val_examples, _] = &splits;

        // ── Step 2: Vocabulary over train + val + test ────────────────────────
        let vocab_store = VocabStore::new(&cfg.models_dir, model_name);
        let vocab       = vocab_store.build_and_save(corpus_texts(&splits))?;
        tracing::info!("Vocabulary has {} entries", vocab.len());

        // ── Step 3: Encode ────────────────────────────────────────────────────
        let train_dataset = FrameDataset::encode(train_examples, &vocab)?;
        let val_dataset   = FrameDataset::encode(val_examples, &vocab)?;

        // ── Step 4 + 5: Model with pretrained embeddings ──────────────────────
        let model_config = cfg.model_config(vocab.len());
        let model        = self.seed_embeddings(model_config.init::<B>(&device), &vocab, &device)?;

        // ── Step 6: Persist the architecture ──────────────────────────────────
        let checkpoints = CheckpointManager::new(&cfg.models_dir, model_name)?;
        checkpoints.save_config(&model_config)?;

        // ── Step 7: Training loop ─────────────────────────────────────────────
        let train_loader = BucketLoader::<B>::new(
            train_dataset,
            cfg.batch_size,
            BatchOrdering::Bucketed { seed: cfg.seed },
            device.clone(),
        );
        let val_loader = BucketLoader::<B::InnerBackend>::new(
            val_dataset,
            cfg.batch_size,
            BatchOrdering::Sorted,
            device,
        );
        let metrics_log = MetricsLogger::create(&cfg.graphs_dir, model_name)?;

        let outcome = train_model(
            model,
            &train_loader,
            &val_loader,
            &cfg.trainer_settings(),
            &checkpoints,
            &metrics_log,
        )?;

        // ── Step 8: Loss curves ───────────────────────────────────────────────
        plot_loss(&outcome.history, &cfg.graphs_dir, model_name)?;

        Ok(outcome)
    }

    fn seed_embeddings<B: AutodiffBackend>(
        &self,
        model:  FrameClassifier<B>,
        vocab:  &Vocabulary,
        device: &B::Device,
    ) -> Result<FrameClassifier<B>> {
        let path = Path::new(&self.config.vectors);
        match load_vectors(path, self.config.embedding_dim, vocab.tokens()) {
            Ok(matrix) => {
                tracing::info!(
                    "Pretrained vectors cover {}/{} vocabulary items",
                    matrix.hits,
                    matrix.rows
                );
                model.with_pretrained_embeddings(&matrix, device)
            }
            Err(CorpusError::MissingFile { path }) if self.config.vectors == DEFAULT_VECTORS => {
                tracing::warn!("No pretrained vectors at '{}'; keeping random embeddings", path);
                Ok(model)
            }
            Err(e) => Err(e.into()),
        }
    }
}
