// ============================================================
// Layer 5 — Training Loop
// ============================================================
// For every epoch: a train phase, then a validation phase.
//
//   train  Autodiff backend, dropout active, one Adam step per
//          batch on a fresh graph
//   val    model.valid() on the inner backend, no gradients,
//          dropout disabled
//
// Each phase starts with empty accumulators and closes with
// loss = Σ(batch loss · batch size) / dataset size and the
// micro-averaged metric suite. A strictly better validation F1
// replaces the best snapshot and overwrites the checkpoint file.
// After the last epoch the best snapshot becomes the returned model.

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::data::batcher::BucketLoader;
use crate::domain::frame::DECISION_THRESHOLD;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::evaluator::run_inference_phase;
use crate::ml::metrics::{PhaseAccumulator, PhaseMetrics};
use crate::ml::model::FrameClassifier;
use crate::ml::schedule::StepLr;

/// Progress is logged on every LOG_EVERY-th training batch.
const LOG_EVERY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainerSettings {
    pub epochs:       usize,
    pub lr:           f64,
    pub weight_decay: f64,
    pub step:         usize,
    pub gamma:        f64,
    /// Apply `weight_decay` and the step schedule. Off means a constant
    /// rate and no L2 penalty.
    pub apply_decay:  bool,
}

impl TrainerSettings {
    /// Adam with beta1 = 0.01, beta2 = 0.999, epsilon = 1e-5.
    fn adam(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(0.01)
            .with_beta_2(0.999)
            .with_epsilon(1e-5)
            .with_weight_decay(self.weight_decay_penalty().map(WeightDecayConfig::new))
    }

    /// L2 coefficient handed to Adam, if any.
    pub fn weight_decay_penalty(&self) -> Option<f32> {
        (self.apply_decay && self.weight_decay > 0.0).then_some(self.weight_decay as f32)
    }

    pub fn schedule(&self) -> StepLr {
        let step = if self.apply_decay { self.step } else { 0 };
        StepLr::new(self.lr, step, self.gamma)
    }
}

/// Average loss per epoch, one entry per finished epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    pub train: Vec<f64>,
    pub val:   Vec<f64>,
}

impl LossHistory {
    pub fn epochs(&self) -> usize {
        self.train.len().max(self.val.len())
    }
}

// ─── BestCheckpoint ───────────────────────────────────────────────────────────
/// Best validation scores seen so far and the matching model snapshot.
/// Starts at F1 = 0.0 and only moves on a strict improvement.
#[derive(Debug, Clone)]
pub struct BestCheckpoint<M> {
    pub metrics: PhaseMetrics,
    pub epoch:   Option<usize>,
    snapshot:    Option<M>,
}

impl<M> Default for BestCheckpoint<M> {
    fn default() -> Self {
        Self { metrics: PhaseMetrics::default(), epoch: None, snapshot: None }
    }
}

impl<M> BestCheckpoint<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the current best and return the next one, plus whether it changed.
    pub fn observe(self, epoch: usize, metrics: &PhaseMetrics, snapshot: impl FnOnce() -> M) -> (Self, bool) {
        if metrics.f1 > self.metrics.f1 {
            let next = Self { metrics: *metrics, epoch: Some(epoch), snapshot: Some(snapshot()) };
            (next, true)
        } else {
            (self, false)
        }
    }

    /// The best snapshot, or `last` when no epoch ever improved.
    pub fn select(self, last: M) -> M {
        self.snapshot.unwrap_or(last)
    }
}

pub struct TrainingOutcome<B: AutodiffBackend> {
    pub model:   FrameClassifier<B>,
    pub history: LossHistory,
    /// Scores of the best validation epoch (all zero if none improved).
    pub best:    PhaseMetrics,
}

// ─── Training ─────────────────────────────────────────────────────────────────
pub fn train_model<B: AutodiffBackend>(
    mut model:   FrameClassifier<B>,
    train:       &BucketLoader<B>,
    val:         &BucketLoader<B::InnerBackend>,
    settings:    &TrainerSettings,
    checkpoints: &CheckpointManager,
    metrics_log: &MetricsLogger,
) -> Result<TrainingOutcome<B>> {
    tracing::info!("Training {} for {} epochs", model.kind().model_name(), settings.epochs);
    let since    = Instant::now();
    let schedule = settings.schedule();
    let mut optim = settings.adam().init();

    let mut best: BestCheckpoint<FrameClassifier<B>> = BestCheckpoint::new();
    let mut history = LossHistory::default();

    for epoch in 0..settings.epochs {
        tracing::info!("Epoch {}/{}", epoch + 1, settings.epochs);
        tracing::info!("{}", "-".repeat(10));

        // ── Training phase ────────────────────────────────────────────────────
        let lr            = schedule.lr_at(epoch);
        let total         = train.dataset_len();
        let total_batches = train.num_batches().max(1);
        let mut acc       = PhaseAccumulator::new();
        let mut seen      = 0usize;

        for (batch_idx, batch) in train.iter_epoch(epoch).enumerate() {
            let (loss, output) = model.forward_loss(&batch);
            let predicted      = output.predicted_rows(DECISION_THRESHOLD)?;
            let batch_loss: f64 = loss.clone().into_scalar().elem::<f64>();

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(lr, model, grads);

            acc.add_batch(batch_loss, &batch.labels, &predicted)?;
            seen += batch.size();

            if batch_idx % LOG_EVERY == 0 {
                tracing::info!(
                    "Train Epoch: {} [{}/{} ({:.0}%)]\tLoss: {:.6}",
                    epoch + 1,
                    seen,
                    total,
                    100.0 * (batch_idx + 1) as f64 / total_batches as f64,
                    batch_loss,
                );
            }
        }

        let train_metrics = acc.finish(total);
        log_phase("Train", &train_metrics);
        metrics_log.log(epoch + 1, "train", &train_metrics)?;
        history.train.push(train_metrics.loss);

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let val_metrics = run_inference_phase(&model_valid, val)?.metrics;
        log_phase("Val", &val_metrics);
        metrics_log.log(epoch + 1, "val", &val_metrics)?;
        history.val.push(val_metrics.loss);

        let (next, improved) = best.observe(epoch + 1, &val_metrics, || model.clone());
        best = next;
        if improved {
            checkpoints.save_model(&model)?;
            tracing::info!(
                "New best val f1-score {:.4}; checkpoint written to '{}'",
                val_metrics.f1,
                checkpoints.weights_path().display()
            );
        }
    }

    let elapsed = since.elapsed().as_secs();
    tracing::info!("Training completed in {:.0}m {:.0}s", elapsed / 60, elapsed % 60);
    let best_metrics = best.metrics;
    tracing::info!("Best overall val Acc: {:.4}", best_metrics.accuracy);
    tracing::info!("Best overall val precision: {:.4}", best_metrics.precision);
    tracing::info!("Best overall val recall: {:.4}", best_metrics.recall);
    tracing::info!("Best overall val f1-score: {:.4}", best_metrics.f1);

    match best.epoch {
        Some(epoch) => tracing::info!("Restoring weights from epoch {}", epoch),
        None => tracing::warn!("Validation F1 never rose above 0; keeping the final-epoch model"),
    }
    let model = best.select(model);

    Ok(TrainingOutcome { model, history, best: best_metrics })
}

pub(crate) fn log_phase(phase: &str, m: &PhaseMetrics) {
    tracing::info!(
        "{} Loss: {:.4} Acc: {:.4} precision: {:.4} recall: {:.4}  f1-score: {:.4}",
        phase, m.loss, m.accuracy, m.precision, m.recall, m.f1,
    );
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::BatchOrdering;
    use crate::data::dataset::{FrameDataset, FrameSample};
    use crate::domain::frame::LabelRow;
    use crate::ml::model::FrameClassifierConfig;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::Param;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn scores(f1: f64) -> PhaseMetrics {
        PhaseMetrics { f1, ..PhaseMetrics::default() }
    }

    fn settings(epochs: usize) -> TrainerSettings {
        TrainerSettings { epochs, lr: 0.01, weight_decay: 0.0, step: 0, gamma: 0.1, apply_decay: false }
    }

    fn head_weights<B: Backend>(model: &FrameClassifier<B>) -> Vec<f32> {
        model.head.weight.val().into_data().convert::<f32>().to_vec::<f32>().unwrap()
    }

    fn config() -> FrameClassifierConfig {
        FrameClassifierConfig::new(10).with_embedding_dim(4).with_hidden_size(4)
    }

    /// Zero head weights and a large bias: every probability starts near 1.
    fn confident_model(device: &<TestBackend as Backend>::Device) -> FrameClassifier<TestBackend> {
        let mut model = config().init::<TestBackend>(device);
        let [d_in, d_out] = model.head.weight.dims();
        model.head.weight = Param::from_tensor(Tensor::zeros([d_in, d_out], device));
        model.head.bias   = Some(Param::from_tensor(Tensor::full([d_out], 5.0, device)));
        model
    }

    fn dataset_with(labels: [LabelRow; 5]) -> FrameDataset {
        let ids = [vec![2, 4, 5, 3], vec![2, 6, 3], vec![2, 4, 7, 8, 3], vec![2, 9, 3], vec![2, 6, 9, 3]];
        FrameDataset::new(
            ids.into_iter()
                .zip(labels)
                .map(|(token_ids, labels)| FrameSample { token_ids, labels })
                .collect(),
        )
    }

    fn dataset() -> FrameDataset {
        dataset_with([
            [1, 0, 0, 0, 0, 0, 0],
            [0, 1, 0, 0, 0, 0, 0],
            [1, 0, 1, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 1],
            [0, 1, 0, 0, 0, 0, 1],
        ])
    }

    #[test]
    fn test_best_moves_only_on_strict_improvement() {
        let best: BestCheckpoint<&str> = BestCheckpoint::new();

        let (best, changed) = best.observe(1, &scores(0.0), || "e1");
        assert!(!changed);
        let (best, changed) = best.observe(2, &scores(0.4), || "e2");
        assert!(changed);
        let (best, changed) = best.observe(3, &scores(0.4), || "e3");
        assert!(!changed);
        let (best, changed) = best.observe(4, &scores(0.3), || "e4");
        assert!(!changed);

        assert_eq!(best.epoch, Some(2));
        assert_eq!(best.metrics.f1, 0.4);
        assert_eq!(best.select("last"), "e2");
    }

    #[test]
    fn test_best_f1_is_non_decreasing() {
        let sequence = [0.1, 0.05, 0.3, 0.3, 0.2, 0.6, 0.59];
        let mut best: BestCheckpoint<usize> = BestCheckpoint::new();
        let mut last = 0.0;
        for (epoch, &f1) in sequence.iter().enumerate() {
            best = best.observe(epoch, &scores(f1), || epoch).0;
            assert!(best.metrics.f1 >= last);
            last = best.metrics.f1;
        }
        assert_eq!(best.select(99), 5);
    }

    #[test]
    fn test_without_improvement_the_last_model_is_kept() {
        let best: BestCheckpoint<u8> = BestCheckpoint::new();
        let (best, _) = best.observe(1, &scores(0.0), || panic!("snapshot must be lazy"));
        assert_eq!(best.select(7), 7);
    }

    #[test]
    fn test_select_prefers_snapshot_over_later_weights() {
        let device = Default::default();
        let early  = confident_model(&device);
        let mut later = early.clone();
        later.head.weight = Param::from_tensor(later.head.weight.val().add_scalar(1.0));

        let best = BestCheckpoint::new();
        let (best, _) = best.observe(1, &scores(0.5), || early.clone());
        let (best, changed) = best.observe(2, &scores(0.3), || later.clone());
        assert!(!changed);

        let chosen = best.select(later.clone());
        assert_eq!(head_weights(&chosen), head_weights(&early));
        assert_ne!(head_weights(&chosen), head_weights(&later));
    }

    #[test]
    fn test_default_rate_is_constant_without_l2() {
        let s = TrainerSettings { step: 3, weight_decay: 0.001, ..settings(15) };
        let schedule = s.schedule();
        assert!((0..15).all(|e| schedule.lr_at(e) == s.lr));
        assert_eq!(s.weight_decay_penalty(), None);

        let decayed = TrainerSettings { apply_decay: true, ..s };
        assert!(decayed.schedule().lr_at(3) < s.lr);
        assert_eq!(decayed.weight_decay_penalty(), Some(0.001));
    }

    #[test]
    fn test_training_run_records_every_epoch() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model  = config().init::<TestBackend>(&device);

        let train = BucketLoader::<TestBackend>::new(dataset(), 2, BatchOrdering::Bucketed { seed: 7 }, device);
        let val   = BucketLoader::<NdArray<f32>>::new(dataset(), 2, BatchOrdering::Sorted, device);

        let ckpt = CheckpointManager::new(dir.path(), "BiLSTMNetwork").unwrap();
        let log  = MetricsLogger::create(dir.path(), "BiLSTMNetwork").unwrap();

        let outcome = train_model(model, &train, &val, &settings(3), &ckpt, &log).unwrap();

        assert_eq!(outcome.history.train.len(), 3);
        assert_eq!(outcome.history.val.len(), 3);
        assert!(outcome.history.train.iter().chain(&outcome.history.val).all(|l| *l >= 0.0));
        assert_eq!(outcome.best.f1 > 0.0, ckpt.exists());

        let csv = std::fs::read_to_string(log.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 1 + 2 * 3);
    }

    #[test]
    fn test_returned_model_is_the_best_epoch_not_the_last() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();

        // Training pulls every probability down a little each epoch, but
        // all of them stay above the threshold, so validation F1 never
        // improves after epoch 1 while the weights keep moving.
        let train = BucketLoader::<TestBackend>::new(
            dataset_with([[0; 7]; 5]), 2, BatchOrdering::Bucketed { seed: 3 }, device,
        );
        let val = BucketLoader::<NdArray<f32>>::new(dataset(), 2, BatchOrdering::Sorted, device);

        let ckpt = CheckpointManager::new(dir.path(), "BiLSTMNetwork").unwrap();
        let log  = MetricsLogger::create(dir.path(), "BiLSTMNetwork").unwrap();
        let outcome = train_model(confident_model(&device), &train, &val, &settings(3), &ckpt, &log).unwrap();

        assert!(outcome.best.f1 > 0.0);
        assert!(ckpt.exists());

        let restored = ckpt.load_model(config().init::<TestBackend>(&device), &device).unwrap();
        assert_eq!(head_weights(&outcome.model), head_weights(&restored));

        let returned_loss = run_inference_phase(&outcome.model.valid(), &val).unwrap().metrics.loss;
        assert!((returned_loss - outcome.history.val[0]).abs() < 1e-6);
        assert!((returned_loss - outcome.history.val[2]).abs() > 1e-6);
    }
}
