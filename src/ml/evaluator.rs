// ============================================================
// Layer 5 — Evaluation
// ============================================================
// Runs the classifier in inference mode over a held-out loader.
// Callers pass a model on a non-autodiff backend (or the output
// of model.valid()), so no graph is recorded and dropout is off.
// The same routine closes every validation phase.

use anyhow::Result;
use burn::prelude::*;
use serde::Serialize;

use crate::data::batcher::BucketLoader;
use crate::domain::frame::DECISION_THRESHOLD;
use crate::ml::metrics::{ClassReport, LabelAccumulator, PhaseAccumulator, PhaseMetrics};
use crate::ml::model::FrameClassifier;

/// Everything one inference pass over a loader produces.
pub struct InferencePass {
    pub metrics:        PhaseMetrics,
    pub labels:         LabelAccumulator,
    /// Mean over examples of the largest attention weight, for attention models.
    pub peak_attention: Option<f64>,
}

/// One pass over `loader` in inference mode.
pub fn run_inference_phase<B: Backend>(
    model:  &FrameClassifier<B>,
    loader: &BucketLoader<B>,
) -> Result<InferencePass> {
    let mut acc       = PhaseAccumulator::new();
    let mut peak_sum  = 0.0f64;
    let mut attended  = 0usize;

    for batch in loader.iter_epoch(0) {
        let (loss, output) = model.forward_loss(&batch);
        let predicted      = output.predicted_rows(DECISION_THRESHOLD)?;
        let batch_loss: f64 = loss.into_scalar().elem::<f64>();
        acc.add_batch(batch_loss, &batch.labels, &predicted)?;

        if let Some(weights) = output.attention_weights {
            peak_sum += weights.max_dim(1).sum().into_scalar().elem::<f64>();
            attended += batch.size();
        }
    }

    let metrics = acc.finish(loader.dataset_len());
    Ok(InferencePass {
        metrics,
        labels: acc.into_labels(),
        peak_attention: (attended > 0).then(|| peak_sum / attended as f64),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub examples:       usize,
    pub metrics:        PhaseMetrics,
    pub classes:        Vec<ClassReport>,
    pub peak_attention: Option<f64>,
}

impl EvaluationReport {
    pub fn log(&self) {
        tracing::info!(
            "Test set ({} examples): Accuracy: {:.4} precision: {:.4} recall: {:.4} f1-score: {:.4}",
            self.examples,
            self.metrics.accuracy,
            self.metrics.precision,
            self.metrics.recall,
            self.metrics.f1,
        );
        if let Some(peak) = self.peak_attention {
            tracing::info!("Mean peak attention weight: {:.4}", peak);
        }
        tracing::info!("{:>12} {:>9} {:>9} {:>9} {:>8}", "class", "precision", "recall", "f1", "support");
        for c in &self.classes {
            tracing::info!(
                "{:>12} {:>9.4} {:>9.4} {:>9.4} {:>8}",
                c.class.name(), c.precision, c.recall, c.f1, c.support,
            );
        }
    }
}

/// Score `model` over the full evaluation set.
pub fn evaluate<B: Backend>(model: &FrameClassifier<B>, loader: &BucketLoader<B>) -> Result<EvaluationReport> {
    let pass = run_inference_phase(model, loader)?;
    Ok(EvaluationReport {
        examples:       pass.labels.len(),
        metrics:        pass.metrics,
        classes:        pass.labels.class_reports(),
        peak_attention: pass.peak_attention,
    })
}
