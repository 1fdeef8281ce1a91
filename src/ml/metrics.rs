// ============================================================
// Layer 5 — Multi-label Metrics
// ============================================================
// Epoch-level metric aggregation over label matrices of shape
// (examples × 7). Rows are appended in batch order and the
// whole matrix is scored once per phase.
//
//   accuracy   fraction of rows where all 7 labels match
//   precision  ΣTP / (ΣTP + ΣFP)           (micro average)
//   recall     ΣTP / (ΣTP + ΣFN)
//   f1         2·P·R / (P + R)
//
// A zero denominator yields 0.0.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::domain::frame::{FrameClass, LabelRow, NUM_FRAMES};

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 { numerator / denominator } else { 0.0 }
}

fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    ratio(2.0 * precision * recall, precision + recall)
}

/// Loss and scores for one phase of one epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    pub loss:      f64,
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub true_positives:  usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl Counts {
    fn add(&mut self, truth: u8, predicted: u8) {
        match (truth, predicted) {
            (1, 1) => self.true_positives  += 1,
            (0, 1) => self.false_positives += 1,
            (1, 0) => self.false_negatives += 1,
            _ => {}
        }
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives as f64, (self.true_positives + self.false_positives) as f64)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives as f64, (self.true_positives + self.false_negatives) as f64)
    }

    pub fn f1(&self) -> f64 {
        harmonic_mean(self.precision(), self.recall())
    }
}

/// Per-class row of the evaluation report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassReport {
    pub class:     FrameClass,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    /// Number of examples where the class is truly present.
    pub support:   usize,
}

// ─── LabelAccumulator ─────────────────────────────────────────────────────────
/// True and predicted label matrices, grown row by row.
#[derive(Debug, Clone, Default)]
pub struct LabelAccumulator {
    y_true: Vec<LabelRow>,
    y_pred: Vec<LabelRow>,
}

impl LabelAccumulator {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, truth: &[LabelRow], predicted: &[LabelRow]) -> Result<()> {
        ensure!(
            truth.len() == predicted.len(),
            "label matrices disagree: {} true rows vs {} predicted rows",
            truth.len(),
            predicted.len(),
        );
        self.y_true.extend_from_slice(truth);
        self.y_pred.extend_from_slice(predicted);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.y_true.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.y_true.is_empty()
    }

    #[cfg(test)]
    pub fn true_rows(&self) -> &[LabelRow] {
        &self.y_true
    }

    #[cfg(test)]
    pub fn predicted_rows(&self) -> &[LabelRow] {
        &self.y_pred
    }

    /// Subset accuracy.
    pub fn accuracy(&self) -> f64 {
        let exact = self.y_true.iter().zip(&self.y_pred).filter(|(t, p)| t == p).count();
        ratio(exact as f64, self.len() as f64)
    }

    /// Counts summed over every class.
    pub fn micro_counts(&self) -> Counts {
        let mut counts = Counts::default();
        for (t, p) in self.y_true.iter().zip(&self.y_pred) {
            for c in 0..NUM_FRAMES {
                counts.add(t[c], p[c]);
            }
        }
        counts
    }

    pub fn class_counts(&self, class: FrameClass) -> Counts {
        let c = class.index();
        let mut counts = Counts::default();
        for (t, p) in self.y_true.iter().zip(&self.y_pred) {
            counts.add(t[c], p[c]);
        }
        counts
    }

    /// Scores without a loss value.
    pub fn scores(&self) -> PhaseMetrics {
        let micro     = self.micro_counts();
        let precision = micro.precision();
        let recall    = micro.recall();
        PhaseMetrics {
            loss: 0.0,
            accuracy: self.accuracy(),
            precision,
            recall,
            f1: harmonic_mean(precision, recall),
        }
    }

    pub fn class_reports(&self) -> Vec<ClassReport> {
        FrameClass::ALL
            .iter()
            .map(|&class| {
                let counts = self.class_counts(class);
                ClassReport {
                    class,
                    precision: counts.precision(),
                    recall:    counts.recall(),
                    f1:        counts.f1(),
                    support:   counts.true_positives + counts.false_negatives,
                }
            })
            .collect()
    }
}

// ─── PhaseAccumulator ─────────────────────────────────────────────────────────
/// Everything one phase collects; created fresh at the start of each phase.
#[derive(Debug, Clone, Default)]
pub struct PhaseAccumulator {
    weighted_loss: f64,
    labels:        LabelAccumulator,
}

impl PhaseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `batch_loss` is the batch mean; it is weighted by the batch size.
    pub fn add_batch(&mut self, batch_loss: f64, truth: &[LabelRow], predicted: &[LabelRow]) -> Result<()> {
        self.labels.extend(truth, predicted)?;
        self.weighted_loss += batch_loss * truth.len() as f64;
        Ok(())
    }

    #[cfg(test)]
    pub fn labels(&self) -> &LabelAccumulator {
        &self.labels
    }

    pub fn into_labels(self) -> LabelAccumulator {
        self.labels
    }

    /// Close the phase: loss = weighted loss / dataset size.
    pub fn finish(&self, dataset_size: usize) -> PhaseMetrics {
        PhaseMetrics {
            loss: ratio(self.weighted_loss, dataset_size as f64),
            ..self.labels.scores()
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: LabelRow = [1, 0, 0, 0, 0, 0, 0];
    const LOC:    LabelRow = [0, 1, 0, 0, 0, 0, 0];
    const NONE:   LabelRow = [0; NUM_FRAMES];

    #[test]
    fn test_perfect_two_example_batch() {
        let mut acc = LabelAccumulator::new();
        acc.extend(&[PERSON, LOC], &[PERSON, LOC]).unwrap();
        let m = acc.scores();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);
    }

    #[test]
    fn test_all_zero_predictions_do_not_divide_by_zero() {
        let mut acc = LabelAccumulator::new();
        acc.extend(&[PERSON, [1, 1, 0, 0, 0, 0, 1]], &[NONE, NONE]).unwrap();
        let m = acc.scores();
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.accuracy, 0.0);
    }

    #[test]
    fn test_empty_accumulator_scores_zero() {
        assert_eq!(LabelAccumulator::new().scores(), PhaseMetrics::default());
        assert_eq!(PhaseAccumulator::new().finish(0), PhaseMetrics::default());
    }

    #[test]
    fn test_micro_average_pools_classes() {
        let mut acc = LabelAccumulator::new();
        // TP=2 (PERSON row0, LOC row1), FP=1 (ORG row0), FN=1 (OTHER row1)
        acc.extend(
            &[PERSON, [0, 1, 0, 0, 0, 0, 1]],
            &[[1, 0, 1, 0, 0, 0, 0], LOC],
        )
        .unwrap();
        let m = acc.scores();
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.accuracy, 0.0);
    }

    #[test]
    fn test_subset_accuracy_needs_whole_row() {
        let mut acc = LabelAccumulator::new();
        acc.extend(&[PERSON, LOC, NONE, NONE], &[PERSON, PERSON, NONE, LOC]).unwrap();
        assert_eq!(acc.accuracy(), 0.5);
    }

    #[test]
    fn test_rows_accumulate_in_order() {
        let mut acc = PhaseAccumulator::new();
        acc.add_batch(0.5, &[PERSON], &[NONE]).unwrap();
        acc.add_batch(0.5, &[LOC, NONE], &[LOC, PERSON]).unwrap();
        assert_eq!(acc.labels().true_rows(), &[PERSON, LOC, NONE]);
        assert_eq!(acc.labels().predicted_rows(), &[NONE, LOC, PERSON]);
    }

    #[test]
    fn test_mismatched_rows_rejected() {
        let mut acc = PhaseAccumulator::new();
        assert!(acc.add_batch(0.1, &[PERSON, LOC], &[PERSON]).is_err());
        assert!(acc.labels().is_empty());
    }

    #[test]
    fn test_epoch_loss_is_weighted_mean() {
        let mut acc = PhaseAccumulator::new();
        acc.add_batch(0.25, &[NONE; 4], &[NONE; 4]).unwrap();
        acc.add_batch(1.0,  &[NONE; 2], &[NONE; 2]).unwrap();
        acc.add_batch(0.5,  &[NONE; 2], &[NONE; 2]).unwrap();
        let m = acc.finish(8);
        // (0.25·4 + 1.0·2 + 0.5·2) / 8
        assert_eq!(m.loss, 0.5);
        assert!(m.loss >= 0.0);
    }

    #[test]
    fn test_class_reports() {
        let mut acc = LabelAccumulator::new();
        acc.extend(&[PERSON, PERSON, LOC], &[PERSON, NONE, PERSON]).unwrap();
        let reports = acc.class_reports();
        assert_eq!(reports.len(), NUM_FRAMES);

        let person = reports[FrameClass::Person.index()];
        assert_eq!(person.support, 2);
        assert_eq!(person.precision, 0.5);
        assert_eq!(person.recall, 0.5);

        let loc = reports[FrameClass::Loc.index()];
        assert_eq!(loc.support, 1);
        assert_eq!(loc.recall, 0.0);
        assert_eq!(loc.f1, 0.0);
    }
}
