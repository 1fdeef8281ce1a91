// ============================================================
// Layer 3 — Frame Classes
// ============================================================
// The fixed, ordered set of semantic frame categories. Every
// label row, logit row and CSV header follows this order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of frame classes (width of every label row).
pub const NUM_FRAMES: usize = 7;

/// Probability above which a frame is predicted present.
/// Comparison is strict: exactly 0.4 is a negative prediction.
pub const DECISION_THRESHOLD: f32 = 0.4;

/// One multi-label row: 1 if the frame applies, 0 otherwise.
pub type LabelRow = [u8; NUM_FRAMES];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameClass {
    Person,
    Loc,
    Org,
    WorkOfArt,
    Product,
    Event,
    Other,
}

impl FrameClass {
    /// All classes in column order.
    pub const ALL: [FrameClass; NUM_FRAMES] = [
        FrameClass::Person,
        FrameClass::Loc,
        FrameClass::Org,
        FrameClass::WorkOfArt,
        FrameClass::Product,
        FrameClass::Event,
        FrameClass::Other,
    ];

    /// The column name used in the corpus header.
    pub fn name(self) -> &'static str {
        match self {
            FrameClass::Person    => "PERSON",
            FrameClass::Loc       => "LOC",
            FrameClass::Org       => "ORG",
            FrameClass::WorkOfArt => "WORK_OF_ART",
            FrameClass::Product   => "PRODUCT",
            FrameClass::Event     => "EVENT",
            FrameClass::Other     => "OTHER",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FrameClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Turn per-class probabilities into a label row using the
/// strict `p > threshold` rule.
pub fn threshold_row(probabilities: &[f32], threshold: f32) -> LabelRow {
    let mut row = [0u8; NUM_FRAMES];
    for (slot, &p) in row.iter_mut().zip(probabilities.iter()) {
        *slot = u8::from(p > threshold);
    }
    row
}

// ─── Network Variant ─────────────────────────────────────────────────────────
/// Which pooling the network uses. Decides the checkpoint name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    BiLstm,
    BiLstmAttention,
}

impl ModelKind {
    pub fn from_attention(attention: bool) -> Self {
        if attention { ModelKind::BiLstmAttention } else { ModelKind::BiLstm }
    }

    /// Name used for the checkpoint, plot and metrics files.
    pub fn model_name(self) -> &'static str {
        match self {
            ModelKind::BiLstm          => "BiLSTMNetwork",
            ModelKind::BiLstmAttention => "BiLSTM_AttentionNetwork",
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_order_matches_header() {
        let names: Vec<&str> = FrameClass::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            ["PERSON", "LOC", "ORG", "WORK_OF_ART", "PRODUCT", "EVENT", "OTHER"]
        );
        for (i, c) in FrameClass::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let probs = [0.4, 0.41, 0.39, 1.0, 0.0, 0.4, 0.5];
        assert_eq!(threshold_row(&probs, DECISION_THRESHOLD), [0, 1, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn test_raising_threshold_never_adds_positives() {
        let probs = [0.05, 0.2, 0.35, 0.4, 0.45, 0.7, 0.95];
        let mut previous = usize::MAX;
        for step in 0..=20 {
            let t = step as f32 * 0.05;
            let positives = threshold_row(&probs, t).iter().filter(|&&v| v == 1).count();
            assert!(positives <= previous);
            previous = positives;
        }
    }

    #[test]
    fn test_model_names() {
        assert_eq!(ModelKind::from_attention(false).model_name(), "BiLSTMNetwork");
        assert_eq!(ModelKind::from_attention(true).model_name(), "BiLSTM_AttentionNetwork");
    }
}
