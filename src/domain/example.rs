// ============================================================
// Layer 3 — Frame Example
// ============================================================
// One labelled corpus row: the raw text span and its frame
// labels. Tokenisation happens later in the data layer.

use serde::{Deserialize, Serialize};

use crate::domain::frame::LabelRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameExample {
    pub text:   String,
    pub labels: LabelRow,
}

impl FrameExample {
    pub fn new(text: impl Into<String>, labels: LabelRow) -> Self {
        Self { text: text.into(), labels }
    }

    /// Number of frames marked present.
    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&v| v == 1).count()
    }

    /// True when no frame applies to this span.
    pub fn is_unlabelled(&self) -> bool {
        self.positive_count() == 0
    }
}
