// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only sees these traits; the CSV
// loader in the data layer is the production implementation.

use anyhow::Result;
use std::fmt;

use crate::domain::example::FrameExample;

/// The three fixed corpus partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val   => "val",
            Split::Test  => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can hand out the labelled examples of a split.
pub trait CorpusSource {
    fn load_split(&self, split: Split) -> Result<Vec<FrameExample>>;
}
