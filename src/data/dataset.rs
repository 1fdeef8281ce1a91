use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::vocab::Vocabulary;
use crate::domain::example::FrameExample;
use crate::domain::frame::LabelRow;

/// One encoded example: `<bos> ids… <eos>` and its label row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSample {
    pub token_ids: Vec<u32>,
    pub labels:    LabelRow,
}

impl FrameSample {
    pub fn len(&self) -> usize {
        self.token_ids.len()
    }
}

pub struct FrameDataset {
    samples: Vec<FrameSample>,
}

impl FrameDataset {
    pub fn new(samples: Vec<FrameSample>) -> Self { Self { samples } }

    /// Encode every example with the shared vocabulary.
    pub fn encode(examples: &[FrameExample], vocab: &Vocabulary) -> Result<Self> {
        let samples = examples
            .iter()
            .map(|ex| {
                Ok(FrameSample {
                    token_ids: vocab.encode(&ex.text)?,
                    labels:    ex.labels,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(samples))
    }

    /// Token count of every sample, in dataset order.
    pub fn lengths(&self) -> Vec<usize> {
        self.samples.iter().map(FrameSample::len).collect()
    }
}

impl Dataset<FrameSample> for FrameDataset {
    fn get(&self, index: usize) -> Option<FrameSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
