// ============================================================
// Layer 4 — Frame Batcher
// ============================================================
// Turns a Vec<FrameSample> of uneven lengths into one padded
// batch, and plans which samples go together each epoch.
//
// Shapes produced for a batch of N samples, longest length T:
//   tokens         [N, T]  Int   right-padded with <pad>
//   lengths        [N]     Int   valid steps per row
//   reverse_index  [N, T]  Int   t → L-1-t inside the valid prefix,
//                                identity on padding
//   padding_mask   [N, T]  Bool  true on padding
//   targets        [N, 7]  Int   label rows
//
// Batch planning:
//   training    shuffle → pools of 100 × batch_size sorted by
//               length → batches → shuffle batch order
//   evaluation  stable sort by length → batches

use burn::{data::dataset::Dataset, prelude::*, tensor::TensorData};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::dataset::{FrameDataset, FrameSample};
use crate::data::vocab::PAD_ID;
use crate::domain::frame::{LabelRow, NUM_FRAMES};

/// Pools hold this many batches before length sorting.
const POOL_BATCHES: usize = 100;

// ─── FrameBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct FrameBatch<B: Backend> {
    pub tokens:        Tensor<B, 2, Int>,
    pub lengths:       Tensor<B, 1, Int>,
    pub reverse_index: Tensor<B, 2, Int>,
    pub padding_mask:  Tensor<B, 2, Bool>,
    pub targets:       Tensor<B, 2, Int>,
    /// Host copy of `targets` for metric accumulation.
    pub labels:        Vec<LabelRow>,
}

impl<B: Backend> FrameBatch<B> {
    /// Number of examples in the batch.
    pub fn size(&self) -> usize {
        self.labels.len()
    }
}

// ─── FrameBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct FrameBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> FrameBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// `items` must be non-empty and every sample at least one token long.
    pub fn batch(&self, items: Vec<FrameSample>) -> FrameBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.iter().map(FrameSample::len).max().unwrap_or(1).max(1);

        let mut tokens   = Vec::with_capacity(batch_size * seq_len);
        let mut reverse  = Vec::with_capacity(batch_size * seq_len);
        let mut padding  = Vec::with_capacity(batch_size * seq_len);
        let mut lengths  = Vec::with_capacity(batch_size);
        let mut targets  = Vec::with_capacity(batch_size * NUM_FRAMES);
        let mut labels   = Vec::with_capacity(batch_size);

        for sample in &items {
            let len = sample.len();
            for t in 0..seq_len {
                if t < len {
                    tokens.push(sample.token_ids[t] as i32);
                    reverse.push((len - 1 - t) as i32);
                    padding.push(false);
                } else {
                    tokens.push(PAD_ID as i32);
                    reverse.push(t as i32);
                    padding.push(true);
                }
            }
            lengths.push(len as i32);
            targets.extend(sample.labels.iter().map(|&v| v as i32));
            labels.push(sample.labels);
        }

        let tokens = Tensor::<B, 1, Int>::from_ints(tokens.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let reverse_index = Tensor::<B, 1, Int>::from_ints(reverse.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let lengths = Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), &self.device);
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device)
            .reshape([batch_size, NUM_FRAMES]);
        let padding_mask = Tensor::<B, 2, Bool>::from_data(
            TensorData::new(padding, [batch_size, seq_len]),
            &self.device,
        );

        FrameBatch { tokens, lengths, reverse_index, padding_mask, targets, labels }
    }
}

// ─── Batch planning ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOrdering {
    /// Shuffled, length-bucketed, reshuffled every epoch from `seed`.
    Bucketed { seed: u64 },
    /// Deterministic length order.
    Sorted,
}

/// Index groups for one pass over a dataset with the given `lengths`.
pub fn plan_batches(
    lengths:    &[usize],
    batch_size: usize,
    ordering:   BatchOrdering,
    epoch:      usize,
) -> Vec<Vec<usize>> {
    let batch_size = batch_size.max(1);
    let mut order: Vec<usize> = (0..lengths.len()).collect();

    match ordering {
        BatchOrdering::Sorted => {
            order.sort_by_key(|&i| lengths[i]);
            order.chunks(batch_size).map(<[usize]>::to_vec).collect()
        }
        BatchOrdering::Bucketed { seed } => {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(epoch as u64));
            order.shuffle(&mut rng);

            let mut batches: Vec<Vec<usize>> = Vec::new();
            for pool in order.chunks_mut(batch_size * POOL_BATCHES) {
                pool.sort_by_key(|&i| lengths[i]);
                batches.extend(pool.chunks(batch_size).map(<[usize]>::to_vec));
            }
            batches.shuffle(&mut rng);
            batches
        }
    }
}

// ─── BucketLoader ─────────────────────────────────────────────────────────────
/// Owns a dataset and hands out padded batches for one epoch at a time.
pub struct BucketLoader<B: Backend> {
    dataset:    FrameDataset,
    lengths:    Vec<usize>,
    batcher:    FrameBatcher<B>,
    batch_size: usize,
    ordering:   BatchOrdering,
}

impl<B: Backend> BucketLoader<B> {
    pub fn new(
        dataset:    FrameDataset,
        batch_size: usize,
        ordering:   BatchOrdering,
        device:     B::Device,
    ) -> Self {
        let lengths = dataset.lengths();
        Self {
            dataset,
            lengths,
            batcher: FrameBatcher::new(device),
            batch_size: batch_size.max(1),
            ordering,
        }
    }

    /// Number of examples per pass.
    pub fn dataset_len(&self) -> usize {
        self.dataset.len()
    }

    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    pub fn iter_epoch(&self, epoch: usize) -> impl Iterator<Item = FrameBatch<B>> + '_ {
        plan_batches(&self.lengths, self.batch_size, self.ordering, epoch)
            .into_iter()
            .map(move |indices| {
                let items = indices.iter().filter_map(|&i| self.dataset.get(i)).collect();
                self.batcher.batch(items)
            })
    }
}
