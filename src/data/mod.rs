// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the CSV corpus to padded tensor batches.
//
//   ontonotes_ner_{train,val,test}.csv
//       │
//       ▼
//   CsvCorpusLoader   → header check, FrameExample rows
//       │
//       ▼
//   Vocabulary        → <bos> ids… <eos> per example
//       │
//       ▼
//   FrameDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   BucketLoader      → length-bucketed index plans per epoch
//       │
//       ▼
//   FrameBatcher      → padded tensors, masks, reversal indices
//
// Pretrained word vectors are read by `vectors` and only
// touch the embedding table.

/// Typed corpus format errors
pub mod error;

/// Reads the three CSV splits
pub mod loader;

/// Word-level vocabulary and text encoding
pub mod vocab;

/// GloVe-format pretrained vectors
pub mod vectors;

/// Implements Burn's Dataset trait for encoded examples
pub mod dataset;

/// Padding, masks and bucketed batch ordering
pub mod batcher;
