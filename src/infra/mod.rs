// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Files written and read around the training core:
//
//   checkpoint.rs   best weights + architecture JSON per model name
//   vocab_store.rs  vocabulary persisted as tokenizer JSON
//   metrics.rs      per-epoch, per-phase CSV log
//   plot.rs         loss curve PNG

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary building, saving, and loading
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;

/// Train / validation loss curve rendering
pub mod plot;
