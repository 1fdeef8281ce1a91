// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
//   encoder.rs    embedding + stacked bidirectional LSTM
//   pooling.rs    summary contract + final-state pooling
//   attention.rs  additive attention pooling
//   model.rs      classifier head, sigmoid outputs, BCE loss
//   metrics.rs    multi-label accuracy / micro P, R, F1
//   schedule.rs   step learning-rate decay
//   trainer.rs    epoch × {train, val} loop, best checkpoint
//   evaluator.rs  inference-mode pass and test report

/// Embedding table and bidirectional recurrent layers
pub mod encoder;

/// Pooled-summary contract shared by both strategies
pub mod pooling;

/// Attention-weighted pooling
pub mod attention;

/// Frame classifier architecture
pub mod model;

/// Epoch-level metric aggregation
pub mod metrics;

/// Learning-rate schedule
pub mod schedule;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference-mode evaluation
pub mod evaluator;
