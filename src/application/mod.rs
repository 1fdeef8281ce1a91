// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training or evaluating a frame classifier).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination and backend selection

// Run configuration and the training workflow
pub mod train_use_case;

// The `--test` evaluation workflow
pub mod evaluate_use_case;
