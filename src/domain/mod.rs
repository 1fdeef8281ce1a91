// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing the problem: the seven frame
// classes, a labelled text example, the corpus splits and the
// two network variants.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// Frame classes, label rows and the network variant names
pub mod frame;

// A labelled text example as read from the corpus
pub mod example;

// Core abstractions (traits) that other layers implement
pub mod traits;
