// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums and traits describing signal windows,
// labels, classifier modes and results.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain data and traits

// Windows, labels, predictions, evaluation results
pub mod signal;

// Train / evaluate / predict dispatch types
pub mod mode;

// Abstractions other layers implement
pub mod traits;
