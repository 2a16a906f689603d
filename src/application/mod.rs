// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per CLI command.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - No direct file parsing (that's Layer 4 and 6)
//   - Only workflow coordination

/// Train, checkpoint, then evaluate on the held-out split
pub mod train_use_case;

/// Re-evaluate a model directory
pub mod evaluate_use_case;

/// Classify an unlabelled capture
pub mod predict_use_case;
