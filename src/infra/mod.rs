// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several layers:
//
//   checkpoint.rs — model directory: parameters via Burn's
//                   CompactRecorder, latest step pointer and
//                   the saved TrainConfig
//
//   metrics.rs    — training / evaluation CSV logs
//
//   logging.rs    — tracing subscriber setup
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving, loading and pruning
pub mod checkpoint;

/// Training and evaluation metrics CSV logger
pub mod metrics;

/// tracing-subscriber initialisation
pub mod logging;
