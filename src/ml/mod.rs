// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model, optimizer and backend code lives here.
//
//   model.rs     — the dilated CNN topology and its Config
//                  • two dilated conv + max pool stages
//                  • dense + dropout
//                  • two-class logits head
//
//   estimator.rs — the mode-dispatched model function
//                  (train / evaluate / predict) plus the
//                  evaluate and predict drivers
//
//   trainer.rs   — the step-budget training loop with the
//                  logging and checkpoint hooks
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

use burn::prelude::*;

/// Dilated CNN architecture and configuration
pub mod model;

/// Train / evaluate / predict over one parameter set
pub mod estimator;

/// Step-budget training loop
pub mod trainer;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray<f32>;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

/// Backend used for training: gradients tracked on top of InferBackend
pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

pub fn default_device() -> <InferBackend as Backend>::Device {
    Default::default()
}
