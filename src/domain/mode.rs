// ============================================================
// Layer 3 — Model Modes
// ============================================================
// One topology, three behaviours. The estimator takes a batch
// tagged with its mode and hands back the matching ModeOutput
// variant:
//
//   Train    → loss + one optimizer step
//   Evaluate → loss + correct count, parameters untouched
//   Predict  → class + probabilities, no labels needed

use crate::domain::signal::Prediction;

/// What a single training step produced.
#[derive(Debug, Clone)]
pub struct TrainStep {
    /// Global step after this update
    pub global_step: usize,
    /// Mean cross-entropy of the batch before the update
    pub loss: f64,
    /// Softmax of the batch logits, one row per window
    pub probabilities: Vec<Vec<f32>>,
}

/// Partial sums from one evaluation batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalBatch {
    /// Batch mean loss multiplied by the batch size
    pub loss_sum: f64,
    pub correct:  usize,
    pub total:    usize,
}

impl EvalBatch {
    pub fn merge(self, other: EvalBatch) -> EvalBatch {
        EvalBatch {
            loss_sum: self.loss_sum + other.loss_sum,
            correct:  self.correct + other.correct,
            total:    self.total + other.total,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ModeOutput {
    Train(TrainStep),
    Evaluate(EvalBatch),
    Predict(Vec<Prediction>),
}
