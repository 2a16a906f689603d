// ============================================================
// Layer 3 — Signal Domain Types
// ============================================================
// Plain data: windows of amplitudes, their class labels, and
// what the classifier says about them. No burn types here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::error::DataError;

/// Feature windows paired 1:1 with labels by position.
#[derive(Debug, Clone)]
pub struct LabeledWindows {
    windows: Vec<Vec<f32>>,
    labels:  Vec<usize>,
}

impl LabeledWindows {
    /// Pair windows with labels. The two sequences come from separate
    /// files, so a length mismatch means they were not produced together.
    pub fn new(windows: Vec<Vec<f32>>, labels: Vec<usize>) -> Result<Self, DataError> {
        if windows.len() != labels.len() {
            return Err(DataError::LengthMismatch {
                windows: windows.len(),
                labels:  labels.len(),
            });
        }
        Ok(Self { windows, labels })
    }

    /// Fail on the first label that is not a valid class id.
    pub fn check_labels(&self, num_classes: usize) -> Result<(), DataError> {
        match self.labels.iter().position(|&l| l >= num_classes) {
            Some(index) => Err(DataError::LabelOutOfRange {
                index,
                label: self.labels[index],
                num_classes,
            }),
            None => Ok(()),
        }
    }

    pub fn into_pairs(self) -> impl Iterator<Item = (Vec<f32>, usize)> {
        self.windows.into_iter().zip(self.labels)
    }
}

/// Classifier output for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Arg-max of the logits
    pub class: usize,
    /// Softmax of the logits, one entry per class
    pub probabilities: Vec<f32>,
}

/// Result of one evaluation pass over a held-out set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalResults {
    /// Fraction of windows whose predicted class equals the label, in [0, 1]
    pub accuracy: f64,
    /// Mean cross-entropy per window
    pub loss: f64,
    /// Number of optimizer steps the evaluated parameters have seen
    pub global_step: usize,
}

impl fmt::Display for EvalResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{accuracy: {:.6}, loss: {:.6}, global_step: {}}}",
            self.accuracy, self.loss, self.global_step
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch() {
        let err = LabeledWindows::new(vec![vec![0.0; 4]; 3], vec![0, 1]).unwrap_err();
        assert!(matches!(err, DataError::LengthMismatch { windows: 3, labels: 2 }));
    }

    #[test]
    fn test_label_out_of_range() {
        let lw  = LabeledWindows::new(vec![vec![0.0]; 3], vec![0, 1, 2]).unwrap();
        let err = lw.check_labels(2).unwrap_err();
        assert!(matches!(err, DataError::LabelOutOfRange { index: 2, label: 2, num_classes: 2 }));
        assert!(lw.check_labels(3).is_ok());
    }

    #[test]
    fn test_eval_results_display() {
        let r = EvalResults { accuracy: 0.5, loss: 0.25, global_step: 20000 };
        assert_eq!(r.to_string(), "{accuracy: 0.500000, loss: 0.250000, global_step: 20000}");
    }
}
