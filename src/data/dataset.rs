use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::signal::LabeledWindows;

/// One window of amplitudes, optionally labelled.
/// Prediction inputs carry no label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSample {
    pub window: Vec<f32>,
    pub label:  Option<usize>,
}

impl SignalSample {
    pub fn labeled(window: Vec<f32>, label: usize) -> Self {
        Self { window, label: Some(label) }
    }

    pub fn unlabeled(window: Vec<f32>) -> Self {
        Self { window, label: None }
    }
}

#[derive(Debug, Clone)]
pub struct SignalDataset {
    samples: Vec<SignalSample>,
}

impl SignalDataset {
    pub fn new(samples: Vec<SignalSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl From<LabeledWindows> for Vec<SignalSample> {
    fn from(windows: LabeledWindows) -> Self {
        windows
            .into_pairs()
            .map(|(window, label)| SignalSample::labeled(window, label))
            .collect()
    }
}

impl Dataset<SignalSample> for SignalDataset {
    fn get(&self, index: usize) -> Option<SignalSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
