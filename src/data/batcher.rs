// ============================================================
// Layer 4 — Signal Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<SignalSample>
// into tensors.
//
//   Input:  N samples, each a window of W amplitudes
//   Output: windows [N, W]  (float)
//           labels  [N]     (int, only if every sample has one)
//
// The windows are flattened into one Vec and reshaped:
//   [s1_a1, ..., s1_aW, s2_a1, ..., sN_aW] → [N, W]
//
// The model adds the channel axis itself, so the batch stays
// two-dimensional here.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::SignalSample;

// ─── SignalBatch ──────────────────────────────────────────────────────────────
/// A batch of windows ready for the forward pass.
#[derive(Debug, Clone)]
pub struct SignalBatch<B: Backend> {
    /// Amplitudes — shape: [batch_size, window_len]
    pub windows: Tensor<B, 2>,

    /// Class ids — shape: [batch_size]
    /// None when any sample in the batch is unlabelled
    pub labels: Option<Tensor<B, 1, Int>>,
}

// ─── SignalBatcher ────────────────────────────────────────────────────────────
/// Holds the device so tensors are created where the model lives.
#[derive(Clone, Debug)]
pub struct SignalBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SignalBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SignalSample, SignalBatch<B>> for SignalBatcher<B> {
    /// Every window in `items` must have the same length.
    fn batch(&self, items: Vec<SignalSample>) -> SignalBatch<B> {
        let batch_size = items.len();
        let window_len = items.first().map(|s| s.window.len()).unwrap_or(0);

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.window.iter().copied())
            .collect();

        let windows = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, window_len]);

        // Collecting into Option<Vec<_>> yields None as soon as one label is missing
        let labels: Option<Vec<i32>> = items
            .iter()
            .map(|s| s.label.map(|l| l as i32))
            .collect();

        let labels = labels.map(|l| Tensor::<B, 1, Int>::from_ints(l.as_slice(), &self.device));

        SignalBatch { windows, labels }
    }
}
