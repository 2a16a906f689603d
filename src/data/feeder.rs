// ============================================================
// Layer 4 — Input Feed
// ============================================================
// The training feed: walks a dataset in order, never shuffling,
// and repeats forever with batches wrapping around the end of
// the dataset.
//
// With 3 samples and batch_size 2 it yields
//   [s0 s1] [s2 s0] [s1 s2] [s0 s1] ...
// so every batch is full even when the dataset is smaller than
// a batch. Burn's DataLoader stops at the end of an epoch, which
// is what evaluation and prediction use instead.

use burn::data::dataset::Dataset;

use crate::data::dataset::SignalSample;

pub struct InputFeed<'a, D: Dataset<SignalSample>> {
    dataset:    &'a D,
    batch_size: usize,
    /// Samples handed out so far, across epochs
    cursor:     usize,
}

impl<'a, D: Dataset<SignalSample>> InputFeed<'a, D> {
    /// Sequential batches that never run out.
    pub fn repeating(dataset: &'a D, batch_size: usize) -> Self {
        Self { dataset, batch_size: batch_size.max(1), cursor: 0 }
    }
}

impl<'a, D: Dataset<SignalSample>> Iterator for InputFeed<'a, D> {
    type Item = Vec<SignalSample>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.dataset.len();
        if len == 0 {
            return None;
        }

        let batch = (self.cursor..self.cursor + self.batch_size)
            .filter_map(|i| self.dataset.get(i % len))
            .collect();
        self.cursor = (self.cursor + self.batch_size) % len;

        Some(batch)
    }
}
