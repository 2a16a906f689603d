// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Splits samples into a training prefix and a test suffix:
//
//   [ w0 w1 ... w(k-1) | wk ... w(n-1) ]
//     training          test
//
//   k = floor(n * train_fraction)
//
// No shuffling: captures are recorded in time order and the
// test set must be the tail of the recording. Windows and labels
// travel together inside each sample so they can't drift apart.
//
// Reference: Rust Book §8 (Vectors) — Vec::split_off

/// Split `samples` into (train, test) at `floor(len * train_fraction)`.
///
/// # Example
/// ```ignore
/// let (train, test) = split_by_index(all_samples, 0.5);
/// // train = first half, test = second half, order untouched
/// ```
pub fn split_by_index<T>(mut samples: Vec<T>, train_fraction: f64) -> (Vec<T>, Vec<T>) {
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction.clamp(0.0, 1.0)) as usize;
    let split_at = split_at.min(total);

    // split_off(n) leaves [0..n) in `samples` and returns [n..total)
    let test = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} test (fraction {})",
        samples.len(),
        test.len(),
        train_fraction,
    );

    (samples, test)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_split_uses_integer_division() {
        for n in [0usize, 1, 2, 7, 100, 101] {
            let items: Vec<usize> = (0..n).collect();
            let (train, test)     = split_by_index(items, 0.5);
            assert_eq!(train.len(), n / 2);
            assert_eq!(train.len() + test.len(), n);
        }
    }

    #[test]
    fn test_order_is_preserved() {
        let items: Vec<usize> = (0..9).collect();
        let (train, test)     = split_by_index(items.clone(), 0.5);
        let rejoined: Vec<usize> = train.into_iter().chain(test).collect();
        assert_eq!(rejoined, items);
    }

    #[test]
    fn test_fraction_truncates() {
        // 10 * 0.79 = 7.9 → 7
        let items: Vec<usize> = (0..10).collect();
        let (train, test)     = split_by_index(items, 0.79);
        assert_eq!(train, (0..7).collect::<Vec<_>>());
        assert_eq!(test, vec![7, 8, 9]);
    }

    #[test]
    fn test_full_training_split() {
        let items: Vec<usize> = (0..10).collect();
        let (train, test)     = split_by_index(items, 1.0);
        assert_eq!(train.len(), 10);
        assert!(test.is_empty());
    }
}
