// ============================================================
// Layer 4 — Signal Windowing
// ============================================================
// Groups a flat amplitude trace into fixed-length windows,
// one window per transmitted symbol:
//
//   samples:  s0 s1 ... s15 | s16 ... s31 | s32 ...
//   windows:  [  window 0  ] [  window 1  ] ...
//
// Unlike a sliding-window chunker there is no overlap and no
// ragged tail: the trace must split exactly, otherwise the
// features and labels can't line up.

use crate::data::error::DataError;

/// Split `samples` into consecutive windows of `window_len` values.
pub fn into_windows(samples: Vec<f32>, window_len: usize) -> Result<Vec<Vec<f32>>, DataError> {
    if window_len == 0 || samples.len() % window_len != 0 {
        return Err(DataError::ShapeMismatch { samples: samples.len(), window_len });
    }

    Ok(samples.chunks_exact(window_len).map(<[f32]>::to_vec).collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_split() {
        let samples: Vec<f32> = (0..32).map(|i| i as f32).collect();
        let windows = into_windows(samples, 16).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1][0], 16.0);
        assert!(windows.iter().all(|w| w.len() == 16));
    }

    #[test]
    fn test_ragged_tail_is_rejected() {
        let err = into_windows(vec![0.0; 33], 16).unwrap_err();
        assert!(matches!(err, DataError::ShapeMismatch { samples: 33, window_len: 16 }));
    }

    #[test]
    fn test_zero_window_len_is_rejected() {
        assert!(into_windows(vec![0.0; 4], 0).is_err());
    }

    #[test]
    fn test_empty_trace_gives_no_windows() {
        assert!(into_windows(Vec::new(), 16).unwrap().is_empty());
    }
}
