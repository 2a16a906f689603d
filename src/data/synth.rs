// ============================================================
// Layer 4 — Synthetic NRZ Captures
// ============================================================
// Generates a received NRZ waveform and the transmitted bits
// so the whole pipeline can run without lab captures.
//
// Signal model per bit:
//   1. level = +amplitude for a 1, -amplitude for a 0
//   2. held for samples_per_symbol samples
//   3. passed through a one-pole low-pass (smoothing) to give
//      finite rise times and inter-symbol interference
//   4. plus white Gaussian noise (Box–Muller over rand)
//
// Files are written in the same layout the loader expects:
//   features: 7 metadata rows, then "time,amplitude" rows
//   labels:   one bit per row, no header

use std::path::Path;

use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Number of metadata rows written before the samples.
pub const FEATURE_HEADER_ROWS: usize = 7;

#[derive(Debug, Clone)]
pub struct NrzSynthConfig {
    pub symbols:            usize,
    pub samples_per_symbol: usize,
    pub amplitude:          f32,
    pub noise_std:          f32,
    /// One-pole coefficient in [0, 1): 0 = ideal edges
    pub smoothing:          f32,
    /// Seconds between samples, only written to the header
    pub sample_interval:    f64,
    pub seed:               u64,
}

impl Default for NrzSynthConfig {
    fn default() -> Self {
        Self {
            symbols:            4096,
            samples_per_symbol: 16,
            amplitude:          0.4,
            noise_std:          0.08,
            smoothing:          0.6,
            sample_interval:    6.25e-12,
            seed:               7,
        }
    }
}

/// A generated waveform and the bits that produced it.
#[derive(Debug, Clone)]
pub struct NrzCapture {
    pub amplitudes: Vec<f32>,
    pub bits:       Vec<u8>,
}

pub fn generate(cfg: &NrzSynthConfig) -> NrzCapture {
    let mut rng   = StdRng::seed_from_u64(cfg.seed);
    let smoothing = cfg.smoothing.clamp(0.0, 0.999);

    let bits: Vec<u8> = (0..cfg.symbols).map(|_| rng.gen_bool(0.5) as u8).collect();

    let mut amplitudes = Vec::with_capacity(cfg.symbols * cfg.samples_per_symbol);
    let mut state      = 0.0f32;

    for &bit in &bits {
        let level = if bit == 1 { cfg.amplitude } else { -cfg.amplitude };
        for _ in 0..cfg.samples_per_symbol {
            state = smoothing * state + (1.0 - smoothing) * level;
            amplitudes.push(state + cfg.noise_std * standard_normal(&mut rng));
        }
    }

    tracing::debug!(
        "Generated {} bits, {} samples (noise σ={}, smoothing={})",
        bits.len(),
        amplitudes.len(),
        cfg.noise_std,
        smoothing
    );

    NrzCapture { amplitudes, bits }
}

fn standard_normal(rng: &mut StdRng) -> f32 {
    // u1 in (0, 1] keeps ln() finite
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    ((-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()) as f32
}

/// Write `capture` as a features file and a labels file.
pub fn write_capture(
    capture:         &NrzCapture,
    cfg:             &NrzSynthConfig,
    features_path:   &Path,
    labels_path:     &Path,
) -> Result<()> {
    for path in [features_path, labels_path] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
    }

    let mut features = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(features_path)
        .with_context(|| format!("Cannot create '{}'", features_path.display()))?;

    let header: [Vec<String>; FEATURE_HEADER_ROWS] = [
        vec!["Format".into(), "NRZ-SYNTH".into()],
        vec!["Memory Length".into(), capture.amplitudes.len().to_string()],
        vec!["Source".into(), "CH1".into()],
        vec!["Vertical Units".into(), "V".into()],
        vec!["Horizontal Units".into(), "S".into()],
        vec!["Sample Interval".into(), format!("{:e}", cfg.sample_interval)],
        vec!["TIME".into(), "CH1".into()],
    ];
    for row in &header {
        features.write_record(row)?;
    }
    for (i, amp) in capture.amplitudes.iter().enumerate() {
        let t = i as f64 * cfg.sample_interval;
        features.write_record([format!("{t:e}"), format!("{amp:.6}")])?;
    }
    features.flush()?;

    let mut labels = csv::Writer::from_path(labels_path)
        .with_context(|| format!("Cannot create '{}'", labels_path.display()))?;
    for bit in &capture.bits {
        labels.write_record([bit.to_string()])?;
    }
    labels.flush()?;

    tracing::info!(
        "Wrote {} samples to '{}' and {} labels to '{}'",
        capture.amplitudes.len(),
        features_path.display(),
        capture.bits.len(),
        labels_path.display()
    );
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_column;

    fn small() -> NrzSynthConfig {
        NrzSynthConfig { symbols: 10, samples_per_symbol: 16, ..Default::default() }
    }

    #[test]
    fn test_lengths_and_bit_values() {
        let cap = generate(&small());
        assert_eq!(cap.bits.len(), 10);
        assert_eq!(cap.amplitudes.len(), 160);
        assert!(cap.bits.iter().all(|&b| b <= 1));
    }

    #[test]
    fn test_same_seed_same_capture() {
        let a = generate(&small());
        let b = generate(&small());
        assert_eq!(a.bits, b.bits);
        assert_eq!(a.amplitudes, b.amplitudes);
    }

    #[test]
    fn test_noise_free_levels_follow_bits() {
        let cfg = NrzSynthConfig { noise_std: 0.0, smoothing: 0.0, ..small() };
        let cap = generate(&cfg);
        for (i, &bit) in cap.bits.iter().enumerate() {
            let sample = cap.amplitudes[i * 16 + 8];
            assert_eq!(sample > 0.0, bit == 1);
        }
    }

    #[test]
    fn test_written_files_load_back() {
        let dir      = tempfile::tempdir().unwrap();
        let features = dir.path().join("rx.csv");
        let labels   = dir.path().join("tx.csv");
        let cfg      = small();
        let cap      = generate(&cfg);
        write_capture(&cap, &cfg, &features, &labels).unwrap();

        let amps: Vec<f32> = read_column(&features, 1, FEATURE_HEADER_ROWS).unwrap();
        let bits: Vec<usize> = read_column(&labels, 0, 0).unwrap();
        assert_eq!(amps.len(), 160);
        assert_eq!(bits, cap.bits.iter().map(|&b| b as usize).collect::<Vec<_>>());
    }
}
