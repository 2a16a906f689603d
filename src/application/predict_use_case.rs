// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Classifies every window of an unlabelled features file with
// the latest checkpoint in a model directory. The window length
// and topology come from the saved train_config.json.

use anyhow::{Context, Result};

use crate::application::train_use_case::load_trained_config;
use crate::data::{loader::ColumnSpec, windows::into_windows};
use crate::domain::signal::Prediction;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    default_device,
    estimator::{sgd, Estimator},
    TrainBackend,
};

pub struct PredictUseCase {
    model_dir:  String,
    features:   ColumnSpec,
    batch_size: usize,
}

impl PredictUseCase {
    pub fn new(model_dir: String, features: ColumnSpec, batch_size: usize) -> Self {
        Self { model_dir, features, batch_size }
    }

    /// One prediction per window, in file order.
    pub fn execute(&self) -> Result<Vec<Prediction>> {
        let ckpt = CheckpointManager::new(&self.model_dir);
        let cfg  = load_trained_config(&ckpt)?;

        let samples: Vec<f32> = self
            .features
            .read()
            .with_context(|| format!("Cannot read features for '{}'", self.model_dir))?;
        let windows = into_windows(samples, cfg.model.window_len)?;
        tracing::info!("Classifying {} windows", windows.len());

        let mut estimator = Estimator::<TrainBackend, _>::restore_or_init(
            &ckpt,
            cfg.model.clone(),
            sgd::<TrainBackend>(),
            cfg.learning_rate,
            default_device(),
        )?;
        estimator.predict(windows, self.batch_size)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use std::fs;

    fn trained_model(dir: &std::path::Path) -> TrainConfig {
        let features = dir.join("rx.csv");
        let labels   = dir.join("tx.csv");
        let mut body = "h\n".repeat(7);
        for i in 0..32 {
            body.push_str(&format!("{i},{}\n", if i < 16 { -0.4 } else { 0.4 }));
        }
        fs::write(&features, body).unwrap();
        fs::write(&labels, "0\n1\n").unwrap();

        let cfg = TrainConfig {
            features_path: features.to_string_lossy().into_owned(),
            labels_path:   labels.to_string_lossy().into_owned(),
            model_dir:     dir.join("model").to_string_lossy().into_owned(),
            steps:         2,
            ..TrainConfig::default()
        };
        TrainUseCase::new(cfg.clone()).execute().unwrap();
        cfg
    }

    #[test]
    fn test_one_prediction_per_window() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = trained_model(dir.path());

        let unlabeled = dir.path().join("unlabeled.csv");
        let rows: String = (0..48).map(|i| format!("{}\n", (i % 3) as f32 * 0.1)).collect();
        fs::write(&unlabeled, rows).unwrap();

        let uc = PredictUseCase::new(cfg.model_dir, ColumnSpec::new(&unlabeled, 0, 0), 2);
        let predictions = uc.execute().unwrap();

        assert_eq!(predictions.len(), 3);
        for p in &predictions {
            assert_eq!(p.probabilities.len(), 2);
            assert!(p.class < 2);
            assert!((p.probabilities.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_partial_window_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = trained_model(dir.path());

        let unlabeled = dir.path().join("short.csv");
        fs::write(&unlabeled, "0.1\n".repeat(20)).unwrap();

        let uc = PredictUseCase::new(cfg.model_dir, ColumnSpec::new(&unlabeled, 0, 0), 8);
        assert!(uc.execute().is_err());
    }
}
