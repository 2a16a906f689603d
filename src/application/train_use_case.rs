// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full run, in order:
//
//   Step 1: Load features + labels       (Layer 4 - data)
//   Step 2: Window, check, split         (Layer 4 - data)
//   Step 3: Check / save model dir       (Layer 6 - infra)
//   Step 4: Restore or init estimator    (Layer 5 - ml)
//   Step 5: Train for the step budget    (Layer 5 - ml)
//   Step 6: Evaluate once on the test    (Layer 5 - ml)
//           split and log the metrics

use anyhow::{Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{SignalDataset, SignalSample},
    loader::{ColumnSpec, CsvSignalSource},
    splitter::split_by_index,
};
use crate::domain::{signal::EvalResults, traits::WindowSource};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    default_device,
    estimator::{sgd, Estimator},
    model::DilatedCnnConfig,
    trainer::run_training,
    TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs. Saved as train_config.json in the model
// directory so `evaluate` and `predict` can rebuild the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub features_path:       String,
    pub feature_column:      usize,
    pub feature_header_rows: usize,
    pub labels_path:         String,
    pub label_column:        usize,
    pub label_header_rows:   usize,
    pub model_dir:           String,
    /// Leading fraction of the windows used for training
    pub training_portion:    f64,
    pub batch_size:          usize,
    pub eval_batch_size:     usize,
    /// Optimizer steps to run on top of any restored global step
    pub steps:               usize,
    pub learning_rate:       f64,
    pub log_every:           usize,
    pub checkpoint_every:    usize,
    /// Model files kept in the model directory (0 = all)
    pub keep_checkpoints:    usize,
    /// Backend seed for parameter init and dropout; None = unseeded
    pub seed:                Option<u64>,
    pub model:               DilatedCnnConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            features_path:       "data/data_Binary_NRZ_RX(small).csv".to_string(),
            feature_column:      1,
            feature_header_rows: 7,
            labels_path:         "data/labels_Binary_NRZ_TX.csv".to_string(),
            label_column:        0,
            label_header_rows:   0,
            model_dir:           "/tmp/dilated_cnn_model".to_string(),
            training_portion:    0.5,
            batch_size:          64,
            eval_batch_size:     128,
            steps:               20_000,
            learning_rate:       0.001,
            log_every:           50,
            checkpoint_every:    1_000,
            keep_checkpoints:    5,
            seed:                None,
            model:               DilatedCnnConfig::new(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train, then evaluate once on the held-out split.
    pub fn execute(&self) -> Result<EvalResults> {
        let cfg = &self.config;

        // ── Steps 1-2: Load, window and split ─────────────────────────────────
        let (train_dataset, test_dataset) = load_split(cfg)?;

        // ── Step 3: Model directory ───────────────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.model_dir);
        ensure_same_topology(&ckpt, &cfg.model)?;
        ckpt.save_config(cfg)?;

        // ── Step 4: Estimator ─────────────────────────────────────────────────
        if let Some(seed) = cfg.seed {
            TrainBackend::seed(seed);
        }
        let mut estimator = Estimator::<TrainBackend, _>::restore_or_init(
            &ckpt,
            cfg.model.clone(),
            sgd::<TrainBackend>(),
            cfg.learning_rate,
            default_device(),
        )?;

        // ── Step 5: Training loop (Layer 5) ───────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.model_dir)?;
        run_training(&mut estimator, &train_dataset, cfg, &ckpt, &metrics)?;

        // ── Step 6: Single evaluation pass ────────────────────────────────────
        let results = estimator.evaluate(test_dataset, cfg.eval_batch_size)?;
        metrics.log_eval(&results)?;

        Ok(results)
    }
}

/// Load both files, window the features and split into (train, test).
pub(crate) fn load_split(cfg: &TrainConfig) -> Result<(SignalDataset, SignalDataset)> {
    tracing::info!("Loading features from '{}'", cfg.features_path);
    let source = CsvSignalSource::new(
        ColumnSpec::new(&cfg.features_path, cfg.feature_column, cfg.feature_header_rows),
        ColumnSpec::new(&cfg.labels_path, cfg.label_column, cfg.label_header_rows),
        cfg.model.window_len,
    );

    let windows = source.load_windows()?;
    windows.check_labels(cfg.model.num_classes)?;

    let samples: Vec<SignalSample> = windows.into();
    let (train, test) = split_by_index(samples, cfg.training_portion);
    tracing::info!("Split: {} training windows, {} test windows", train.len(), test.len());

    Ok((SignalDataset::new(train), SignalDataset::new(test)))
}

/// Parameters in the model directory only fit the topology they were trained with.
fn ensure_same_topology(ckpt: &CheckpointManager, model: &DilatedCnnConfig) -> Result<()> {
    let Some(saved) = ckpt.load_config()? else {
        return Ok(());
    };
    if ckpt.latest_step()?.is_none() {
        return Ok(());
    }

    let saved_json = serde_json::to_value(&saved.model)?;
    let wanted_json = serde_json::to_value(model)?;
    if saved_json != wanted_json {
        anyhow::bail!(
            "model directory '{}' holds a different topology ({}); use another --model-dir",
            ckpt.dir().display(),
            saved.model
        );
    }
    Ok(())
}

/// Fails with a readable message when nothing has been trained in `model_dir` yet.
pub(crate) fn load_trained_config(ckpt: &CheckpointManager) -> Result<TrainConfig> {
    let cfg = ckpt.load_config()?.with_context(|| {
        format!("No train_config.json in '{}'. Run 'train' first.", ckpt.dir().display())
    })?;
    if ckpt.latest_step()?.is_none() {
        anyhow::bail!("No checkpoint in '{}'. Run 'train' first.", ckpt.dir().display());
    }
    Ok(cfg)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};

    /// 7 header rows + 32 samples (two windows of 16), labels 0 and 1.
    fn write_tiny_capture(dir: &Path) -> (String, String) {
        let features = dir.join("rx.csv");
        let labels   = dir.join("tx.csv");

        let mut body = String::new();
        for i in 0..7 {
            body.push_str(&format!("header{i},meta\n"));
        }
        for i in 0..32 {
            let level = if i < 16 { -0.4 } else { 0.4 };
            body.push_str(&format!("{i}e-12,{level}\n"));
        }
        fs::write(&features, body).unwrap();
        fs::write(&labels, "0\n1\n").unwrap();

        (features.to_string_lossy().into_owned(), labels.to_string_lossy().into_owned())
    }

    fn tiny_config(dir: &Path) -> TrainConfig {
        let (features_path, labels_path) = write_tiny_capture(dir);
        TrainConfig {
            features_path,
            labels_path,
            model_dir:        dir.join("model").to_string_lossy().into_owned(),
            steps:            5,
            batch_size:       8,
            log_every:        2,
            checkpoint_every: 0,
            seed:             Some(1),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_tiny_capture_splits_one_and_one() {
        let dir = tempfile::tempdir().unwrap();
        let (train, test) = load_split(&tiny_config(dir.path())).unwrap();
        assert_eq!(train.sample_count(), 1);
        assert_eq!(test.sample_count(), 1);
    }

    #[test]
    fn test_end_to_end_train_and_evaluate() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());

        let results = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert!((0.0..=1.0).contains(&results.accuracy));
        assert!(results.loss.is_finite());
        assert_eq!(results.global_step, 5);

        let ckpt = CheckpointManager::new(&cfg.model_dir);
        assert_eq!(ckpt.latest_step().unwrap(), Some(5));
        assert!(ckpt.load_config().unwrap().is_some());
    }

    #[test]
    fn test_ragged_feature_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        fs::write(&cfg.features_path, "h\nh\nh\nh\nh\nh\nh\n0,1.0\n1,2.0\n").unwrap();
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }

    #[test]
    fn test_changed_topology_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        TrainUseCase::new(cfg.clone()).execute().unwrap();

        let changed = TrainConfig {
            model: DilatedCnnConfig::new().with_dense_units(8),
            ..cfg
        };
        let err = TrainUseCase::new(changed).execute().unwrap_err();
        assert!(err.to_string().contains("different topology"), "{err}");
    }

    #[test]
    fn test_missing_checkpoint_is_reported() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        assert!(load_trained_config(&ckpt).is_err());
    }
}
