// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores classifier parameters using Burn's
// CompactRecorder.
//
// Directory layout:
//   /tmp/dilated_cnn_model/
//     model_step_1000.mpk.gz   ← parameters after step 1000
//     model_step_2000.mpk.gz
//     ...
//     latest_step.json         ← global step of the newest file
//     train_config.json        ← TrainConfig incl. model topology
//     training_log.csv         ← written by MetricsLogger
//
// The directory is reused across runs: a second `train` picks
// up the newest parameters and keeps counting steps from there.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde_json;

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::DilatedCnn;

const LATEST_FILE: &str = "latest_step.json";
const CONFIG_FILE: &str = "train_config.json";
const MODEL_PREFIX: &str = "model_step_";

/// Manages the files in one model directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Nothing is created on disk until the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model directory '{}'", self.dir.display()))
    }

    fn model_path(&self, step: usize) -> PathBuf {
        // The recorder appends its own extension
        self.dir.join(format!("{MODEL_PREFIX}{step}"))
    }

    /// Save parameters for `step` and point latest_step.json at them.
    pub fn save_model<B: Backend>(&self, model: &DilatedCnn<B>, step: usize) -> Result<()> {
        self.ensure_dir()?;
        let path = self.model_path(step);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join(LATEST_FILE);
        fs::write(&latest_path, serde_json::to_string(&step)?)
            .with_context(|| format!("Failed to write {LATEST_FILE}"))?;

        tracing::debug!("Saved checkpoint: step {}", step);
        Ok(())
    }

    /// Load the parameters saved at `step` into `model`.
    ///
    /// `model` must have the architecture the checkpoint was written with.
    pub fn load_model<B: Backend>(
        &self,
        model:  DilatedCnn<B>,
        step:   usize,
        device: &B::Device,
    ) -> Result<DilatedCnn<B>> {
        let path = self.model_path(step);
        tracing::info!("Loading checkpoint from step {}", step);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    /// Global step of the newest checkpoint, or None in a fresh directory.
    pub fn latest_step(&self) -> Result<Option<usize>> {
        let path = self.dir.join(LATEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        let step = serde_json::from_str::<usize>(s.trim())
            .with_context(|| format!("'{}' is not a step number", path.display()))?;
        Ok(Some(step))
    }

    /// Steps of every model file currently in the directory, ascending.
    pub fn saved_steps(&self) -> Result<Vec<usize>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut steps: Vec<usize> = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                name.strip_prefix(MODEL_PREFIX)?
                    .split('.')
                    .next()?
                    .parse()
                    .ok()
            })
            .collect();
        steps.sort_unstable();
        steps.dedup();
        Ok(steps)
    }

    /// Delete all but the newest `keep` model files. `keep == 0` keeps everything.
    pub fn prune(&self, keep: usize) -> Result<()> {
        if keep == 0 {
            return Ok(());
        }
        let steps = self.saved_steps()?;
        let stale = steps.len().saturating_sub(keep);
        for step in &steps[..stale] {
            for entry in fs::read_dir(&self.dir)?.filter_map(|e| e.ok()) {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with(&format!("{MODEL_PREFIX}{step}.")) {
                    fs::remove_file(entry.path())
                        .with_context(|| format!("Cannot remove '{}'", entry.path().display()))?;
                    tracing::debug!("Pruned checkpoint: step {}", step);
                }
            }
        }
        Ok(())
    }

    /// Save the training configuration so later runs can rebuild the model.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// The configuration saved by an earlier `train`, if any.
    pub fn load_config(&self) -> Result<Option<TrainConfig>> {
        let path = self.dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        let cfg = serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))?;
        Ok(Some(cfg))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::ml::model::DilatedCnnConfig;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_fresh_directory_has_no_checkpoint() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("model"));
        assert_eq!(ckpt.latest_step().unwrap(), None);
        assert!(ckpt.load_config().unwrap().is_none());
        assert!(ckpt.saved_steps().unwrap().is_empty());
    }

    #[test]
    fn test_saved_parameters_load_back() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path());
        let device = Default::default();
        let cfg    = DilatedCnnConfig::new();

        let model: DilatedCnn<TestBackend> = cfg.init(&device);
        ckpt.save_model(&model, 50).unwrap();
        assert_eq!(ckpt.latest_step().unwrap(), Some(50));

        let input    = Tensor::<TestBackend, 2>::ones([1, 16], &device);
        let expected = model.forward(input.clone()).into_data().to_vec::<f32>().unwrap();

        let fresh: DilatedCnn<TestBackend> = cfg.init(&device);
        let loaded = ckpt.load_model(fresh, 50, &device).unwrap();
        let actual = loaded.forward(input).into_data().to_vec::<f32>().unwrap();

        // CompactRecorder stores half precision
        for (a, e) in actual.iter().zip(&expected) {
            assert!((a - e).abs() < 1e-2, "{a} vs {e}");
        }
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path());
        let device = Default::default();
        let model: DilatedCnn<TestBackend> = DilatedCnnConfig::new().init(&device);

        for step in [10, 20, 30, 40] {
            ckpt.save_model(&model, step).unwrap();
        }
        ckpt.prune(2).unwrap();
        assert_eq!(ckpt.saved_steps().unwrap(), vec![30, 40]);
        assert_eq!(ckpt.latest_step().unwrap(), Some(40));
    }

    #[test]
    fn test_config_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        let cfg  = TrainConfig { steps: 7, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        let loaded = ckpt.load_config().unwrap().unwrap();
        assert_eq!(loaded.steps, 7);
        assert_eq!(loaded.model.window_len, 16);
    }
}
