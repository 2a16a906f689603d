// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Re-runs the evaluation pass of a finished (or interrupted)
// training run:
//
//   Step 1: Read train_config.json from the model dir
//   Step 2: Reload and split the same input files
//   Step 3: Restore the latest checkpoint
//   Step 4: One pass over the test split, append eval_log.csv

use anyhow::Result;

use crate::application::train_use_case::{load_split, load_trained_config};
use crate::domain::signal::EvalResults;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    default_device,
    estimator::{sgd, Estimator},
    TrainBackend,
};

pub struct EvaluateUseCase {
    model_dir:       String,
    /// Overrides the saved eval batch size when set
    eval_batch_size: Option<usize>,
}

impl EvaluateUseCase {
    pub fn new(model_dir: String, eval_batch_size: Option<usize>) -> Self {
        Self { model_dir, eval_batch_size }
    }

    pub fn execute(&self) -> Result<EvalResults> {
        let ckpt = CheckpointManager::new(&self.model_dir);
        let cfg  = load_trained_config(&ckpt)?;

        let (_, test_dataset) = load_split(&cfg)?;

        let mut estimator = Estimator::<TrainBackend, _>::restore_or_init(
            &ckpt,
            cfg.model.clone(),
            sgd::<TrainBackend>(),
            cfg.learning_rate,
            default_device(),
        )?;

        let batch_size = self.eval_batch_size.unwrap_or(cfg.eval_batch_size);
        let results = estimator.evaluate(test_dataset, batch_size)?;
        MetricsLogger::new(&self.model_dir)?.log_eval(&results)?;

        Ok(results)
    }
}
