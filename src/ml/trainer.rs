// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Runs a fixed budget of optimizer steps on sequential,
// unshuffled, endlessly repeating batches.
//
// Hooks on the loop:
//   - every `log_every` steps (and the first): step, loss,
//     throughput and the running softmax probabilities
//   - every `checkpoint_every` steps and after the last step:
//     save parameters, prune old model files
//
// The budget is counted from wherever the estimator starts, so
// a resumed run trains `steps` more steps on top of the
// restored global step.

use std::time::Instant;

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    optim::Optimizer,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SignalBatcher, dataset::SignalDataset, feeder::InputFeed};
use crate::domain::mode::{ModeOutput, TrainStep};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{MetricsLogger, StepMetrics},
};
use crate::ml::{
    estimator::{Estimator, ModeInput},
    model::DilatedCnn,
};

/// Rows of the probability tensor shown in each log line
const LOGGED_ROWS: usize = 4;

pub fn run_training<B, O>(
    estimator:     &mut Estimator<B, O>,
    train_dataset: &SignalDataset,
    cfg:           &TrainConfig,
    ckpt:          &CheckpointManager,
    metrics:       &MetricsLogger,
) -> Result<()>
where
    B: AutodiffBackend,
    O: Optimizer<DilatedCnn<B>, B>,
{
    if train_dataset.sample_count() == 0 {
        anyhow::bail!("training set is empty");
    }

    let start_step = estimator.global_step();
    tracing::info!(
        "Training {} steps from step {} ({} windows, batch size {}, lr {})",
        cfg.steps, start_step, train_dataset.sample_count(), cfg.batch_size, cfg.learning_rate
    );

    let batcher      = SignalBatcher::<B>::new(estimator.device().clone());
    let mut feed     = InputFeed::repeating(train_dataset, cfg.batch_size);
    let mut last_log = (start_step, Instant::now());

    for _ in 0..cfg.steps {
        let samples = feed.next().ok_or_else(|| anyhow::anyhow!("input feed ran dry"))?;

        let step = match estimator.model_fn(ModeInput::Train(batcher.batch(samples)))? {
            ModeOutput::Train(step) => step,
            other => anyhow::bail!("train mode returned {other:?}"),
        };

        // ── Logging hook ─────────────────────────────────────────────────────
        let first = step.global_step == start_step + 1;
        if first || (cfg.log_every > 0 && step.global_step % cfg.log_every == 0) {
            let (prev_step, prev_time) = last_log;
            let elapsed = prev_time.elapsed().as_secs_f64();
            let steps_per_sec = if elapsed > 0.0 && !first {
                (step.global_step - prev_step) as f64 / elapsed
            } else {
                0.0
            };

            log_step(&step, steps_per_sec);
            metrics.log_step(&StepMetrics {
                step: step.global_step,
                loss: step.loss,
                steps_per_sec,
            })?;
            last_log = (step.global_step, Instant::now());
        }

        // ── Checkpoint hook ──────────────────────────────────────────────────
        if cfg.checkpoint_every > 0 && step.global_step % cfg.checkpoint_every == 0 {
            save_checkpoint(estimator, ckpt, cfg.keep_checkpoints)?;
        }
    }

    // Final checkpoint, unless the last step already wrote one
    let saved_last = cfg.checkpoint_every > 0 && estimator.global_step() % cfg.checkpoint_every == 0;
    if cfg.steps > 0 && !saved_last {
        save_checkpoint(estimator, ckpt, cfg.keep_checkpoints)?;
    }

    tracing::info!("Training finished at step {}", estimator.global_step());
    Ok(())
}

fn save_checkpoint<B, O>(estimator: &Estimator<B, O>, ckpt: &CheckpointManager, keep: usize) -> Result<()>
where
    B: AutodiffBackend,
    O: Optimizer<DilatedCnn<B>, B>,
{
    estimator.save(ckpt)?;
    ckpt.prune(keep)?;
    tracing::info!("Saved checkpoint for step {} in '{}'", estimator.global_step(), ckpt.dir().display());
    Ok(())
}

fn log_step(step: &TrainStep, steps_per_sec: f64) {
    let shown: Vec<String> = step
        .probabilities
        .iter()
        .take(LOGGED_ROWS)
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|p| format!("{p:.4}")).collect();
            format!("[{}]", cells.join(", "))
        })
        .collect();
    let more = step.probabilities.len().saturating_sub(LOGGED_ROWS);
    let tail = if more > 0 { format!(" … {more} more") } else { String::new() };

    tracing::info!(
        step = step.global_step,
        loss = step.loss,
        steps_per_sec,
        "probabilities = [{}{}]",
        shown.join(", "),
        tail
    );
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::SignalSample;
    use crate::ml::{estimator::sgd, model::DilatedCnnConfig, TrainBackend};

    fn dataset() -> SignalDataset {
        SignalDataset::new(
            (0..3)
                .map(|i| SignalSample::labeled(vec![i as f32 * 0.1; 16], i % 2))
                .collect(),
        )
    }

    fn config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            model_dir:        dir.to_string_lossy().into_owned(),
            steps:            7,
            batch_size:       4,
            log_every:        2,
            checkpoint_every: 3,
            keep_checkpoints: 2,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_runs_budget_and_checkpoints() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = config(dir.path());
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let mut est = Estimator::<TrainBackend, _>::new(
            DilatedCnnConfig::new(), sgd::<TrainBackend>(), cfg.learning_rate, Default::default(),
        ).unwrap();

        run_training(&mut est, &dataset(), &cfg, &ckpt, &metrics).unwrap();

        assert_eq!(est.global_step(), 7);
        // saved at 3, 6 and the final 7; pruned to the newest two
        assert_eq!(ckpt.saved_steps().unwrap(), vec![6, 7]);
        assert_eq!(ckpt.latest_step().unwrap(), Some(7));

        // logged at the first step, then 2, 4, 6
        let log = std::fs::read_to_string(dir.path().join("training_log.csv")).unwrap();
        let steps: Vec<&str> = log.lines().skip(1).map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(steps, vec!["1", "2", "4", "6"]);
    }

    #[test]
    fn test_resumed_run_continues_global_step() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = config(dir.path());
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();

        let mut first = Estimator::<TrainBackend, _>::new(
            DilatedCnnConfig::new(), sgd::<TrainBackend>(), cfg.learning_rate, Default::default(),
        ).unwrap();
        run_training(&mut first, &dataset(), &cfg, &ckpt, &metrics).unwrap();

        let mut second = Estimator::<TrainBackend, _>::restore_or_init(
            &ckpt, DilatedCnnConfig::new(), sgd::<TrainBackend>(), cfg.learning_rate, Default::default(),
        ).unwrap();
        assert_eq!(second.global_step(), 7);

        run_training(&mut second, &dataset(), &cfg, &ckpt, &metrics).unwrap();
        assert_eq!(second.global_step(), 14);
        assert_eq!(ckpt.latest_step().unwrap(), Some(14));
    }

    #[test]
    fn test_empty_training_set_is_an_error() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = config(dir.path());
        let ckpt    = CheckpointManager::new(dir.path());
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let mut est = Estimator::<TrainBackend, _>::new(
            DilatedCnnConfig::new(), sgd::<TrainBackend>(), cfg.learning_rate, Default::default(),
        ).unwrap();

        let empty = SignalDataset::new(Vec::new());
        assert!(run_training(&mut est, &empty, &cfg, &ckpt, &metrics).is_err());
    }
}
