// ============================================================
// Layer 5 — Estimator
// ============================================================
// One parameter set, three modes. `model_fn` is the single entry
// point; the other methods are drivers built on top of it.
//
// Key Burn details:
//   - Training runs on the autodiff backend B, so dropout is live
//   - Evaluate / Predict call model.valid(), which returns the
//     model on B::InnerBackend: no gradients, no dropout
//   - argmax(1) returns [batch, 1], flattened before comparing
//   - Evaluate / Predict walk the dataset once through Burn's
//     DataLoader, in order, with the last batch possibly short

use std::sync::Arc;

use anyhow::{Context, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::{activation::softmax, backend::AutodiffBackend},
};

use crate::data::{
    batcher::{SignalBatch, SignalBatcher},
    dataset::{SignalDataset, SignalSample},
};
use crate::domain::{
    mode::{EvalBatch, ModeOutput, TrainStep},
    signal::{EvalResults, Prediction},
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{DilatedCnn, DilatedCnnConfig};

/// Plain gradient descent: no momentum, no weight decay.
pub fn sgd<B: AutodiffBackend>() -> impl Optimizer<DilatedCnn<B>, B> {
    SgdConfig::new().init::<B, DilatedCnn<B>>()
}

/// One batch, on the backend its mode runs on.
pub enum ModeInput<B: AutodiffBackend> {
    /// Labelled, gradients tracked
    Train(SignalBatch<B>),
    /// Labelled, no gradients
    Evaluate(SignalBatch<B::InnerBackend>),
    /// Labels ignored
    Predict(SignalBatch<B::InnerBackend>),
}

pub struct Estimator<B: AutodiffBackend, O> {
    model:         DilatedCnn<B>,
    optim:         O,
    learning_rate: f64,
    global_step:   usize,
    device:        B::Device,
}

impl<B, O> Estimator<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<DilatedCnn<B>, B>,
{
    /// Fresh parameters at global step 0.
    pub fn new(
        config:        DilatedCnnConfig,
        optim:         O,
        learning_rate: f64,
        device:        B::Device,
    ) -> Result<Self> {
        config.validate()?;
        let model = config.init(&device);
        Ok(Self { model, optim, learning_rate, global_step: 0, device })
    }

    /// Fresh parameters, replaced by the latest checkpoint in `ckpt` if one exists.
    pub fn restore_or_init(
        ckpt:          &CheckpointManager,
        config:        DilatedCnnConfig,
        optim:         O,
        learning_rate: f64,
        device:        B::Device,
    ) -> Result<Self> {
        let mut estimator = Self::new(config, optim, learning_rate, device)?;
        if let Some(step) = ckpt.latest_step()? {
            estimator.model = ckpt.load_model(estimator.model, step, &estimator.device)?;
            estimator.global_step = step;
            tracing::info!("Restored parameters from step {}", step);
        } else {
            tracing::info!("No checkpoint in '{}', starting from scratch", ckpt.dir().display());
        }
        Ok(estimator)
    }

    pub fn global_step(&self) -> usize { self.global_step }

    pub fn device(&self) -> &B::Device { &self.device }

    /// Write the current parameters under the current global step.
    pub fn save(&self, ckpt: &CheckpointManager) -> Result<()> {
        ckpt.save_model(&self.model, self.global_step)
    }

    /// Run one batch through the model in the given mode.
    pub fn model_fn(&mut self, input: ModeInput<B>) -> Result<ModeOutput> {
        match input {
            ModeInput::Train(batch)    => self.train_step(batch).map(ModeOutput::Train),
            ModeInput::Evaluate(batch) => self.eval_batch(batch).map(ModeOutput::Evaluate),
            ModeInput::Predict(batch)  => self.predict_batch(batch).map(ModeOutput::Predict),
        }
    }

    fn train_step(&mut self, batch: SignalBatch<B>) -> Result<TrainStep> {
        let labels = batch.labels.context("training batch has unlabelled windows")?;

        let logits = self.model.forward(batch.windows);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels);

        let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();
        let probabilities   = probability_rows(softmax(logits, 1))?;

        // Backward pass + SGD update
        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optim.step(self.learning_rate, self.model.clone(), grads);
        self.global_step += 1;

        Ok(TrainStep { global_step: self.global_step, loss: loss_value, probabilities })
    }

    fn eval_batch(&self, batch: SignalBatch<B::InnerBackend>) -> Result<EvalBatch> {
        let model  = self.model.valid();
        let labels = batch.labels.context("evaluation batch has unlabelled windows")?;
        let total  = labels.dims()[0];

        let logits = model.forward(batch.windows);
        let loss: f64 = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels.clone())
            .into_scalar()
            .elem::<f64>();

        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        let correct: i64 = predicted
            .equal(labels)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        Ok(EvalBatch { loss_sum: loss * total as f64, correct: correct as usize, total })
    }

    fn predict_batch(&self, batch: SignalBatch<B::InnerBackend>) -> Result<Vec<Prediction>> {
        let model  = self.model.valid();
        let logits = model.forward(batch.windows);

        let probabilities = probability_rows(softmax(logits, 1))?;
        Ok(probabilities
            .into_iter()
            .map(|p| Prediction { class: argmax(&p), probabilities: p })
            .collect())
    }

    /// One pass over `dataset` in batches of `batch_size`.
    pub fn evaluate(&mut self, dataset: SignalDataset, batch_size: usize) -> Result<EvalResults> {
        let loader = self.single_pass_loader(dataset, batch_size)?;

        let mut sums = EvalBatch::default();
        for batch in loader.iter() {
            match self.model_fn(ModeInput::Evaluate(batch))? {
                ModeOutput::Evaluate(b) => sums = sums.merge(b),
                other => anyhow::bail!("evaluate mode returned {other:?}"),
            }
        }

        if sums.total == 0 {
            anyhow::bail!("evaluation set is empty");
        }

        let results = EvalResults {
            accuracy:    sums.correct as f64 / sums.total as f64,
            loss:        sums.loss_sum / sums.total as f64,
            global_step: self.global_step,
        };
        tracing::info!(
            "Evaluated {} windows at step {}: accuracy={:.4} loss={:.4}",
            sums.total, results.global_step, results.accuracy, results.loss
        );
        Ok(results)
    }

    /// Classify unlabelled windows, in order.
    pub fn predict(&mut self, windows: Vec<Vec<f32>>, batch_size: usize) -> Result<Vec<Prediction>> {
        let dataset = SignalDataset::new(windows.into_iter().map(SignalSample::unlabeled).collect());
        let mut predictions = Vec::with_capacity(dataset.sample_count());
        let loader = self.single_pass_loader(dataset, batch_size)?;

        for batch in loader.iter() {
            match self.model_fn(ModeInput::Predict(batch))? {
                ModeOutput::Predict(p) => predictions.extend(p),
                other => anyhow::bail!("predict mode returned {other:?}"),
            }
        }
        Ok(predictions)
    }

    /// Sequential, unshuffled, single-threaded so batches come back in dataset order.
    fn single_pass_loader(
        &self,
        dataset:    SignalDataset,
        batch_size: usize,
    ) -> Result<Arc<dyn DataLoader<SignalBatch<B::InnerBackend>>>> {
        if batch_size == 0 {
            anyhow::bail!("batch size must be at least 1");
        }
        let batcher = SignalBatcher::<B::InnerBackend>::new(self.device.clone());
        Ok(DataLoaderBuilder::new(batcher)
            .batch_size(batch_size)
            .build(dataset))
    }
}

/// [batch, classes] probabilities → one Vec per row.
fn probability_rows<B: Backend>(probs: Tensor<B, 2>) -> Result<Vec<Vec<f32>>> {
    let [_, classes] = probs.dims();
    let flat = probs
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;
    Ok(flat.chunks(classes.max(1)).map(<[f32]>::to_vec).collect())
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::data::dataloader::batcher::Batcher;
    use crate::ml::{InferBackend, TrainBackend};

    fn estimator() -> Estimator<TrainBackend, impl Optimizer<DilatedCnn<TrainBackend>, TrainBackend>> {
        Estimator::new(DilatedCnnConfig::new(), sgd::<TrainBackend>(), 0.001, Default::default())
            .unwrap()
    }

    fn samples(n: usize) -> Vec<SignalSample> {
        (0..n)
            .map(|i| {
                let level = if i % 2 == 0 { -0.5 } else { 0.5 };
                let window = (0..16).map(|j| level + 0.01 * j as f32).collect();
                SignalSample::labeled(window, i % 2)
            })
            .collect()
    }

    #[test]
    fn test_predict_probabilities_sum_to_one() {
        let mut est = estimator();
        let windows = samples(5).into_iter().map(|s| s.window).collect();
        let preds   = est.predict(windows, 2).unwrap();

        assert_eq!(preds.len(), 5);
        for p in &preds {
            assert_eq!(p.probabilities.len(), 2);
            let sum: f32 = p.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "sum = {sum}");
            assert_eq!(p.class, argmax(&p.probabilities));
        }
    }

    #[test]
    fn test_accuracy_matches_argmax_count() {
        let mut est = estimator();
        let data    = samples(6);
        let labels: Vec<usize> = data.iter().filter_map(|s| s.label).collect();
        let windows = data.iter().map(|s| s.window.clone()).collect();

        let preds    = est.predict(windows, 4).unwrap();
        let expected = preds.iter().zip(&labels).filter(|(p, l)| p.class == **l).count();

        let results = est.evaluate(SignalDataset::new(data), 4).unwrap();
        assert!((0.0..=1.0).contains(&results.accuracy));
        assert!((results.accuracy - expected as f64 / 6.0).abs() < 1e-9);
        assert!(results.loss.is_finite());
        assert_eq!(results.global_step, 0);
    }

    #[test]
    fn test_train_step_advances_global_step() {
        let mut est = estimator();
        for expected in 1..=3 {
            let batch = SignalBatcher::<TrainBackend>::new(est.device().clone()).batch(samples(4));
            match est.model_fn(ModeInput::Train(batch)).unwrap() {
                ModeOutput::Train(step) => {
                    assert_eq!(step.global_step, expected);
                    assert!(step.loss.is_finite());
                    assert_eq!(step.probabilities.len(), 4);
                }
                other => panic!("unexpected output {other:?}"),
            }
        }
        assert_eq!(est.global_step(), 3);
    }

    #[test]
    fn test_evaluate_does_not_update() {
        let mut est = estimator();
        let ds      = SignalDataset::new(samples(4));
        let first   = est.evaluate(ds.clone(), 2).unwrap();
        let second  = est.evaluate(ds, 3).unwrap();
        assert!((first.loss - second.loss).abs() < 1e-5);
        assert_eq!(first.accuracy, second.accuracy);
    }

    #[test]
    fn test_train_requires_labels() {
        let mut est = estimator();
        let batch   = vec![SignalSample::unlabeled(vec![0.0; 16])];
        let device  = est.device().clone();

        let train = SignalBatcher::<TrainBackend>::new(device.clone()).batch(batch.clone());
        assert!(est.model_fn(ModeInput::Train(train)).is_err());

        let eval = SignalBatcher::<InferBackend>::new(device).batch(batch);
        assert!(est.model_fn(ModeInput::Evaluate(eval)).is_err());
    }

    #[test]
    fn test_predictions_keep_dataset_order_across_batches() {
        let mut est = estimator();
        let windows: Vec<Vec<f32>> = samples(7).into_iter().map(|s| s.window).collect();

        let one_by_one: Vec<usize> = windows
            .iter()
            .map(|w| est.predict(vec![w.clone()], 1).unwrap()[0].class)
            .collect();
        let batched: Vec<usize> = est.predict(windows, 3).unwrap().iter().map(|p| p.class).collect();
        assert_eq!(batched, one_by_one);
    }

    #[test]
    fn test_empty_evaluation_set_is_an_error() {
        let mut est = estimator();
        assert!(est.evaluate(SignalDataset::new(Vec::new()), 8).is_err());
    }

    #[test]
    fn test_zero_batch_size_is_an_error() {
        let mut est = estimator();
        assert!(est.evaluate(SignalDataset::new(samples(2)), 0).is_err());
    }
}
