// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and all their flags:
//
//   train     — train, checkpoint, evaluate
//   evaluate  — re-evaluate a model directory
//   predict   — classify an unlabelled capture
//   synth     — write a synthetic NRZ capture
//
// Defaults reproduce the reference experiment: 16-sample
// windows, batch 64, 20000 steps of SGD at 0.001.

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::DilatedCnnConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the dilated CNN and evaluate it on the held-out split
    Train(TrainArgs),

    /// Re-run the evaluation pass from a model directory
    Evaluate(EvaluateArgs),

    /// Classify every window of a features file
    Predict(PredictArgs),

    /// Write a synthetic NRZ capture (features + labels)
    Synth(SynthArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Oscilloscope capture: metadata rows, then one sample per row
    #[arg(long, default_value = "data/data_Binary_NRZ_RX(small).csv")]
    pub features: String,

    /// Zero-based column holding the amplitude
    #[arg(long, default_value_t = 1)]
    pub feature_column: usize,

    /// Metadata rows skipped before the first sample
    #[arg(long, default_value_t = 7)]
    pub feature_header_rows: usize,

    /// Transmitted symbols, one per window
    #[arg(long, default_value = "data/labels_Binary_NRZ_TX.csv")]
    pub labels: String,

    #[arg(long, default_value_t = 0)]
    pub label_column: usize,

    #[arg(long, default_value_t = 0)]
    pub label_header_rows: usize,

    /// Checkpoints, saved config and metric logs; reused to resume
    #[arg(long, default_value = "/tmp/dilated_cnn_model")]
    pub model_dir: String,

    /// Leading fraction of the windows used for training
    #[arg(long, default_value_t = 0.5)]
    pub training_portion: f64,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 128)]
    pub eval_batch_size: usize,

    /// Optimizer steps on top of any restored global step
    #[arg(long, default_value_t = 20_000)]
    pub steps: usize,

    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    /// Log loss and probabilities every N steps (0 = first step only)
    #[arg(long, default_value_t = 50)]
    pub log_every: usize,

    /// Save a checkpoint every N steps (0 = only at the end)
    #[arg(long, default_value_t = 1_000)]
    pub checkpoint_every: usize,

    /// Model files kept in the model dir (0 = keep all)
    #[arg(long, default_value_t = 5)]
    pub keep_checkpoints: usize,

    /// Seed parameter init and dropout
    #[arg(long)]
    pub seed: Option<u64>,

    /// Samples per window; must match the labels file
    #[arg(long, default_value_t = 16)]
    pub window_len: usize,

    #[arg(long, default_value_t = 2)]
    pub num_classes: usize,

    #[arg(long, default_value_t = 4)]
    pub conv1_filters: usize,

    #[arg(long, default_value_t = 8)]
    pub conv1_kernel: usize,

    #[arg(long, default_value_t = 16)]
    pub conv2_filters: usize,

    #[arg(long, default_value_t = 4)]
    pub conv2_kernel: usize,

    /// Dilation rate of both convolutions
    #[arg(long, default_value_t = 2)]
    pub dilation: usize,

    #[arg(long, default_value_t = 16)]
    pub dense_units: usize,

    /// Drop probability before the logits layer (training only)
    #[arg(long, default_value_t = 0.4)]
    pub dropout: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let model = DilatedCnnConfig::new()
            .with_window_len(a.window_len)
            .with_num_classes(a.num_classes)
            .with_conv1_filters(a.conv1_filters)
            .with_conv1_kernel(a.conv1_kernel)
            .with_conv2_filters(a.conv2_filters)
            .with_conv2_kernel(a.conv2_kernel)
            .with_dilation(a.dilation)
            .with_dense_units(a.dense_units)
            .with_dropout(a.dropout);

        TrainConfig {
            features_path:       a.features,
            feature_column:      a.feature_column,
            feature_header_rows: a.feature_header_rows,
            labels_path:         a.labels,
            label_column:        a.label_column,
            label_header_rows:   a.label_header_rows,
            model_dir:           a.model_dir,
            training_portion:    a.training_portion,
            batch_size:          a.batch_size,
            eval_batch_size:     a.eval_batch_size,
            steps:               a.steps,
            learning_rate:       a.lr,
            log_every:           a.log_every,
            checkpoint_every:    a.checkpoint_every,
            keep_checkpoints:    a.keep_checkpoints,
            seed:                a.seed,
            model,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "/tmp/dilated_cnn_model")]
    pub model_dir: String,

    /// Override the batch size saved at training time
    #[arg(long)]
    pub eval_batch_size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long, default_value = "/tmp/dilated_cnn_model")]
    pub model_dir: String,

    /// Capture to classify
    #[arg(long)]
    pub features: String,

    #[arg(long, default_value_t = 1)]
    pub feature_column: usize,

    #[arg(long, default_value_t = 7)]
    pub feature_header_rows: usize,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,
}

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Receives data_Binary_NRZ_RX(small).csv and labels_Binary_NRZ_TX.csv
    #[arg(long, default_value = "data")]
    pub out_dir: String,

    #[arg(long, default_value_t = 4096)]
    pub symbols: usize,

    #[arg(long, default_value_t = 16)]
    pub samples_per_symbol: usize,

    #[arg(long, default_value_t = 0.08)]
    pub noise_std: f32,

    /// One-pole low-pass coefficient in [0, 1)
    #[arg(long, default_value_t = 0.6)]
    pub smoothing: f32,

    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}
