// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All workflow logic is delegated to Layer 2 (application);
// this layer only routes and prints results.
//
// Commands:
//   1. `train`    — trains, checkpoints, prints eval metrics
//   2. `evaluate` — re-evaluates the latest checkpoint
//   3. `predict`  — prints class + probabilities per window
//   4. `synth`    — writes a synthetic capture to disk

pub mod commands;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, SynthArgs, TrainArgs};

use crate::data::loader::ColumnSpec;

#[derive(Parser, Debug)]
#[command(
    name = "dilated-signal-cnn",
    version,
    about = "Recover transmitted NRZ symbols from a received waveform with a dilated 1-D CNN."
)]
pub struct Cli {
    /// Log level for this crate (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Synth(args)    => run_synth(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on '{}' / '{}'", args.features, args.labels);
    let results = TrainUseCase::new(args.into()).execute()?;

    println!("{results}");
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let results = EvaluateUseCase::new(args.model_dir, args.eval_batch_size).execute()?;
    println!("{results}");
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let features = ColumnSpec::new(&args.features, args.feature_column, args.feature_header_rows);
    let predictions = PredictUseCase::new(args.model_dir, features, args.batch_size).execute()?;

    for (i, p) in predictions.iter().enumerate() {
        let probs: Vec<String> = p.probabilities.iter().map(|v| format!("{v:.6}")).collect();
        println!("{i}\t{}\t[{}]", p.class, probs.join(", "));
    }
    Ok(())
}

fn run_synth(args: SynthArgs) -> Result<()> {
    use crate::data::synth::{generate, write_capture, NrzSynthConfig};

    let cfg = NrzSynthConfig {
        symbols:            args.symbols,
        samples_per_symbol: args.samples_per_symbol,
        noise_std:          args.noise_std,
        smoothing:          args.smoothing,
        seed:               args.seed,
        ..NrzSynthConfig::default()
    };
    let capture = generate(&cfg);

    let out_dir  = Path::new(&args.out_dir);
    let features = out_dir.join("data_Binary_NRZ_RX(small).csv");
    let labels   = out_dir.join("labels_Binary_NRZ_TX.csv");
    write_capture(&capture, &cfg, &features, &labels)?;

    println!(
        "Wrote {} samples to '{}' and {} labels to '{}'",
        capture.amplitudes.len(), features.display(),
        capture.bits.len(), labels.display()
    );
    Ok(())
}
