// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends training and evaluation metrics to CSV files in the
// model directory, so learning curves survive the run and
// resumed runs keep adding to the same files.
//
//   training_log.csv
//     step,loss,steps_per_sec
//     1,0.693512,0.000000
//     50,0.684411,412.337000
//
//   eval_log.csv
//     global_step,accuracy,loss
//     20000,0.998047,0.012733

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::signal::EvalResults;

const TRAINING_HEADER: &str = "step,loss,steps_per_sec";
const EVAL_HEADER: &str = "global_step,accuracy,loss";

/// One logged training step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepMetrics {
    pub step:          usize,
    /// Cross-entropy of the batch at this step
    pub loss:          f64,
    /// Throughput since the previous logged step
    pub steps_per_sec: f64,
}

pub struct MetricsLogger {
    training_csv: PathBuf,
    eval_csv:     PathBuf,
}

impl MetricsLogger {
    /// Create the directory and the CSV headers if they don't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let training_csv = dir.join("training_log.csv");
        let eval_csv     = dir.join("eval_log.csv");
        write_header_once(&training_csv, TRAINING_HEADER)?;
        write_header_once(&eval_csv, EVAL_HEADER)?;

        Ok(Self { training_csv, eval_csv })
    }

    pub fn log_step(&self, m: &StepMetrics) -> Result<()> {
        append_line(
            &self.training_csv,
            &format!("{},{:.6},{:.6}", m.step, m.loss, m.steps_per_sec),
        )
    }

    pub fn log_eval(&self, r: &EvalResults) -> Result<()> {
        append_line(
            &self.eval_csv,
            &format!("{},{:.6},{:.6}", r.global_step, r.accuracy, r.loss),
        )?;
        tracing::debug!("Logged evaluation at step {}", r.global_step);
        Ok(())
    }
}

fn write_header_once(path: &Path, header: &str) -> Result<()> {
    if !path.exists() {
        let mut f = fs::File::create(path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        writeln!(f, "{header}")?;
        tracing::debug!("Created metrics CSV: '{}'", path.display());
    }
    Ok(())
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;
    writeln!(f, "{line}")?;
    Ok(())
}
