// ============================================================
// Layer 4 — Data Errors
// ============================================================
// Every way loading a capture can fail. None of these are
// recovered from: they bubble up through anyhow to main.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("file '{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in '{}': {source}", path.display())]
    Csv {
        path:   PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("'{}' line {line}: no column {column}", path.display())]
    MissingColumn { path: PathBuf, line: u64, column: usize },

    #[error("'{}' line {line}, column {column}: '{value}' is not a number", path.display())]
    MalformedCell { path: PathBuf, line: u64, column: usize, value: String },

    #[error("'{}' line {line}, column {column}: {value} does not fit in {target}", path.display())]
    UnrepresentableCell {
        path:   PathBuf,
        line:   u64,
        column: usize,
        value:  f64,
        target: &'static str,
    },

    #[error("{samples} samples cannot be grouped into windows of {window_len}")]
    ShapeMismatch { samples: usize, window_len: usize },

    #[error("{windows} feature windows but {labels} labels")]
    LengthMismatch { windows: usize, labels: usize },

    #[error("label {label} at row {index} is outside 0..{num_classes}")]
    LabelOutOfRange { index: usize, label: usize, num_classes: usize },
}
