// ============================================================
// Layer 4 — CSV Column Loader
// ============================================================
// Pulls a single numeric column out of a comma-separated file.
//
// Capture files exported from scopes and pattern generators
// start with a block of metadata rows (model, sample interval,
// units...) before the data. The caller says how many of those
// rows to throw away; every row after that must hold a number
// in the requested column.
//
//   Format,1.0B              ┐
//   Memory Length,512        │  header_rows = 7
//   ...                      ┘
//   -1.2e-9,0.8731           ← column 1 = amplitude
//   -1.1e-9,0.8812
//
// Cells are parsed as f64 first and then converted to the
// requested element type, so a label file written as "1.0"
// still loads as the integer class 1.
//
// Reference: csv crate documentation (ReaderBuilder)

use std::{
    fs::File,
    io::{BufRead, BufReader, ErrorKind},
    path::{Path, PathBuf},
};

use crate::data::error::DataError;
use crate::data::windows::into_windows;
use crate::domain::signal::LabeledWindows;
use crate::domain::traits::WindowSource;

// ─── ColumnValue ──────────────────────────────────────────────────────────────
/// Element types a column can be materialised as.
pub trait ColumnValue: Sized {
    /// Name used in error messages
    const TYPE_NAME: &'static str;

    /// Convert a parsed cell. `None` when the value does not fit.
    fn from_f64(value: f64) -> Option<Self>;
}

impl ColumnValue for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_f64(value: f64) -> Option<Self> {
        Some(value as f32)
    }
}

impl ColumnValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_f64(value: f64) -> Option<Self> {
        Some(value)
    }
}

impl ColumnValue for i32 {
    const TYPE_NAME: &'static str = "i32";

    fn from_f64(value: f64) -> Option<Self> {
        let v = value.trunc();
        (v.is_finite() && v >= i32::MIN as f64 && v <= i32::MAX as f64).then_some(v as i32)
    }
}

impl ColumnValue for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn from_f64(value: f64) -> Option<Self> {
        let v = value.trunc();
        (v.is_finite() && v >= i64::MIN as f64 && v < i64::MAX as f64).then_some(v as i64)
    }
}

impl ColumnValue for usize {
    const TYPE_NAME: &'static str = "usize";

    fn from_f64(value: f64) -> Option<Self> {
        let v = value.trunc();
        (v.is_finite() && v >= 0.0 && v < usize::MAX as f64).then_some(v as usize)
    }
}

// ─── read_column ──────────────────────────────────────────────────────────────
/// Read `column` (zero-based) from every row of `path` after the first
/// `header_rows` rows.
///
/// Rows are counted as physical lines, blank ones included, so a blank
/// metadata line still counts towards `header_rows`. A blank line in the
/// data region has no cells and fails as a missing column. Rows may have
/// different field counts; only the requested column has to exist.
pub fn read_column<T: ColumnValue>(
    path:        &Path,
    column:      usize,
    header_rows: usize,
) -> Result<Vec<T>, DataError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataError::NotFound { path: path.to_path_buf() },
        _ => DataError::Io { path: path.to_path_buf(), source: e },
    })?;
    let io_error = |e: std::io::Error| DataError::Io { path: path.to_path_buf(), source: e };

    let mut input = BufReader::new(file);
    let mut skipped = Vec::new();
    for _ in 0..header_rows {
        skipped.clear();
        if input.read_until(b'\n', &mut skipped).map_err(io_error)? == 0 {
            break;
        }
    }

    let mut record = csv::StringRecord::new();
    let mut values = Vec::new();

    for (offset, text) in input.lines().enumerate() {
        let text = text.map_err(io_error)?;
        let line = (header_rows + offset + 1) as u64;

        parse_row(&text, &mut record).map_err(|e| DataError::Csv {
            path:   path.to_path_buf(),
            source: e,
        })?;

        let cell = record.get(column).ok_or_else(|| DataError::MissingColumn {
            path: path.to_path_buf(),
            line,
            column,
        })?;

        let parsed: f64 = cell.trim().parse().map_err(|_| DataError::MalformedCell {
            path:  path.to_path_buf(),
            line,
            column,
            value: cell.to_string(),
        })?;

        let value = T::from_f64(parsed).ok_or_else(|| DataError::UnrepresentableCell {
            path: path.to_path_buf(),
            line,
            column,
            value: parsed,
            target: T::TYPE_NAME,
        })?;

        values.push(value);
    }

    tracing::debug!(
        "Read {} values from '{}' (column {}, {} header rows skipped)",
        values.len(),
        path.display(),
        column,
        header_rows
    );

    Ok(values)
}

/// Split one line into fields. An empty line leaves `record` empty.
fn parse_row(text: &str, record: &mut csv::StringRecord) -> csv::Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    if !reader.read_record(record)? {
        record.clear();
    }
    Ok(())
}

// ─── ColumnSpec ───────────────────────────────────────────────────────────────
/// Where one column of a capture lives on disk.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub path:        PathBuf,
    pub column:      usize,
    pub header_rows: usize,
}

impl ColumnSpec {
    pub fn new(path: impl Into<PathBuf>, column: usize, header_rows: usize) -> Self {
        Self { path: path.into(), column, header_rows }
    }

    pub fn read<T: ColumnValue>(&self) -> Result<Vec<T>, DataError> {
        read_column(&self.path, self.column, self.header_rows)
    }
}

// ─── CsvSignalSource ──────────────────────────────────────────────────────────
/// A features file and a labels file produced in lockstep.
/// Implements the WindowSource trait from Layer 3.
pub struct CsvSignalSource {
    features:   ColumnSpec,
    labels:     ColumnSpec,
    window_len: usize,
}

impl CsvSignalSource {
    pub fn new(features: ColumnSpec, labels: ColumnSpec, window_len: usize) -> Self {
        Self { features, labels, window_len }
    }
}

impl WindowSource for CsvSignalSource {
    fn load_windows(&self) -> Result<LabeledWindows, DataError> {
        let samples: Vec<f32>  = self.features.read()?;
        let labels: Vec<usize> = self.labels.read()?;
        tracing::info!(
            "Loaded {} samples from '{}' and {} labels from '{}'",
            samples.len(),
            self.features.path.display(),
            labels.len(),
            self.labels.path.display()
        );

        let windows = into_windows(samples, self.window_len)?;
        LabeledWindows::new(windows, labels)
    }
}
