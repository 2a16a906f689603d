// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads data through this trait and never
// sees CSV details. A capture stored in another format only
// needs another implementation.

use crate::data::error::DataError;
use crate::domain::signal::LabeledWindows;

// ─── WindowSource ─────────────────────────────────────────────────────────────
/// Anything that can produce labelled signal windows.
///
/// Implementations:
///   - CsvSignalSource → a features CSV plus a labels CSV
pub trait WindowSource {
    fn load_windows(&self) -> Result<LabeledWindows, DataError>;
}
