// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from CSV captures on disk to tensor batches.
//
//   features.csv   labels.csv
//        │              │
//        ▼              ▼
//   read_column    read_column     → one numeric column each
//        │              │
//        ▼              │
//   into_windows        │          → windows of 16 samples
//        └──────┬───────┘
//               ▼
//   LabeledWindows                 → alignment + label checks
//               │
//               ▼
//   split_by_index                 → train prefix / test suffix
//               │
//               ▼
//   SignalDataset                  → Burn's Dataset trait
//               │
//               ▼
//   InputFeed / DataLoader         → sequential batches
//               │                    (endless for training,
//               ▼                     one pass otherwise)
//   SignalBatcher                  → tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Typed errors for every loading failure
pub mod error;

/// Reads one numeric column from a CSV file
pub mod loader;

/// Groups a flat trace into fixed-length windows
pub mod windows;

/// Implements Burn's Dataset trait for signal windows
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Sequential, optionally endless, batch iteration
pub mod feeder;

/// Deterministic prefix/suffix train/test split
pub mod splitter;

/// Synthetic NRZ captures for running without lab data
pub mod synth;
