// ============================================================
// Layer 6 — Logging Setup
// ============================================================
// Installs the tracing subscriber once, at startup. The level
// comes in as an argument from the CLI; RUST_LOG wins when set.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the global subscriber at `level` (e.g. "info", "debug").
pub fn init(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("dilated_signal_cnn={level}"))
            .map_err(|e| anyhow::anyhow!("Invalid log level '{level}': {e}"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Cannot install logger: {e}"))
}
