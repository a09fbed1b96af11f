//! Shared helpers for CLI commands.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use ct_core::{NormalizeOutcome, Normalizer, NormalizerConfig, Trace};

use crate::Config;

/// Reads a JSONL trace file.
pub fn load_trace(path: &Path) -> Result<Trace> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let trace = Trace::from_jsonl(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::debug!(path = %path.display(), events = trace.len(), "loaded trace");
    Ok(trace)
}

/// Normalizes `trace` with the configured registry.
pub fn normalize(
    trace: Trace,
    config: &Config,
    normalizer_config: NormalizerConfig,
) -> Result<NormalizeOutcome> {
    let registry = config.registry().context("invalid entity table")?;
    Normalizer::new(&registry, normalizer_config)
        .normalize(trace)
        .context("normalization failed")
}
