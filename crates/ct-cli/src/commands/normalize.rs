//! Normalize command: writes the trace with synthetic despawns as JSONL.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use ct_core::{EventType, NormalizeReport, TailPolicy};

use crate::Config;
use crate::commands::util::{load_trace, normalize};

/// Options for the normalize command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub strict: bool,
    pub append_tail: bool,
    pub only: Option<EventType>,
}

/// Runs the normalize command, writing events to `writer`.
pub fn run<W: Write>(
    writer: &mut W,
    trace_path: &Path,
    config: &Config,
    options: Options,
) -> Result<NormalizeReport> {
    let mut normalizer_config = config.normalizer.clone();
    normalizer_config.strict |= options.strict;
    if options.append_tail {
        normalizer_config.tail_policy = TailPolicy::Append;
    }

    let trace = load_trace(trace_path)?;
    let outcome = normalize(trace, config, normalizer_config)?;

    outcome
        .trace
        .write_jsonl(writer, options.only)
        .context("failed to write normalized trace")?;

    Ok(outcome.report)
}

/// One-line summary of a normalization report.
pub fn format_report(report: &NormalizeReport) -> String {
    format!(
        "{} synthesized, {} extended by {} trigger(s), {} dropped, {} stale, {} diagnostic(s)",
        report.synthesized,
        report.extended,
        report.extension_triggers,
        report.dropped.len(),
        report.stale_discarded,
        report.diagnostics.len(),
    )
}
