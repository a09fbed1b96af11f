//! Analyze command: normalizes a trace and replays it through the aggregators.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use ct_core::analyzers::{
    BonusDamageAnalyzer, BonusDamageSummary, BuffUsageAnalyzer, BuffUsageSummary,
};
use ct_core::{CombatState, NormalizeReport, Stat, replay};
use serde::Serialize;

use crate::Config;
use crate::commands::util::{load_trace, normalize};

/// Everything the analyze command reports.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub player_id: u64,
    pub events: usize,
    pub synthetic_events: usize,
    pub normalization: NormalizeReport,
    pub bonus_damage: BonusDamageSummary,
    pub buff_usage: BuffUsageSummary,
}

/// Runs the analyze command.
pub fn run<W: Write>(
    writer: &mut W,
    trace_path: &Path,
    config: &Config,
    player: Option<u64>,
    json: bool,
) -> Result<()> {
    let trace = load_trace(trace_path)?;
    let report = analyze(trace, config, player.unwrap_or(config.player_id))?;

    if json {
        let json = serde_json::to_string_pretty(&report)?;
        writeln!(writer, "{json}")?;
    } else {
        write!(writer, "{}", format_report(&report, config))?;
    }

    Ok(())
}

/// Normalizes and replays a trace for one player.
pub fn analyze(trace: ct_core::Trace, config: &Config, player_id: u64) -> Result<AnalysisReport> {
    let outcome = normalize(trace, config, config.normalizer.clone())?;
    let trace = outcome.trace;

    let mut bonus_damage = BonusDamageAnalyzer::new(player_id, config.bonus_damage.clone());
    let mut buff_usage = BuffUsageAnalyzer::new(player_id, config.buff_usage.clone());
    let state = CombatState::new(player_id).with_stat(Stat::Intellect, config.initial_intellect);
    replay(&trace, state, &mut [&mut bonus_damage, &mut buff_usage]);

    Ok(AnalysisReport {
        player_id,
        events: trace.len(),
        synthetic_events: trace.iter().filter(|e| e.is_synthetic()).count(),
        normalization: outcome.report,
        bonus_damage: bonus_damage.summary(),
        buff_usage: buff_usage.summary(),
    })
}

/// Formats the report for terminal output.
pub fn format_report(report: &AnalysisReport, config: &Config) -> String {
    let mut out = String::new();
    let n = &report.normalization;
    let bd = &report.bonus_damage;
    let bu = &report.buff_usage;

    let _ = writeln!(
        out,
        "Player {}: {} events ({} synthetic)",
        report.player_id, report.events, report.synthetic_events
    );
    let _ = writeln!(
        out,
        "Normalization: {} synthesized, {} extended, {} dropped, {} stale",
        n.synthesized,
        n.extended,
        n.dropped.len(),
        n.stale_discarded
    );
    for diagnostic in &n.diagnostics {
        let _ = writeln!(out, "  warning: {diagnostic}");
    }

    let _ = writeln!(
        out,
        "Bonus damage ({} with {}):",
        config.bonus_damage.ability, config.bonus_damage.buff
    );
    let _ = writeln!(
        out,
        "  casts: {} ({} buffed), buff applications: {}",
        bd.casts, bd.buffed_casts, bd.buff_applications
    );
    let _ = writeln!(
        out,
        "  bonus damage: {:.0} ({:.2} casts per proc)",
        bd.bonus_damage, bd.casts_per_proc
    );
    let _ = writeln!(
        out,
        "  correlation: {} matched, {} unmatched, {} expired",
        bd.correlation.matched, bd.correlation.unmatched_effects, bd.correlation.expired_intents
    );

    let _ = writeln!(
        out,
        "Buff usage ({} with {}):",
        config.buff_usage.ability, config.buff_usage.buff
    );
    let _ = writeln!(
        out,
        "  buffed casts: {} over {} application(s) ({:.2} per buff)",
        bu.buffed_casts, bu.buff_applications, bu.casts_per_buff
    );
    let _ = writeln!(out, "  stacks used: {} of {}", bu.stacks_used, bu.stacks_granted);

    out
}
