//! Despawn synthesis for fixed-lifetime entities.
//!
//! Transient entities never log their own disappearance. The normalizer
//! fabricates a `despawn` event `duration` after each summon and inserts it
//! into the trace at the right time. Summoning an extension-trigger entity
//! pushes every still-pending despawn back by a fixed delta.
//!
//! # Algorithm Summary
//!
//! 1. Walk the trace once, left to right, looking only at summons
//! 2. Transient summon: insert a synthetic despawn before the first later
//!    event and remember it in the ledger
//! 3. Extension trigger: forget despawns that already fired, move the rest
//!    back by `extension_ms` starting from the latest, clear the ledger
//!
//! Despawns are located by sequence number rather than by cached index, so
//! earlier insertions never invalidate a pending entry.

mod ledger;

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{Event, EventKind};
use crate::registry::{EntityCategory, EntityRegistry};
use crate::trace::Trace;
use crate::types::{ActorKey, EntityKind, EventSeq};

use ledger::Ledger;

/// Problems found with individual events during normalization.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum NormalizeError {
    /// A summon references a kind with no registered lifetime.
    #[error("no duration registered for summoned {kind} (event {seq} at {timestamp}ms)")]
    MissingDuration {
        kind: EntityKind,
        seq: EventSeq,
        timestamp: u64,
    },
}

/// What to do with a synthetic event that would land after the last event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    /// Leave it out and record it in [`NormalizeReport::dropped`].
    #[default]
    Drop,
    /// Append it after the last event.
    Append,
}

/// Configuration for normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// How far an extension trigger pushes back pending despawns.
    /// Default: 15000 (15 seconds).
    pub extension_ms: u64,

    /// Placement of synthetic events past the end of the trace.
    pub tail_policy: TailPolicy,

    /// Abort on the first missing duration instead of reporting it.
    pub strict: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            extension_ms: 15_000, // Demonic Tyrant
            tail_policy: TailPolicy::Drop,
            strict: false,
        }
    }
}

/// Which step produced a dropped synthetic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropStage {
    Synthesized,
    Extended,
}

/// A synthetic event that had no insertion point.
///
/// A despawn whose time does not fit in a `u64` is dropped with
/// `timestamp: u64::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedSynthetic {
    /// The entity whose despawn was lost.
    pub entity: ActorKey,
    /// The timestamp the despawn would have had.
    pub timestamp: u64,
    /// The summon that caused it.
    pub trigger: EventSeq,
    pub stage: DropStage,
}

/// Counters and diagnostics from one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// Synthetic despawns placed in the trace.
    pub synthesized: usize,
    /// Synthetic despawns moved by an extension trigger.
    pub extended: usize,
    /// Extension triggers encountered.
    pub extension_triggers: usize,
    /// Ledger entries that fired before they could be extended.
    pub stale_discarded: usize,
    /// Synthetic events lost at the end of the trace.
    pub dropped: Vec<DroppedSynthetic>,
    /// Events that could not be processed.
    pub diagnostics: Vec<NormalizeError>,
}

/// A normalized trace and what happened while producing it.
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    pub trace: Trace,
    pub report: NormalizeReport,
}

/// Inserts synthetic despawn events into traces.
#[derive(Debug, Clone)]
pub struct Normalizer<'a> {
    registry: &'a EntityRegistry,
    config: NormalizerConfig,
}

impl<'a> Normalizer<'a> {
    pub const fn new(registry: &'a EntityRegistry, config: NormalizerConfig) -> Self {
        Self { registry, config }
    }

    /// Normalizes one trace.
    ///
    /// Traces that are already normalized come back unchanged, as do summons
    /// that already have a synthetic despawn pointing at them.
    pub fn normalize(&self, trace: Trace) -> Result<NormalizeOutcome, NormalizeError> {
        if trace.is_normalized() {
            tracing::debug!("trace already normalized, skipping");
            return Ok(NormalizeOutcome {
                trace,
                report: NormalizeReport::default(),
            });
        }

        let handled: HashSet<EventSeq> = trace
            .iter()
            .filter_map(|e| e.synthetic.map(|p| p.trigger))
            .collect();

        let mut pass = Pass {
            config: &self.config,
            trace,
            ledger: Ledger::default(),
            report: NormalizeReport::default(),
        };

        let mut i = 0;
        while i < pass.trace.len() {
            let event = &pass.trace.events()[i];
            let EventKind::Summon { entity_kind } = event.kind else {
                i += 1;
                continue;
            };
            if handled.contains(&event.seq) {
                i += 1;
                continue;
            }
            let summon = event.clone();

            match self.registry.lookup(entity_kind) {
                None => self.missing_duration(&summon, entity_kind, &mut pass.report)?,
                Some(spec) => match (spec.category, spec.duration_ms) {
                    (EntityCategory::Excluded | EntityCategory::Permanent, _) => {
                        tracing::trace!(kind = %entity_kind, "skipping untracked summon");
                    }
                    (EntityCategory::ExtensionTrigger, _) => pass.extend(summon.timestamp),
                    (EntityCategory::Transient, Some(duration)) => {
                        pass.synthesize(&summon, duration);
                    }
                    (EntityCategory::Transient, None) => {
                        self.missing_duration(&summon, entity_kind, &mut pass.report)?;
                    }
                },
            }
            i += 1;
        }

        let Pass {
            mut trace, report, ..
        } = pass;
        trace.mark_normalized();

        tracing::debug!(
            events = trace.len(),
            synthesized = report.synthesized,
            extended = report.extended,
            dropped = report.dropped.len(),
            diagnostics = report.diagnostics.len(),
            "normalized trace"
        );

        Ok(NormalizeOutcome { trace, report })
    }

    fn missing_duration(
        &self,
        summon: &Event,
        kind: EntityKind,
        report: &mut NormalizeReport,
    ) -> Result<(), NormalizeError> {
        let err = NormalizeError::MissingDuration {
            kind,
            seq: summon.seq,
            timestamp: summon.timestamp,
        };
        if self.config.strict {
            return Err(err);
        }
        tracing::warn!(error = %err, "skipping summon");
        report.diagnostics.push(err);
        Ok(())
    }
}

/// State owned by a single call to [`Normalizer::normalize`].
struct Pass<'c> {
    config: &'c NormalizerConfig,
    trace: Trace,
    ledger: Ledger,
    report: NormalizeReport,
}

impl Pass<'_> {
    fn synthesize(&mut self, summon: &Event, duration: u64) {
        let Some(fire_time) = summon.timestamp.checked_add(duration) else {
            self.drop_synthetic(
                summon.target(),
                u64::MAX,
                summon.seq,
                DropStage::Synthesized,
            );
            return;
        };
        let despawn = Event::despawn_for(summon, fire_time);

        if let Some(seq) = self.place(despawn, None, summon.seq, DropStage::Synthesized) {
            self.report.synthesized += 1;
            self.report.stale_discarded += self.ledger.discard_stale(summon.timestamp);
            self.ledger.register(seq, fire_time);
            tracing::trace!(
                entity = %summon.target(),
                fire_time,
                pending = self.ledger.len(),
                "synthesized despawn"
            );
        }
    }

    fn extend(&mut self, now: u64) {
        self.report.extension_triggers += 1;
        self.report.stale_discarded += self.ledger.discard_stale(now);

        let mut pending: Vec<_> = self
            .ledger
            .drain()
            .into_iter()
            .filter_map(|entry| {
                let position = self
                    .trace
                    .position_of(entry.seq, entry.expected_fire_time);
                if position.is_none() {
                    tracing::warn!(seq = %entry.seq, "pending despawn missing from trace");
                }
                position.map(|p| (p, entry))
            })
            .collect();
        // Latest first. Despawns that end up sharing a timestamp come out in
        // reverse of their previous order.
        pending.sort_by_key(|(position, _)| std::cmp::Reverse(*position));

        for (_, entry) in pending {
            let Some(position) = self.trace.position_of(entry.seq, entry.expected_fire_time)
            else {
                continue;
            };
            let mut despawn = self.trace.remove(position);
            let trigger = despawn.synthetic.map_or(entry.seq, |p| p.trigger);
            let Some(shifted) = despawn.timestamp.checked_add(self.config.extension_ms) else {
                self.drop_synthetic(despawn.source(), u64::MAX, trigger, DropStage::Extended);
                continue;
            };
            despawn.timestamp = shifted;

            if self
                .place(despawn, Some(entry.seq), trigger, DropStage::Extended)
                .is_some()
            {
                self.report.extended += 1;
            }
        }

        tracing::trace!(now, extended = self.report.extended, "applied extension");
    }

    /// Inserts a synthetic event before the first strictly later event,
    /// falling back to the tail policy. Returns its sequence number if placed.
    fn place(
        &mut self,
        event: Event,
        existing: Option<EventSeq>,
        trigger: EventSeq,
        stage: DropStage,
    ) -> Option<EventSeq> {
        match self.trace.insertion_point(event.timestamp) {
            Some(index) => Some(match existing {
                Some(seq) => {
                    self.trace.reinsert(index, event);
                    seq
                }
                None => self.trace.insert(index, event),
            }),
            None => match self.config.tail_policy {
                TailPolicy::Append => Some(self.trace.push(event)),
                TailPolicy::Drop => {
                    self.drop_synthetic(event.source(), event.timestamp, trigger, stage);
                    None
                }
            },
        }
    }

    fn drop_synthetic(
        &mut self,
        entity: ActorKey,
        timestamp: u64,
        trigger: EventSeq,
        stage: DropStage,
    ) {
        tracing::debug!(
            %entity,
            timestamp,
            ?stage,
            "no later event to insert before, dropping synthetic event"
        );
        self.report.dropped.push(DroppedSynthetic {
            entity,
            timestamp,
            trigger,
            stage,
        });
    }
}

/// Normalizes independent sessions in parallel.
pub fn normalize_sessions(
    traces: Vec<Trace>,
    registry: &EntityRegistry,
    config: &NormalizerConfig,
) -> Vec<Result<NormalizeOutcome, NormalizeError>> {
    traces
        .into_par_iter()
        .map(|trace| Normalizer::new(registry, config.clone()).normalize(trace))
        .collect()
}

#[cfg(test)]
mod tests;
