//! Pairing delayed effects with the intents that caused them.
//!
//! A projectile spell logs its cast immediately but its damage only after
//! travel time, and other events can land in between. The [`Correlator`]
//! queues each cast together with a snapshot of the state at cast time,
//! then hands the snapshot back when the matching damage arrives.
//!
//! Matching is FIFO per target: the oldest queued cast on the damaged
//! target wins, not the one closest in time. Casts older than the window
//! are discarded when the next effect is resolved.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::types::ActorKey;

/// Configuration for intent/effect correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Maximum delay between an intent and its effect.
    /// Default: 2000 (2 seconds).
    pub window_ms: u64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self { window_ms: 2_000 }
    }
}

/// Result of resolving one effect event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation<S> {
    /// The effect was paired with a queued intent; carries its snapshot.
    Matched(S),
    /// No queued intent on the same target was within the window.
    Unmatched,
}

impl<S> Correlation<S> {
    pub const fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    pub fn into_snapshot(self) -> Option<S> {
        match self {
            Self::Matched(snapshot) => Some(snapshot),
            Self::Unmatched => None,
        }
    }
}

/// Running totals of correlation outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorrelationStats {
    pub intents: usize,
    pub matched: usize,
    pub unmatched_effects: usize,
    pub expired_intents: usize,
}

#[derive(Debug, Clone)]
struct InFlight<S> {
    issued_at: u64,
    target: ActorKey,
    snapshot: S,
}

/// FIFO intent queue with a bounded matching window.
#[derive(Debug, Clone)]
pub struct Correlator<S> {
    config: CorrelationConfig,
    queue: VecDeque<InFlight<S>>,
    stats: CorrelationStats,
}

impl<S> Correlator<S> {
    pub fn new(config: CorrelationConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            stats: CorrelationStats::default(),
        }
    }

    /// Queues an intent aimed at the event's target.
    ///
    /// `snapshot` must be captured now: the effect is attributed with the
    /// state at intent time, not at resolution.
    pub fn track_intent(&mut self, intent: &Event, snapshot: S) {
        self.queue.push_back(InFlight {
            issued_at: intent.timestamp,
            target: intent.target(),
            snapshot,
        });
        self.stats.intents += 1;
    }

    /// Pairs an effect with the oldest queued intent on the same target.
    pub fn resolve_effect(&mut self, effect: &Event) -> Correlation<S> {
        self.expire(effect.timestamp);

        let target = effect.target();
        let Some(index) = self.queue.iter().position(|entry| entry.target == target) else {
            self.stats.unmatched_effects += 1;
            tracing::debug!(
                timestamp = effect.timestamp,
                %target,
                pending = self.queue.len(),
                "effect has no queued intent"
            );
            return Correlation::Unmatched;
        };

        if let Some(entry) = self.queue.remove(index) {
            self.stats.matched += 1;
            return Correlation::Matched(entry.snapshot);
        }
        Correlation::Unmatched
    }

    /// Discards every remaining intent as expired and returns the totals.
    pub fn finish(&mut self) -> CorrelationStats {
        let remaining = self.queue.len();
        if remaining > 0 {
            tracing::debug!(remaining, "discarding intents left at end of trace");
        }
        self.stats.expired_intents += remaining;
        self.queue.clear();
        self.stats
    }

    pub const fn stats(&self) -> CorrelationStats {
        self.stats
    }

    /// Intents currently waiting for an effect.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn expire(&mut self, now: u64) {
        let window = self.config.window_ms;
        let before = self.queue.len();
        self.queue
            .retain(|entry| entry.issued_at.saturating_add(window) >= now);
        let expired = before - self.queue.len();
        if expired > 0 {
            self.stats.expired_intents += expired;
            tracing::debug!(expired, now, "discarded intents past the window");
        }
    }
}

impl<S> Default for Correlator<S> {
    fn default() -> Self {
        Self::new(CorrelationConfig::default())
    }
}
