//! Synthetic despawns that a later extension trigger may still push back.

use crate::types::EventSeq;

/// A synthetic event waiting to either fire or be extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RescheduleEntry {
    /// Timestamp the synthetic event currently sits at.
    pub expected_fire_time: u64,
    /// Identity of the synthetic event in the trace.
    pub seq: EventSeq,
}

/// Pending reschedule entries, owned by a single normalization pass.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    entries: Vec<RescheduleEntry>,
}

impl Ledger {
    pub fn register(&mut self, seq: EventSeq, expected_fire_time: u64) {
        self.entries.push(RescheduleEntry {
            expected_fire_time,
            seq,
        });
    }

    /// Drops entries that fire at or before `now`. Returns how many were dropped.
    pub fn discard_stale(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| now < entry.expected_fire_time);
        before - self.entries.len()
    }

    /// Removes and returns every remaining entry.
    pub fn drain(&mut self) -> Vec<RescheduleEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
