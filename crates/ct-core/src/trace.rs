//! Time-ordered event sequences.
//!
//! A [`Trace`] keeps its events sorted by timestamp, with ties kept in
//! insertion order. Every event carries an [`EventSeq`] so that it can be
//! found again after other events were inserted or removed.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use thiserror::Error;

use crate::event::Event;
use crate::event_type::EventType;
use crate::types::EventSeq;

/// Errors reading or writing JSONL traces.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid event on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode event {seq}: {source}")]
    Encode {
        seq: EventSeq,
        #[source]
        source: serde_json::Error,
    },
}

/// An ordered, finite sequence of events from one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    events: Vec<Event>,
    next_seq: u64,
    normalized: bool,
}

impl Trace {
    /// Builds a trace, stable-sorting by timestamp.
    ///
    /// Sequence numbers already present are kept when they are unique
    /// (a previously written trace); otherwise events are numbered from 1
    /// in trace order and synthetic triggers are rewritten to match.
    pub fn new(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.timestamp);

        let mut counts: HashMap<EventSeq, usize> = HashMap::with_capacity(events.len());
        for event in &events {
            *counts.entry(event.seq).or_default() += 1;
        }
        let unique = !counts.contains_key(&EventSeq(0)) && counts.values().all(|&n| n == 1);
        if !unique {
            renumber(&mut events, &counts);
        }

        let next_seq = events
            .iter()
            .map(|e| e.seq.0)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        Self {
            events,
            next_seq,
            normalized: false,
        }
    }

    /// Reads one JSON event per line. Blank lines are skipped.
    pub fn from_jsonl<R: BufRead>(reader: R) -> Result<Self, TraceError> {
        let mut events = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&line).map_err(|source| TraceError::Parse {
                line: i + 1,
                source,
            })?;
            events.push(event);
        }
        Ok(Self::new(events))
    }

    /// Writes one JSON event per line, optionally only events of one type.
    pub fn write_jsonl<W: Write>(
        &self,
        writer: &mut W,
        only: Option<EventType>,
    ) -> Result<(), TraceError> {
        let selected = self
            .events
            .iter()
            .filter(|e| only.is_none_or(|ty| e.event_type() == ty));
        for event in selected {
            let json = serde_json::to_string(event).map_err(|source| TraceError::Encode {
                seq: event.seq,
                source,
            })?;
            writeln!(writer, "{json}")?;
        }
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether this trace came out of the normalizer.
    pub const fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub(crate) const fn mark_normalized(&mut self) {
        self.normalized = true;
    }

    /// True when timestamps never decrease.
    pub fn is_ordered(&self) -> bool {
        self.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
    }

    /// Index of the first event strictly later than `timestamp`.
    ///
    /// Returns `None` when no such event exists, i.e. an event at `timestamp`
    /// would land at the end of the trace.
    pub fn insertion_point(&self, timestamp: u64) -> Option<usize> {
        let index = self.events.partition_point(|e| e.timestamp <= timestamp);
        (index < self.events.len()).then_some(index)
    }

    /// Finds an event by identity. `timestamp` narrows the search to the
    /// run of events sharing that timestamp.
    pub fn position_of(&self, seq: EventSeq, timestamp: u64) -> Option<usize> {
        let start = self.events.partition_point(|e| e.timestamp < timestamp);
        self.events[start..]
            .iter()
            .take_while(|e| e.timestamp == timestamp)
            .position(|e| e.seq == seq)
            .map(|offset| start + offset)
    }

    /// Inserts `event` at `index`, giving it a fresh sequence number.
    ///
    /// The caller is responsible for choosing an index that keeps the trace
    /// ordered (see [`Trace::insertion_point`]).
    pub(crate) fn insert(&mut self, index: usize, mut event: Event) -> EventSeq {
        event.seq = self.allocate_seq();
        let seq = event.seq;
        self.events.insert(index, event);
        debug_assert!(self.is_ordered());
        seq
    }

    /// Re-inserts an event that already has a sequence number.
    pub(crate) fn reinsert(&mut self, index: usize, event: Event) {
        self.events.insert(index, event);
        debug_assert!(self.is_ordered());
    }

    /// Appends at the end, allocating a sequence number when the event has none.
    pub(crate) fn push(&mut self, mut event: Event) -> EventSeq {
        if event.seq.0 == 0 {
            event.seq = self.allocate_seq();
        }
        let seq = event.seq;
        self.events.push(event);
        debug_assert!(self.is_ordered());
        seq
    }

    pub(crate) fn remove(&mut self, index: usize) -> Event {
        self.events.remove(index)
    }

    const fn allocate_seq(&mut self) -> EventSeq {
        let seq = EventSeq(self.next_seq);
        self.next_seq += 1;
        seq
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl FromIterator<Event> for Trace {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Numbers `events` from 1 and points synthetic triggers at the new numbers.
///
/// A trigger whose old number was missing or shared by several events can
/// no longer be resolved and becomes `EventSeq(0)`, which matches nothing.
fn renumber(events: &mut [Event], counts: &HashMap<EventSeq, usize>) {
    let mut renamed = HashMap::new();
    for (i, event) in (1u64..).zip(events.iter_mut()) {
        let old = std::mem::replace(&mut event.seq, EventSeq(i));
        if old.0 != 0 && counts.get(&old) == Some(&1) {
            renamed.insert(old, event.seq);
        }
    }

    for provenance in events.iter_mut().filter_map(|e| e.synthetic.as_mut()) {
        let old = provenance.trigger;
        provenance.trigger = renamed.get(&old).copied().unwrap_or_else(|| {
            tracing::warn!(trigger = %old, "synthetic event refers to an ambiguous event");
            EventSeq(0)
        });
    }
}
