//! Combat log events.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event_type::EventType;
use crate::types::{AbilityId, ActorKey, EntityKind, EventSeq, Stat};

/// A single timestamped combat log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Identity within the owning trace. Assigned by [`Trace`](crate::Trace) when absent.
    #[serde(default)]
    pub seq: EventSeq,
    /// Milliseconds since the start of the session.
    pub timestamp: u64,
    #[serde(default)]
    pub source_id: u64,
    #[serde(default)]
    pub source_instance: u32,
    #[serde(default)]
    pub target_id: u64,
    #[serde(default)]
    pub target_instance: u32,
    /// What happened, with its kind-specific payload.
    #[serde(flatten)]
    pub kind: EventKind,
    /// Set only on events fabricated by the normalizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic: Option<Provenance>,
}

/// The type of event, carrying the fields specific to that type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    /// An entity was summoned. The summoned entity is the event's target.
    Summon { entity_kind: EntityKind },
    /// An entity disappeared. The despawned entity is the event's source.
    #[serde(alias = "petdespawn")]
    Despawn,
    /// An ability cast was issued.
    Cast { ability: AbilityId },
    /// An ability hit its target.
    Damage {
        ability: AbilityId,
        amount: u64,
        #[serde(default)]
        absorbed: u64,
    },
    ApplyBuff { buff: AbilityId },
    ApplyBuffStack { buff: AbilityId, stacks: u32 },
    RemoveBuffStack { buff: AbilityId, stacks: u32 },
    RemoveBuff { buff: AbilityId },
    /// A stat of the source changed to `value`.
    StatChange { stat: Stat, value: u64 },
}

impl EventKind {
    /// The canonical type tag of this kind.
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Summon { .. } => EventType::Summon,
            Self::Despawn => EventType::Despawn,
            Self::Cast { .. } => EventType::Cast,
            Self::Damage { .. } => EventType::Damage,
            Self::ApplyBuff { .. } => EventType::ApplyBuff,
            Self::ApplyBuffStack { .. } => EventType::ApplyBuffStack,
            Self::RemoveBuffStack { .. } => EventType::RemoveBuffStack,
            Self::RemoveBuff { .. } => EventType::RemoveBuff,
            Self::StatChange { .. } => EventType::StatChange,
        }
    }
}

/// Back-reference from a synthetic event to the event that caused it.
///
/// The normalizer reads it to recognize summons it has already handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub trigger: EventSeq,
}

impl Event {
    /// Creates an event with zeroed actors. Use [`Event::by`] and [`Event::on`] to fill them in.
    pub const fn new(timestamp: u64, kind: EventKind) -> Self {
        Self {
            seq: EventSeq(0),
            timestamp,
            source_id: 0,
            source_instance: 0,
            target_id: 0,
            target_instance: 0,
            kind,
            synthetic: None,
        }
    }

    /// Sets the source actor.
    #[must_use]
    pub const fn by(mut self, source: ActorKey) -> Self {
        self.source_id = source.id;
        self.source_instance = source.instance;
        self
    }

    /// Sets the target actor.
    #[must_use]
    pub const fn on(mut self, target: ActorKey) -> Self {
        self.target_id = target.id;
        self.target_instance = target.instance;
        self
    }

    pub const fn source(&self) -> ActorKey {
        ActorKey::new(self.source_id, self.source_instance)
    }

    pub const fn target(&self) -> ActorKey {
        ActorKey::new(self.target_id, self.target_instance)
    }

    pub const fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    pub const fn is_synthetic(&self) -> bool {
        self.synthetic.is_some()
    }

    /// Builds the despawn event for the entity summoned by `summon`.
    pub(crate) const fn despawn_for(summon: &Self, timestamp: u64) -> Self {
        Self {
            seq: EventSeq(0),
            timestamp,
            source_id: summon.target_id,
            source_instance: summon.target_instance,
            target_id: 0,
            target_instance: 0,
            kind: EventKind::Despawn,
            synthetic: Some(Provenance {
                trigger: summon.seq,
            }),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>7} {}", self.timestamp, self.event_type())?;
        match &self.kind {
            EventKind::Summon { entity_kind } => {
                write!(f, " {} {}", self.target(), entity_kind)?;
            }
            EventKind::Despawn => write!(f, " {}", self.source())?,
            EventKind::Cast { ability } => write!(f, " {ability} -> {}", self.target())?,
            EventKind::Damage {
                ability,
                amount,
                absorbed,
            } => write!(f, " {ability} -> {} {amount}+{absorbed}", self.target())?,
            EventKind::ApplyBuff { buff } | EventKind::RemoveBuff { buff } => {
                write!(f, " {buff} on {}", self.target())?;
            }
            EventKind::ApplyBuffStack { buff, stacks }
            | EventKind::RemoveBuffStack { buff, stacks } => {
                write!(f, " {buff}x{stacks} on {}", self.target())?;
            }
            EventKind::StatChange { stat, value } => write!(f, " {stat:?}={value}")?,
        }
        if self.is_synthetic() {
            write!(f, " (synthetic)")?;
        }
        Ok(())
    }
}
