//! Core domain logic for combat trace analysis.
//!
//! This crate contains the fundamental types and logic for:
//! - Normalization: fabricating despawn events for fixed-lifetime summons
//! - Correlation: pairing delayed damage with the cast that caused it
//! - Replay: feeding a normalized trace through statistic aggregators

pub mod analyzers;
mod correlate;
pub mod event;
pub mod event_type;
mod normalize;
pub mod registry;
mod replay;
mod state;
mod trace;
pub mod types;

pub use correlate::{Correlation, CorrelationConfig, CorrelationStats, Correlator};
pub use event::{Event, EventKind, Provenance};
pub use event_type::{EventType, UnknownEventType};
pub use normalize::{
    DropStage, DroppedSynthetic, NormalizeError, NormalizeOutcome, NormalizeReport, Normalizer,
    NormalizerConfig, TailPolicy, normalize_sessions,
};
pub use registry::{EntityCategory, EntityRegistry, EntitySpec, RegistryError};
pub use replay::{Analyzer, replay};
pub use state::CombatState;
pub use trace::{Trace, TraceError};
pub use types::{AbilityId, ActorKey, EntityKind, EventSeq, Stat};
