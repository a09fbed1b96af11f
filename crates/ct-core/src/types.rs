//! Core identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generates a transparent numeric ID newtype with common trait implementations.
macro_rules! define_numeric_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty), $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Returns the raw numeric value.
            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_numeric_id!(
    /// The game identifier of an entity type (e.g. every Dreadstalker shares one kind).
    EntityKind(u64), "kind:"
);

define_numeric_id!(
    /// A spell or buff identifier.
    AbilityId(u32), "spell:"
);

define_numeric_id!(
    /// Position-independent identity of an event within one trace.
    ///
    /// Assigned when the trace is built and never reused, so an event can be
    /// found again after other events have been inserted or removed around it.
    EventSeq(u64), "#"
);

/// Identity of a single actor: the game ID plus the instance counter that
/// disambiguates several live actors sharing the same ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorKey {
    pub id: u64,
    pub instance: u32,
}

impl ActorKey {
    #[must_use]
    pub const fn new(id: u64, instance: u32) -> Self {
        Self { id, instance }
    }
}

impl fmt::Display for ActorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id, self.instance)
    }
}

/// Secondary stats that can be snapshotted at cast time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Intellect,
    Haste,
    Critical,
    Mastery,
    Versatility,
}
