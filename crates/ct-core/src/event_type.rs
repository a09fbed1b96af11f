//! Event type names as they appear in trace files and on the command line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical combat log event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Summon,
    Despawn,
    Cast,
    Damage,
    ApplyBuff,
    ApplyBuffStack,
    RemoveBuffStack,
    RemoveBuff,
    StatChange,
}

impl EventType {
    pub const ALL: [Self; 9] = [
        Self::Summon,
        Self::Despawn,
        Self::Cast,
        Self::Damage,
        Self::ApplyBuff,
        Self::ApplyBuffStack,
        Self::RemoveBuffStack,
        Self::RemoveBuff,
        Self::StatChange,
    ];

    /// String form used in trace files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Summon => "summon",
            Self::Despawn => "despawn",
            Self::Cast => "cast",
            Self::Damage => "damage",
            Self::ApplyBuff => "applybuff",
            Self::ApplyBuffStack => "applybuffstack",
            Self::RemoveBuffStack => "removebuffstack",
            Self::RemoveBuff => "removebuff",
            Self::StatChange => "statchange",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "summon" => Ok(Self::Summon),
            "despawn" | "petdespawn" => Ok(Self::Despawn),
            "cast" => Ok(Self::Cast),
            "damage" => Ok(Self::Damage),
            "applybuff" => Ok(Self::ApplyBuff),
            "applybuffstack" => Ok(Self::ApplyBuffStack),
            "removebuffstack" => Ok(Self::RemoveBuffStack),
            "removebuff" => Ok(Self::RemoveBuff),
            "statchange" => Ok(Self::StatChange),
            other => Err(UnknownEventType(other.to_owned())),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// A `type` field naming no known event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown event type `{0}`")]
pub struct UnknownEventType(String);
