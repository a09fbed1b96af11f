//! Static table of summonable entity kinds.
//!
//! The normalizer consults the registry to decide whether a summon needs a
//! synthetic despawn, and how long after the summon that despawn happens.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::EntityKind;

/// Registry construction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same kind was listed twice.
    #[error("entity {0} is listed more than once")]
    DuplicateKind(EntityKind),
}

/// How the normalizer treats summons of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// Fixed-lifetime entity whose despawn is never logged.
    Transient,
    /// Lives until dismissed; no despawn is synthesized.
    Permanent,
    /// Summoning it extends every pending transient entity.
    ExtensionTrigger,
    /// Lifetime handled elsewhere.
    Excluded,
}

/// One row of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub kind: EntityKind,
    /// Human-readable label, only used in diagnostics.
    #[serde(default)]
    pub name: String,
    pub category: EntityCategory,
    /// Lifetime in milliseconds. Required for [`EntityCategory::Transient`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl EntitySpec {
    pub fn transient(kind: u64, name: &str, duration_ms: u64) -> Self {
        Self::with_category(kind, name, EntityCategory::Transient, Some(duration_ms))
    }

    pub fn permanent(kind: u64, name: &str) -> Self {
        Self::with_category(kind, name, EntityCategory::Permanent, None)
    }

    pub fn extension_trigger(kind: u64, name: &str, duration_ms: u64) -> Self {
        Self::with_category(
            kind,
            name,
            EntityCategory::ExtensionTrigger,
            Some(duration_ms),
        )
    }

    pub fn excluded(kind: u64, name: &str) -> Self {
        Self::with_category(kind, name, EntityCategory::Excluded, None)
    }

    fn with_category(
        kind: u64,
        name: &str,
        category: EntityCategory,
        duration_ms: Option<u64>,
    ) -> Self {
        Self {
            kind: EntityKind(kind),
            name: name.to_string(),
            category,
            duration_ms,
        }
    }
}

/// Lookup from entity kind to its lifecycle rules.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entries: HashMap<EntityKind, EntitySpec>,
}

impl EntityRegistry {
    /// Builds a registry, rejecting duplicate kinds.
    pub fn new(specs: impl IntoIterator<Item = EntitySpec>) -> Result<Self, RegistryError> {
        let mut entries = HashMap::new();
        for spec in specs {
            let kind = spec.kind;
            if entries.insert(kind, spec).is_some() {
                return Err(RegistryError::DuplicateKind(kind));
            }
        }
        Ok(Self { entries })
    }

    /// Demonology warlock minions.
    pub fn demonology() -> Self {
        let specs = [
            EntitySpec::transient(98035, "Dreadstalker", 12_000),
            EntitySpec::transient(135_816, "Vilefiend", 15_000),
            EntitySpec::transient(136_404, "Bilescourge", 15_000),
            EntitySpec::transient(136_398, "Illidari Satyr", 15_000),
            EntitySpec::transient(136_403, "Void Terror", 15_000),
            EntitySpec::transient(136_402, "Ur'zul", 15_000),
            EntitySpec::transient(136_399, "Vicious Hellhound", 15_000),
            EntitySpec::transient(136_406, "Shivarra", 15_000),
            EntitySpec::transient(136_407, "Wrathguard", 15_000),
            EntitySpec::transient(136_408, "Darkhound", 15_000),
            EntitySpec::transient(135_998, "Prince Malchezaar", 15_000),
            EntitySpec::transient(136_397, "Eyes of Gul'dan", 15_000),
            EntitySpec::extension_trigger(135_002, "Demonic Tyrant", 15_000),
            EntitySpec::excluded(55659, "Wild Imp"),
            EntitySpec::excluded(143_622, "Wild Imp (Inner Demons)"),
            EntitySpec::permanent(17252, "Felguard"),
            EntitySpec::permanent(416, "Imp"),
            EntitySpec::permanent(1860, "Voidwalker"),
            EntitySpec::permanent(417, "Felhunter"),
            EntitySpec::permanent(1863, "Succubus"),
        ];
        Self {
            entries: specs.into_iter().map(|s| (s.kind, s)).collect(),
        }
    }

    pub fn lookup(&self, kind: EntityKind) -> Option<&EntitySpec> {
        self.entries.get(&kind)
    }

    /// Category of a kind, or `None` when the kind is not tracked at all.
    pub fn category(&self, kind: EntityKind) -> Option<EntityCategory> {
        self.lookup(kind).map(|spec| spec.category)
    }

    pub fn duration(&self, kind: EntityKind) -> Option<u64> {
        self.lookup(kind).and_then(|spec| spec.duration_ms)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by kind.
    pub fn specs(&self) -> Vec<&EntitySpec> {
        let mut specs: Vec<_> = self.entries.values().collect();
        specs.sort_by_key(|s| s.kind);
        specs
    }
}
