//! Buff and stat state of the selected player at the current replay position.

use std::collections::HashMap;

use crate::event::{Event, EventKind};
use crate::types::{AbilityId, Stat};

/// Observable state of one actor, rebuilt event by event during replay.
#[derive(Debug, Clone, Default)]
pub struct CombatState {
    player: u64,
    buffs: HashMap<AbilityId, u32>,
    stats: HashMap<Stat, u64>,
}

impl CombatState {
    pub fn new(player: u64) -> Self {
        Self {
            player,
            ..Self::default()
        }
    }

    /// Starting stat values, e.g. from the combatant info at pull.
    #[must_use]
    pub fn with_stat(mut self, stat: Stat, value: u64) -> Self {
        self.stats.insert(stat, value);
        self
    }

    pub const fn player(&self) -> u64 {
        self.player
    }

    pub fn has_buff(&self, buff: AbilityId) -> bool {
        self.buffs.contains_key(&buff)
    }

    /// Current stacks of `buff`, 0 when absent.
    pub fn buff_stacks(&self, buff: AbilityId) -> u32 {
        self.buffs.get(&buff).copied().unwrap_or(0)
    }

    pub fn stat(&self, stat: Stat) -> u64 {
        self.stats.get(&stat).copied().unwrap_or(0)
    }

    /// Folds one event into the state. Buffs count when the player is the
    /// target, stat changes when the player is the source.
    pub fn apply(&mut self, event: &Event) {
        match event.kind {
            EventKind::ApplyBuff { buff } if event.target_id == self.player => {
                self.buffs.insert(buff, 1);
            }
            EventKind::ApplyBuffStack { buff, stacks } | EventKind::RemoveBuffStack { buff, stacks }
                if event.target_id == self.player =>
            {
                self.buffs.insert(buff, stacks);
            }
            EventKind::RemoveBuff { buff } if event.target_id == self.player => {
                self.buffs.remove(&buff);
            }
            EventKind::StatChange { stat, value } if event.source_id == self.player => {
                self.stats.insert(stat, value);
            }
            _ => {}
        }
    }
}
