//! Usage of a stacking buff that empowers a fixed number of casts.

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventKind};
use crate::replay::Analyzer;
use crate::state::CombatState;
use crate::types::AbilityId;

use super::ratio;

/// Configuration for buff usage tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffUsageConfig {
    /// The empowered spell. Default: Chaos Bolt.
    pub ability: AbilityId,
    /// The stacking buff. Default: Crashing Chaos.
    pub buff: AbilityId,
    /// Casts each application can empower.
    pub stacks_per_proc: u32,
}

impl Default for BuffUsageConfig {
    fn default() -> Self {
        Self {
            ability: AbilityId(116_858),
            buff: AbilityId(277_706),
            stacks_per_proc: 8,
        }
    }
}

/// Aggregated results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuffUsageSummary {
    pub buffed_casts: usize,
    pub buff_applications: usize,
    /// Stacks consumed, from the last stack count logged for each application.
    pub stacks_used: u64,
    /// Stacks made available by all applications.
    pub stacks_granted: u64,
    /// Average empowered casts per application.
    pub casts_per_buff: f64,
}

/// Counts casts made under a stacking buff and the stacks they consumed.
#[derive(Debug)]
pub struct BuffUsageAnalyzer {
    config: BuffUsageConfig,
    player: u64,
    buffed_casts: usize,
    buff_applications: usize,
    stacks_used: u64,
    /// Last logged stack count of the currently active application.
    remaining: Option<u32>,
}

impl BuffUsageAnalyzer {
    pub const fn new(player: u64, config: BuffUsageConfig) -> Self {
        Self {
            config,
            player,
            buffed_casts: 0,
            buff_applications: 0,
            stacks_used: 0,
            remaining: None,
        }
    }

    pub fn summary(&self) -> BuffUsageSummary {
        let open = self.remaining.map_or(0, |stacks| self.used(stacks));
        BuffUsageSummary {
            buffed_casts: self.buffed_casts,
            buff_applications: self.buff_applications,
            stacks_used: self.stacks_used + open,
            stacks_granted: self.buff_applications as u64
                * u64::from(self.config.stacks_per_proc),
            casts_per_buff: ratio(self.buffed_casts, self.buff_applications),
        }
    }

    fn used(&self, remaining: u32) -> u64 {
        u64::from(self.config.stacks_per_proc.saturating_sub(remaining))
    }

    fn close_application(&mut self) {
        if let Some(remaining) = self.remaining.take() {
            self.stacks_used += self.used(remaining);
        }
    }
}

impl Analyzer for BuffUsageAnalyzer {
    fn on_event(&mut self, event: &Event, state: &CombatState) {
        match event.kind {
            EventKind::Cast { ability }
                if ability == self.config.ability && event.source_id == self.player =>
            {
                if state.has_buff(self.config.buff) {
                    self.buffed_casts += 1;
                }
            }
            EventKind::ApplyBuff { buff }
                if buff == self.config.buff && event.source_id == self.player =>
            {
                self.close_application();
                self.buff_applications += 1;
                // A fresh application is logged with a single stack.
                self.remaining = Some(1);
            }
            EventKind::ApplyBuffStack { buff, stacks } | EventKind::RemoveBuffStack { buff, stacks }
                if buff == self.config.buff && event.target_id == self.player =>
            {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining = stacks;
                }
            }
            EventKind::RemoveBuff { buff }
                if buff == self.config.buff && event.target_id == self.player =>
            {
                self.close_application();
            }
            _ => {}
        }
    }
}
