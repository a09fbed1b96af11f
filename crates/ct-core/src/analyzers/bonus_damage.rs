//! Bonus damage from a proc buff that is snapshotted on cast.
//!
//! The buff (and intellect) count at the moment the spell is cast, but the
//! damage lands after travel time. Each cast is queued with a
//! [`CastSnapshot`] and paired with its damage through a [`Correlator`].

use serde::{Deserialize, Serialize};

use crate::correlate::{CorrelationConfig, CorrelationStats, Correlator};
use crate::event::{Event, EventKind};
use crate::replay::Analyzer;
use crate::state::CombatState;
use crate::types::{AbilityId, Stat};

use super::ratio;

/// Configuration for bonus damage attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusDamageConfig {
    /// The projectile spell. Default: Demonbolt.
    pub ability: AbilityId,
    /// The proc buff that adds flat damage. Default: Shadow's Bite.
    pub buff: AbilityId,
    /// Spell power coefficient of `ability`.
    pub coefficient: f64,
    /// Flat bonus per equipped rank; the ranks stack additively.
    pub rank_bonuses: Vec<u64>,
    /// Matching window between cast and damage.
    pub correlation: CorrelationConfig,
}

impl Default for BonusDamageConfig {
    fn default() -> Self {
        Self {
            ability: AbilityId(264_178),
            buff: AbilityId(272_945),
            coefficient: 0.667,
            rank_bonuses: Vec::new(),
            correlation: CorrelationConfig::default(),
        }
    }
}

impl BonusDamageConfig {
    /// Total flat bonus across ranks.
    pub fn bonus(&self) -> u64 {
        self.rank_bonuses.iter().sum()
    }
}

/// State captured when the spell is cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastSnapshot {
    pub buffed: bool,
    pub intellect: u64,
}

/// Aggregated results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BonusDamageSummary {
    /// Casts whose damage was observed.
    pub casts: usize,
    /// Of those, casts made while the buff was up.
    pub buffed_casts: usize,
    pub buff_applications: usize,
    /// Estimated damage contributed by the flat bonus.
    pub bonus_damage: f64,
    /// Average buffed casts per buff application.
    pub casts_per_proc: f64,
    pub correlation: CorrelationStats,
}

/// Attributes the flat bonus's share of each buffed hit.
#[derive(Debug)]
pub struct BonusDamageAnalyzer {
    config: BonusDamageConfig,
    player: u64,
    correlator: Correlator<CastSnapshot>,
    casts: usize,
    buffed_casts: usize,
    buff_applications: usize,
    bonus_damage: f64,
}

impl BonusDamageAnalyzer {
    pub fn new(player: u64, config: BonusDamageConfig) -> Self {
        Self {
            correlator: Correlator::new(config.correlation),
            config,
            player,
            casts: 0,
            buffed_casts: 0,
            buff_applications: 0,
            bonus_damage: 0.0,
        }
    }

    pub fn summary(&self) -> BonusDamageSummary {
        BonusDamageSummary {
            casts: self.casts,
            buffed_casts: self.buffed_casts,
            buff_applications: self.buff_applications,
            bonus_damage: self.bonus_damage,
            casts_per_proc: ratio(self.buffed_casts, self.buff_applications),
            correlation: self.correlator.stats(),
        }
    }

    fn on_damage(&mut self, event: &Event, amount: u64, absorbed: u64) {
        let Some(snapshot) = self.correlator.resolve_effect(event).into_snapshot() else {
            return;
        };

        self.casts += 1;
        if snapshot.buffed {
            let bonus = bonus_share(
                amount + absorbed,
                self.config.bonus(),
                self.config.coefficient,
                snapshot.intellect,
            );
            tracing::trace!(timestamp = event.timestamp, bonus, "buffed hit");
            self.bonus_damage += bonus;
            self.buffed_casts += 1;
        }
    }
}

impl Analyzer for BonusDamageAnalyzer {
    fn on_event(&mut self, event: &Event, state: &CombatState) {
        if event.source_id != self.player {
            return;
        }
        match event.kind {
            EventKind::Cast { ability } if ability == self.config.ability => {
                let snapshot = CastSnapshot {
                    buffed: state.has_buff(self.config.buff),
                    intellect: state.stat(Stat::Intellect),
                };
                self.correlator.track_intent(event, snapshot);
            }
            EventKind::Damage {
                ability,
                amount,
                absorbed,
            } if ability == self.config.ability => self.on_damage(event, amount, absorbed),
            EventKind::ApplyBuff { buff } if buff == self.config.buff => {
                self.buff_applications += 1;
            }
            _ => {}
        }
    }

    fn on_finished(&mut self) {
        let stats = self.correlator.finish();
        tracing::debug!(
            matched = stats.matched,
            unmatched = stats.unmatched_effects,
            expired = stats.expired_intents,
            "bonus damage correlation finished"
        );
    }
}

/// Portion of a hit contributed by a flat bonus.
///
/// The hit scales as `intellect * coefficient + bonus`, so the bonus owns
/// `bonus / (intellect * coefficient + bonus)` of the raw damage.
#[allow(clippy::cast_precision_loss)]
fn bonus_share(raw: u64, bonus: u64, coefficient: f64, intellect: u64) -> f64 {
    if bonus == 0 {
        return 0.0;
    }
    let bonus = bonus as f64;
    let base = (intellect as f64).mul_add(coefficient, bonus);
    raw as f64 * bonus / base
}
