//! Aggregators that turn replayed events into counts and sums.

mod bonus_damage;
mod buff_usage;

pub use bonus_damage::{BonusDamageAnalyzer, BonusDamageConfig, BonusDamageSummary, CastSnapshot};
pub use buff_usage::{BuffUsageAnalyzer, BuffUsageConfig, BuffUsageSummary};

/// `numerator / denominator`, or 0 when nothing was counted.
#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
