#![deny(warnings)]

//! Progression formulas for Point Generator.
//!
//! This module provides the pure numeric rules the engines apply:
//! - Exponential cost curves for production and prestige upgrades
//! - Prestige point gain and the permanent effects of prestige upgrades
//! - Bounded, discounted offline catch-up rewards
//! - Human-readable offline duration formatting

use idle_core::{PrestigeUpgradeDefinition, PrestigeUpgradeKind, UpgradeDefinition};

/// Offline absences shorter than this earn nothing.
pub const MIN_OFFLINE_SECONDS: f64 = 60.0;
pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const SECONDS_PER_HOUR: f64 = 3_600.0;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert a rounded/floored float to i64, saturating at `i64::MAX` for
/// overflow and non-finite input, and at 0 for negatives.
fn saturate(x: f64) -> i64 {
    if x.is_nan() || x >= i64::MAX as f64 {
        return i64::MAX;
    }
    if x <= 0.0 {
        return 0;
    }
    x as i64
}

/// Cost of buying the next level when `level` levels are already owned.
///
/// round(base * multiplier^level), saturating at `i64::MAX`.
///
/// Example:
/// assert_eq!(cost_at(10, 1.15, 0), 10);
/// assert_eq!(cost_at(10, 1.15, 1), 12);
/// assert_eq!(cost_at(10, 1.15, 2), 13);
pub fn cost_at(base_cost: i64, cost_multiplier: f64, level: u32) -> i64 {
    saturate((base_cost as f64 * cost_multiplier.powf(level as f64)).round())
}

/// Price of the next level of a production upgrade.
pub fn upgrade_cost(def: &UpgradeDefinition, level: u32) -> i64 {
    cost_at(def.base_cost, def.cost_multiplier, level)
}

/// Sum of the prices paid for levels `0..level`.
pub fn total_invested_cost(def: &UpgradeDefinition, level: u32) -> i64 {
    (0..level).fold(0i64, |acc, l| acc.saturating_add(upgrade_cost(def, l)))
}

/// Price in prestige points of the next level of a prestige upgrade.
pub fn prestige_upgrade_cost(def: &PrestigeUpgradeDefinition, level: u32) -> i64 {
    cost_at(def.base_cost, def.cost_multiplier, level)
}

/// Whether `level` has reached a definition's cap (`max_level == 0` is unlimited).
pub fn at_max_level(max_level: u32, level: u32) -> bool {
    max_level > 0 && level >= max_level
}

/// Prestige points earned by resetting with `points` at prestige `level`.
///
/// floor(points * ratio * (1 + level * level_bonus)), never negative.
///
/// Example:
/// assert_eq!(prestige_gain(2_000_000, 0.001, 0, 0.1), 2_000);
/// assert_eq!(prestige_gain(2_000_000, 0.001, 5, 0.1), 3_000);
pub fn prestige_gain(points: i64, ratio: f64, level: i64, level_bonus: f64) -> i64 {
    let raw = points as f64 * ratio * (1.0 + level as f64 * level_bonus);
    saturate(raw.floor())
}

/// Global multiplier from owned prestige upgrades: 1 + Σ level × base effect
/// over GlobalMultiplier upgrades. Other kinds contribute nothing.
pub fn global_multiplier<'a, I>(owned: I) -> f64
where
    I: IntoIterator<Item = (&'a PrestigeUpgradeDefinition, u32)>,
{
    owned
        .into_iter()
        .filter(|(def, level)| *level > 0 && def.kind == PrestigeUpgradeKind::GlobalMultiplier)
        .fold(1.0, |acc, (def, level)| {
            acc + def.base_effect_value * level as f64
        })
}

/// Offline reward multiplier from owned prestige upgrades:
/// 1 + Σ level × (base + increment × (level − 1)) over OfflineBonus upgrades.
pub fn offline_bonus<'a, I>(owned: I) -> f64
where
    I: IntoIterator<Item = (&'a PrestigeUpgradeDefinition, u32)>,
{
    owned
        .into_iter()
        .filter(|(def, level)| *level > 0 && def.kind == PrestigeUpgradeKind::OfflineBonus)
        .fold(1.0, |acc, (def, level)| {
            let per_level =
                def.base_effect_value + def.effect_increment_per_level * (level as f64 - 1.0);
            acc + per_level * level as f64
        })
}

/// Points granted for `elapsed_secs` spent offline.
///
/// Zero below [`MIN_OFFLINE_SECONDS`]; otherwise
/// floor(pps × efficiency × bonus × min(elapsed, max_hours × 3600)), never negative.
///
/// Example:
/// assert_eq!(offline_reward(10, 0.5, 1.0, 7_200.0, 24.0), 36_000);
pub fn offline_reward(
    points_per_second: i64,
    efficiency: f64,
    bonus: f64,
    elapsed_secs: f64,
    max_offline_hours: f64,
) -> i64 {
    if elapsed_secs.is_nan() || elapsed_secs < MIN_OFFLINE_SECONDS {
        return 0;
    }
    let effective = elapsed_secs.min(max_offline_hours * SECONDS_PER_HOUR);
    let reward = points_per_second as f64 * efficiency * bonus * effective;
    if reward.is_nan() {
        return 0;
    }
    saturate(reward.floor())
}

/// Compact offline duration: "45s", "12m", "3.5h", "1.2d".
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    if seconds < SECONDS_PER_MINUTE {
        format!("{:.0}s", seconds)
    } else if seconds < SECONDS_PER_HOUR {
        format!("{:.0}m", seconds / SECONDS_PER_MINUTE)
    } else if seconds < SECONDS_PER_DAY {
        format!("{:.1}h", seconds / SECONDS_PER_HOUR)
    } else {
        format!("{:.1}d", seconds / SECONDS_PER_DAY)
    }
}
