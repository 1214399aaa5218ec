//! Persisted player progression.

use crate::{
    AchievementId, PrestigeUpgradeId, UpgradeId, INITIAL_POINTS_PER_CLICK,
    INITIAL_POINTS_PER_SECOND,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-achievement progress record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AchievementProgress {
    /// One-way flag: never goes back to `false`.
    pub unlocked: bool,
    /// Last progress value reported for this achievement.
    pub progress: i64,
    /// When the achievement was unlocked.
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Prestige bookkeeping. Survives prestige resets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrestigeState {
    /// Number of prestiges performed.
    pub level: i64,
    /// Prestige points earned over all resets.
    pub total_prestige_points: i64,
    /// Spendable prestige points.
    pub current_prestige_points: i64,
    /// Multiplier derived from GlobalMultiplier upgrades (>= 1.0).
    pub global_multiplier: f64,
    pub last_prestige_time: Option<DateTime<Utc>>,
    /// Owned prestige upgrade levels.
    pub upgrade_levels: BTreeMap<PrestigeUpgradeId, u32>,
}

impl Default for PrestigeState {
    fn default() -> Self {
        Self {
            level: 0,
            total_prestige_points: 0,
            current_prestige_points: 0,
            global_multiplier: 1.0,
            last_prestige_time: None,
            upgrade_levels: BTreeMap::new(),
        }
    }
}

/// The single source of truth for a player's progression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerState {
    /// Spendable balance (>= 0).
    pub current_points: i64,
    /// Points per click (>= 1), derived from upgrades.
    pub points_per_click: i64,
    /// Idle points per second (>= 0), derived from upgrades.
    pub points_per_second: i64,
    pub total_clicks: i64,
    pub total_upgrades_purchased: i64,
    pub play_start_time: DateTime<Utc>,
    pub total_play_time_seconds: f64,
    /// Owned production upgrade levels. Emptied on prestige.
    pub upgrade_levels: BTreeMap<UpgradeId, u32>,
    pub achievement_progress: BTreeMap<AchievementId, AchievementProgress>,
    pub prestige: PrestigeState,
}

impl PlayerState {
    /// A brand-new player starting at `now`.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            current_points: 0,
            points_per_click: INITIAL_POINTS_PER_CLICK,
            points_per_second: INITIAL_POINTS_PER_SECOND,
            total_clicks: 0,
            total_upgrades_purchased: 0,
            play_start_time: now,
            total_play_time_seconds: 0.0,
            upgrade_levels: BTreeMap::new(),
            achievement_progress: BTreeMap::new(),
            prestige: PrestigeState::default(),
        }
    }

    /// Owned level of an upgrade, 0 if never bought.
    pub fn upgrade_level(&self, id: &UpgradeId) -> u32 {
        self.upgrade_levels.get(id).copied().unwrap_or(0)
    }

    /// Owned level of a prestige upgrade, 0 if never bought.
    pub fn prestige_upgrade_level(&self, id: &PrestigeUpgradeId) -> u32 {
        self.prestige.upgrade_levels.get(id).copied().unwrap_or(0)
    }

    /// Highest level owned of any single upgrade.
    pub fn max_upgrade_level(&self) -> u32 {
        self.upgrade_levels.values().copied().max().unwrap_or(0)
    }

    /// Whether the given achievement has been unlocked.
    pub fn is_achievement_unlocked(&self, id: &AchievementId) -> bool {
        self.achievement_progress
            .get(id)
            .map(|p| p.unlocked)
            .unwrap_or(false)
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::fresh(Utc::now())
    }
}
