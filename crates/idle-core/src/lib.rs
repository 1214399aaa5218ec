#![deny(warnings)]

//! Core domain models and invariants for Point Generator.
//!
//! This crate defines the immutable catalog definitions, the persisted
//! [`PlayerState`], game configuration and the wall-clock abstraction, with
//! validation helpers to guarantee basic invariants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

pub mod catalog;
pub mod clock;
pub mod config;
pub mod state;

pub use catalog::Catalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GameConfig;
pub use state::{AchievementProgress, PlayerState, PrestigeState};

/// Points granted per click before any upgrade.
pub const INITIAL_POINTS_PER_CLICK: i64 = 1;
/// Idle points per second before any upgrade.
pub const INITIAL_POINTS_PER_SECOND: i64 = 0;
/// Minimum balance required to prestige.
pub const MIN_PRESTIGE_POINTS: i64 = 1_000_000;
/// Prestige points earned per point held at prestige time.
pub const PRESTIGE_POINT_RATIO: f64 = 0.001;
/// Default cost growth applied by catalogs that omit a multiplier.
pub const DEFAULT_COST_MULTIPLIER: f64 = 1.15;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier of a production upgrade, e.g. "stronger_finger".
    UpgradeId
);
string_id!(
    /// Unique identifier of an achievement, e.g. "first_click".
    AchievementId
);
string_id!(
    /// Unique identifier of a prestige upgrade, e.g. "global_multiplier".
    PrestigeUpgradeId
);
string_id!(
    /// Opaque localization key resolved by the presentation layer.
    TextKey
);

/// A production upgrade sold in the shop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDefinition {
    /// Upgrade identifier.
    pub id: UpgradeId,
    /// Display name key.
    pub name: TextKey,
    /// Description key.
    pub description: TextKey,
    /// Price of the first level (> 0).
    pub base_cost: i64,
    /// Price growth per owned level (>= 1).
    #[serde(default = "default_cost_multiplier")]
    pub cost_multiplier: f64,
    /// Points per click added by each level.
    #[serde(default)]
    pub per_click_effect: i64,
    /// Points per second added by each level.
    #[serde(default)]
    pub per_second_effect: i64,
    /// Highest purchasable level; 0 means unlimited.
    #[serde(default)]
    pub max_level: u32,
}

fn default_cost_multiplier() -> f64 {
    DEFAULT_COST_MULTIPLIER
}

/// What an achievement measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AchievementKind {
    /// Current point balance.
    TotalPoints,
    /// Lifetime clicks.
    TotalClicks,
    /// Lifetime upgrade purchases.
    UpgradeCount,
    /// Accumulated play time in seconds.
    TimeSpent,
    /// Idle production rate.
    PointsPerSecond,
    /// Click production rate.
    PointsPerClick,
    /// Prestige level.
    ReachLevel,
    /// Highest level owned of any single upgrade.
    MaxUpgradeLevel,
}

/// An achievement with its target and rewards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: AchievementId,
    pub name: TextKey,
    pub description: TextKey,
    pub kind: AchievementKind,
    /// Progress value that unlocks the achievement.
    pub target_value: i64,
    /// Points granted once on unlock.
    #[serde(default)]
    pub reward_points: i64,
    /// Permanent points-per-click bonus granted on unlock.
    #[serde(default)]
    pub reward_click_bonus: i64,
    /// Permanent points-per-second bonus granted on unlock.
    #[serde(default)]
    pub reward_idle_bonus: i64,
    /// Hidden achievements are not listed until unlocked.
    #[serde(default)]
    pub hidden: bool,
}

/// Effect family of a prestige upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrestigeUpgradeKind {
    GlobalMultiplier,
    ClickMultiplier,
    IdleMultiplier,
    UpgradeDiscount,
    OfflineBonus,
    AutoClicker,
}

/// A permanent upgrade bought with prestige points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrestigeUpgradeDefinition {
    pub id: PrestigeUpgradeId,
    pub name: TextKey,
    pub description: TextKey,
    /// Price of the first level in prestige points.
    pub base_cost: i64,
    /// Price growth per owned level.
    pub cost_multiplier: f64,
    /// Effect of the first level.
    pub base_effect_value: f64,
    /// Extra effect per level beyond the first.
    #[serde(default)]
    pub effect_increment_per_level: f64,
    pub kind: PrestigeUpgradeKind,
    /// Highest purchasable level; 0 means unlimited.
    #[serde(default)]
    pub max_level: u32,
}

/// Validation errors for catalog and configuration invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Identifier is empty or whitespace.
    #[error("identifier must not be empty")]
    EmptyId,
    /// Two definitions of the same family share an id.
    #[error("duplicate definition id: {0}")]
    DuplicateId(String),
    /// Costs must be strictly positive.
    #[error("cost must be > 0 for {0}")]
    NonPositiveCost(String),
    /// Cost multiplier must be finite and >= 1.
    #[error("cost multiplier must be finite and >= 1 for {0}")]
    InvalidCostMultiplier(String),
    /// Effects and rewards must be non-negative.
    #[error("negative effect or reward for {0}")]
    NegativeEffect(String),
    /// Numeric field must be finite.
    #[error("non-finite numeric value for {0}")]
    NonFinite(&'static str),
    /// Numeric setting outside its allowed range.
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
    /// Definition document could not be parsed.
    #[error("malformed definitions: {0}")]
    Malformed(String),
}

/// Validate a production upgrade definition.
pub fn validate_upgrade(def: &UpgradeDefinition) -> Result<(), ValidationError> {
    if def.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if def.base_cost <= 0 {
        return Err(ValidationError::NonPositiveCost(def.id.0.clone()));
    }
    if !def.cost_multiplier.is_finite() || def.cost_multiplier < 1.0 {
        return Err(ValidationError::InvalidCostMultiplier(def.id.0.clone()));
    }
    if def.per_click_effect < 0 || def.per_second_effect < 0 {
        return Err(ValidationError::NegativeEffect(def.id.0.clone()));
    }
    Ok(())
}

/// Validate an achievement definition.
pub fn validate_achievement(def: &AchievementDefinition) -> Result<(), ValidationError> {
    if def.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if def.target_value < 0
        || def.reward_points < 0
        || def.reward_click_bonus < 0
        || def.reward_idle_bonus < 0
    {
        return Err(ValidationError::NegativeEffect(def.id.0.clone()));
    }
    Ok(())
}

/// Validate a prestige upgrade definition.
pub fn validate_prestige_upgrade(def: &PrestigeUpgradeDefinition) -> Result<(), ValidationError> {
    if def.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if def.base_cost <= 0 {
        return Err(ValidationError::NonPositiveCost(def.id.0.clone()));
    }
    if !def.cost_multiplier.is_finite() || def.cost_multiplier < 1.0 {
        return Err(ValidationError::InvalidCostMultiplier(def.id.0.clone()));
    }
    if !(def.base_effect_value.is_finite() && def.effect_increment_per_level.is_finite()) {
        return Err(ValidationError::NonFinite("prestige effect"));
    }
    if def.base_effect_value < 0.0 || def.effect_increment_per_level < 0.0 {
        return Err(ValidationError::NegativeEffect(def.id.0.clone()));
    }
    Ok(())
}

/// Validate the whole catalog, including id uniqueness per definition family.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), ValidationError> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for u in &catalog.upgrades {
        validate_upgrade(u)?;
        if !seen.insert(u.id.as_str()) {
            return Err(ValidationError::DuplicateId(u.id.0.clone()));
        }
    }
    seen.clear();
    for a in &catalog.achievements {
        validate_achievement(a)?;
        if !seen.insert(a.id.as_str()) {
            return Err(ValidationError::DuplicateId(a.id.0.clone()));
        }
    }
    seen.clear();
    for p in &catalog.prestige_upgrades {
        validate_prestige_upgrade(p)?;
        if !seen.insert(p.id.as_str()) {
            return Err(ValidationError::DuplicateId(p.id.0.clone()));
        }
    }
    Ok(())
}

/// Validate a restored player state: counters and balances must be
/// non-negative and the float fields finite.
pub fn validate_state(state: &PlayerState) -> Result<(), ValidationError> {
    let counters = [
        ("current_points", state.current_points),
        ("total_clicks", state.total_clicks),
        ("total_upgrades_purchased", state.total_upgrades_purchased),
        ("prestige.level", state.prestige.level),
        ("prestige.total_prestige_points", state.prestige.total_prestige_points),
        ("prestige.current_prestige_points", state.prestige.current_prestige_points),
    ];
    for (name, value) in counters {
        if value < 0 {
            return Err(ValidationError::OutOfRange(name));
        }
    }
    if !state.total_play_time_seconds.is_finite() {
        return Err(ValidationError::NonFinite("total_play_time_seconds"));
    }
    if state.total_play_time_seconds < 0.0 {
        return Err(ValidationError::OutOfRange("total_play_time_seconds"));
    }
    if !state.prestige.global_multiplier.is_finite() {
        return Err(ValidationError::NonFinite("prestige.global_multiplier"));
    }
    Ok(())
}
