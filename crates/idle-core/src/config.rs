//! Tunable runtime parameters.

use crate::{ValidationError, MIN_PRESTIGE_POINTS, PRESTIGE_POINT_RATIO};
use serde::{Deserialize, Serialize};

/// Game configuration. Every field has a default so partial YAML works.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seconds between external ticks (play-time accounting).
    pub tick_interval_secs: f64,
    /// Seconds between autosaves.
    pub autosave_interval_secs: f64,
    /// Cap on rewarded offline time.
    pub max_offline_hours: f64,
    /// Fraction of idle production granted while offline, in [0,1].
    pub offline_efficiency: f64,
    /// Minimum balance required to prestige.
    pub min_prestige_points: i64,
    /// Prestige points per point held.
    pub prestige_point_ratio: f64,
    /// Extra prestige gain per prestige level already reached.
    pub prestige_level_bonus: f64,
    /// Storage key of the save blob.
    pub save_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1.0,
            autosave_interval_secs: 5.0,
            max_offline_hours: 24.0,
            offline_efficiency: 0.5,
            min_prestige_points: MIN_PRESTIGE_POINTS,
            prestige_point_ratio: PRESTIGE_POINT_RATIO,
            prestige_level_bonus: 0.1,
            save_key: "point_generator_save".to_string(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a YAML config document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ValidationError> {
        let cfg: GameConfig =
            serde_yaml::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        validate_config(&cfg)?;
        Ok(cfg)
    }
}

/// Validate configuration ranges.
pub fn validate_config(cfg: &GameConfig) -> Result<(), ValidationError> {
    let floats = [
        ("tick_interval_secs", cfg.tick_interval_secs),
        ("autosave_interval_secs", cfg.autosave_interval_secs),
        ("max_offline_hours", cfg.max_offline_hours),
        ("offline_efficiency", cfg.offline_efficiency),
        ("prestige_point_ratio", cfg.prestige_point_ratio),
        ("prestige_level_bonus", cfg.prestige_level_bonus),
    ];
    for (name, v) in floats {
        if !v.is_finite() {
            return Err(ValidationError::NonFinite(name));
        }
        if v < 0.0 {
            return Err(ValidationError::OutOfRange(name));
        }
    }
    if cfg.tick_interval_secs <= 0.0 {
        return Err(ValidationError::OutOfRange("tick_interval_secs"));
    }
    if cfg.offline_efficiency > 1.0 {
        return Err(ValidationError::OutOfRange("offline_efficiency"));
    }
    if cfg.min_prestige_points < 0 {
        return Err(ValidationError::OutOfRange("min_prestige_points"));
    }
    if cfg.save_key.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GameConfig::default();
        validate_config(&cfg).unwrap();
        assert_eq!(cfg.autosave_interval_secs, 5.0);
        assert_eq!(cfg.min_prestige_points, 1_000_000);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = GameConfig::from_yaml_str("autosave_interval_secs: 30\n").unwrap();
        assert_eq!(cfg.autosave_interval_secs, 30.0);
        assert_eq!(cfg.max_offline_hours, 24.0);
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            GameConfig::from_yaml_str("offline_efficiency: 1.5\n"),
            Err(ValidationError::OutOfRange("offline_efficiency"))
        );
        assert_eq!(
            GameConfig::from_yaml_str("tick_interval_secs: 0\n"),
            Err(ValidationError::OutOfRange("tick_interval_secs"))
        );
        assert_eq!(
            GameConfig::from_yaml_str("save_key: ' '\n"),
            Err(ValidationError::EmptyId)
        );
    }

    #[test]
    fn shipped_asset_is_valid() {
        let text = include_str!("../../../assets/game.yaml");
        assert_eq!(GameConfig::from_yaml_str(text).unwrap(), GameConfig::default());
    }
}
