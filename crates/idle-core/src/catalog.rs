//! Static game definitions supplied once at startup.

use crate::{
    validate_catalog, AchievementDefinition, AchievementId, AchievementKind,
    PrestigeUpgradeDefinition, PrestigeUpgradeId, PrestigeUpgradeKind, TextKey,
    UpgradeDefinition, UpgradeId, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Read-only collections of every definition the engines reference by id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub upgrades: Vec<UpgradeDefinition>,
    #[serde(default)]
    pub achievements: Vec<AchievementDefinition>,
    #[serde(default)]
    pub prestige_upgrades: Vec<PrestigeUpgradeDefinition>,
}

impl Catalog {
    pub fn upgrade(&self, id: &UpgradeId) -> Option<&UpgradeDefinition> {
        self.upgrades.iter().find(|u| &u.id == id)
    }

    pub fn achievement(&self, id: &AchievementId) -> Option<&AchievementDefinition> {
        self.achievements.iter().find(|a| &a.id == id)
    }

    pub fn prestige_upgrade(&self, id: &PrestigeUpgradeId) -> Option<&PrestigeUpgradeDefinition> {
        self.prestige_upgrades.iter().find(|p| &p.id == id)
    }

    /// Parse and validate a YAML catalog document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ValidationError> {
        let catalog: Catalog =
            serde_yaml::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        validate_catalog(&catalog)?;
        debug!(
            upgrades = catalog.upgrades.len(),
            achievements = catalog.achievements.len(),
            prestige_upgrades = catalog.prestige_upgrades.len(),
            "catalog parsed"
        );
        Ok(catalog)
    }

    /// Parse and validate a JSON catalog document.
    pub fn from_json_str(text: &str) -> Result<Self, ValidationError> {
        let catalog: Catalog =
            serde_json::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        validate_catalog(&catalog)?;
        Ok(catalog)
    }

    /// Load a catalog file, choosing the format from its extension
    /// (`.json`, anything else is read as YAML).
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::Malformed(format!("{}: {e}", path.display())))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    /// The stock catalog shipped with the game.
    pub fn builtin() -> Self {
        Self {
            upgrades: builtin_upgrades(),
            achievements: builtin_achievements(),
            prestige_upgrades: builtin_prestige_upgrades(),
        }
    }
}

fn text(prefix: &str, id: &str, field: &str) -> TextKey {
    TextKey::new(format!("{prefix}.{id}.{field}"))
}

fn upgrade(
    id: &str,
    base_cost: i64,
    per_click: i64,
    per_second: i64,
    max_level: u32,
) -> UpgradeDefinition {
    UpgradeDefinition {
        id: UpgradeId::new(id),
        name: text("upgrade", id, "name"),
        description: text("upgrade", id, "description"),
        base_cost,
        cost_multiplier: crate::DEFAULT_COST_MULTIPLIER,
        per_click_effect: per_click,
        per_second_effect: per_second,
        max_level,
    }
}

fn builtin_upgrades() -> Vec<UpgradeDefinition> {
    vec![
        upgrade("stronger_finger", 10, 1, 0, 0),
        upgrade("auto_tapper", 50, 0, 1, 0),
        upgrade("steel_gloves", 500, 5, 0, 100),
        upgrade("point_farm", 1_100, 0, 8, 0),
        upgrade("point_factory", 12_000, 0, 47, 0),
        upgrade("quantum_click", 130_000, 50, 0, 50),
    ]
}

fn achievement(
    id: &str,
    kind: AchievementKind,
    target: i64,
    reward_points: i64,
    reward_click_bonus: i64,
    reward_idle_bonus: i64,
    hidden: bool,
) -> AchievementDefinition {
    AchievementDefinition {
        id: AchievementId::new(id),
        name: text("achievement", id, "name"),
        description: text("achievement", id, "description"),
        kind,
        target_value: target,
        reward_points,
        reward_click_bonus,
        reward_idle_bonus,
        hidden,
    }
}

fn builtin_achievements() -> Vec<AchievementDefinition> {
    use AchievementKind::*;
    vec![
        achievement("first_point", TotalPoints, 1, 10, 1, 0, false),
        achievement("hundred_points", TotalPoints, 100, 50, 2, 0, false),
        achievement("thousand_points", TotalPoints, 1_000, 200, 5, 1, false),
        achievement("million_points", TotalPoints, 1_000_000, 5_000, 50, 10, false),
        achievement("first_click", TotalClicks, 1, 5, 1, 0, false),
        achievement("hundred_clicks", TotalClicks, 100, 100, 3, 0, false),
        achievement("thousand_clicks", TotalClicks, 1_000, 500, 10, 2, false),
        achievement("first_upgrade", UpgradeCount, 1, 25, 2, 1, false),
        achievement("ten_upgrades", UpgradeCount, 10, 1_000, 20, 5, false),
        achievement("auto_generation", PointsPerSecond, 1, 50, 0, 2, false),
        achievement("idle_master", PointsPerSecond, 100, 2_000, 0, 20, false),
        achievement("power_click", PointsPerClick, 10, 200, 5, 0, false),
        achievement("mega_click", PointsPerClick, 100, 1_000, 25, 0, false),
        achievement("secret_achievement", TotalPoints, 999_999, 10_000, 100, 50, true),
    ]
}

fn prestige_upgrade(
    id: &str,
    kind: PrestigeUpgradeKind,
    base_cost: i64,
    cost_multiplier: f64,
    base_effect_value: f64,
    max_level: u32,
) -> PrestigeUpgradeDefinition {
    PrestigeUpgradeDefinition {
        id: PrestigeUpgradeId::new(id),
        name: text("prestige", id, "name"),
        description: text("prestige", id, "description"),
        base_cost,
        cost_multiplier,
        base_effect_value,
        effect_increment_per_level: 0.0,
        kind,
        max_level,
    }
}

fn builtin_prestige_upgrades() -> Vec<PrestigeUpgradeDefinition> {
    use PrestigeUpgradeKind::*;
    vec![
        prestige_upgrade("global_multiplier", GlobalMultiplier, 1, 2.0, 0.1, 50),
        prestige_upgrade("click_multiplier", ClickMultiplier, 2, 2.5, 0.2, 25),
        prestige_upgrade("idle_multiplier", IdleMultiplier, 3, 2.2, 0.15, 30),
        prestige_upgrade("upgrade_discount", UpgradeDiscount, 5, 3.0, 0.05, 20),
        prestige_upgrade("offline_bonus", OfflineBonus, 4, 2.5, 0.25, 10),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
upgrades:
  - id: cursor
    name: upgrade.cursor.name
    description: upgrade.cursor.description
    base_cost: 15
    per_second_effect: 1
achievements:
  - id: first_click
    name: a.name
    description: a.desc
    kind: TotalClicks
    target_value: 1
    reward_points: 5
prestige_upgrades:
  - id: offline_bonus
    name: p.name
    description: p.desc
    base_cost: 4
    cost_multiplier: 2.5
    base_effect_value: 0.25
    kind: OfflineBonus
    max_level: 10
"#;

    #[test]
    fn yaml_catalog_parses_with_defaults() {
        let c = Catalog::from_yaml_str(YAML).unwrap();
        let cursor = c.upgrade(&UpgradeId::new("cursor")).unwrap();
        assert_eq!(cursor.cost_multiplier, crate::DEFAULT_COST_MULTIPLIER);
        assert_eq!(cursor.per_click_effect, 0);
        assert_eq!(
            c.achievement(&AchievementId::new("first_click")).unwrap().kind,
            AchievementKind::TotalClicks
        );
        assert!(c
            .prestige_upgrade(&PrestigeUpgradeId::new("offline_bonus"))
            .is_some());
        assert!(c.upgrade(&UpgradeId::new("nope")).is_none());
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let err = Catalog::from_yaml_str("upgrades: [ {id: 3").unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn json_roundtrip_of_builtin() {
        let c = Catalog::builtin();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(Catalog::from_json_str(&json).unwrap(), c);
    }

    #[test]
    fn shipped_asset_matches_schema() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/catalog.yaml");
        let c = Catalog::from_path(&path).unwrap();
        assert!(!c.upgrades.is_empty());
        assert!(!c.achievements.is_empty());
        assert!(!c.prestige_upgrades.is_empty());
        assert_eq!(c, Catalog::builtin());
    }
}
