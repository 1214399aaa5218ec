//! Achievement progress tracking and reward payout.

use crate::events::{EventQueue, GameEvent};
use crate::points::PointEngine;
use chrono::{DateTime, Utc};
use idle_core::{
    AchievementDefinition, AchievementId, AchievementKind, AchievementProgress, Catalog,
    PlayerState,
};
use tracing::{info, warn};

pub fn is_unlocked(state: &PlayerState, id: &AchievementId) -> bool {
    state.is_achievement_unlocked(id)
}

/// Unlocked achievements that still exist in the catalog.
pub fn unlocked_count(state: &PlayerState, catalog: &Catalog) -> usize {
    catalog
        .achievements
        .iter()
        .filter(|a| state.is_achievement_unlocked(&a.id))
        .count()
}

pub fn total_count(catalog: &Catalog) -> usize {
    catalog.achievements.len()
}

/// Definitions the player may see: everything except hidden, locked ones.
pub fn visible_definitions<'c>(
    state: &PlayerState,
    catalog: &'c Catalog,
) -> Vec<&'c AchievementDefinition> {
    catalog
        .achievements
        .iter()
        .filter(|a| !a.hidden || state.is_achievement_unlocked(&a.id))
        .collect()
}

pub fn user_achievement<'s>(
    state: &'s PlayerState,
    id: &AchievementId,
) -> Option<&'s AchievementProgress> {
    state.achievement_progress.get(id)
}

/// Mutating view that records progress and unlocks achievements.
pub struct AchievementEngine<'a> {
    state: &'a mut PlayerState,
    catalog: &'a Catalog,
    events: &'a mut EventQueue,
    now: DateTime<Utc>,
}

impl<'a> AchievementEngine<'a> {
    pub fn new(
        state: &'a mut PlayerState,
        catalog: &'a Catalog,
        events: &'a mut EventQueue,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            state,
            catalog,
            events,
            now,
        }
    }

    pub fn all_definitions(&self) -> &'a [AchievementDefinition] {
        &self.catalog.achievements
    }

    /// Make sure every catalog achievement has a progress entry. Entries of
    /// definitions no longer in the catalog are left alone.
    pub fn sync_entries(&mut self) {
        for def in &self.catalog.achievements {
            self.state
                .achievement_progress
                .entry(def.id.clone())
                .or_default();
        }
    }

    /// Record `value` as the progress of every locked achievement of `kind`,
    /// unlocking those whose target it reaches.
    pub fn update_progress(&mut self, kind: AchievementKind, value: i64) {
        let catalog = self.catalog;
        for def in catalog.achievements.iter().filter(|a| a.kind == kind) {
            let entry = self
                .state
                .achievement_progress
                .entry(def.id.clone())
                .or_default();
            if entry.unlocked {
                continue;
            }
            entry.progress = value;
            self.events.push(GameEvent::AchievementProgressChanged {
                id: def.id.clone(),
                current: value,
                target: def.target_value,
            });
            if value >= def.target_value {
                self.unlock(&def.id);
            }
        }
    }

    /// Unlock `id` and pay out its rewards. Already-unlocked and unknown ids
    /// are no-ops.
    pub fn unlock(&mut self, id: &AchievementId) {
        let catalog = self.catalog;
        let Some(def) = catalog.achievement(id) else {
            warn!(%id, "unlock requested for unknown achievement");
            return;
        };
        let entry = self
            .state
            .achievement_progress
            .entry(id.clone())
            .or_default();
        if entry.unlocked {
            return;
        }
        entry.unlocked = true;
        entry.unlocked_at = Some(self.now);
        info!(%id, "achievement unlocked");

        let mut points = PointEngine::new(self.state, self.catalog, self.events);
        points.add_points(def.reward_points);
        points.increase_points_per_click(def.reward_click_bonus);
        points.increase_points_per_second(def.reward_idle_bonus);
        self.events.push(GameEvent::AchievementUnlocked(def.clone()));
    }
}
