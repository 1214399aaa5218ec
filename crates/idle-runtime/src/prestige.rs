//! Prestige resets and the permanent upgrades bought with prestige points.

use crate::events::{EventQueue, GameEvent};
use crate::upgrades::UpgradeEngine;
use crate::{PrestigeError, PurchaseError};
use chrono::{DateTime, Utc};
use idle_core::{Catalog, GameConfig, PlayerState, PrestigeUpgradeDefinition, PrestigeUpgradeId};
use tracing::{debug, info, warn};

fn owned<'c>(
    state: &'c PlayerState,
    catalog: &'c Catalog,
) -> impl Iterator<Item = (&'c PrestigeUpgradeDefinition, u32)> + 'c {
    catalog
        .prestige_upgrades
        .iter()
        .map(move |def| (def, state.prestige_upgrade_level(&def.id)))
}

pub fn can_prestige(state: &PlayerState, config: &GameConfig) -> bool {
    state.current_points >= config.min_prestige_points
}

/// Prestige points a reset would earn now; 0 when not eligible.
pub fn calculate_prestige_points(state: &PlayerState, config: &GameConfig) -> i64 {
    if !can_prestige(state, config) {
        return 0;
    }
    idle_econ::prestige_gain(
        state.current_points,
        config.prestige_point_ratio,
        state.prestige.level,
        config.prestige_level_bonus,
    )
}

/// Price of the next level of `id`; `i64::MAX` when the id is unknown.
pub fn prestige_upgrade_cost(state: &PlayerState, catalog: &Catalog, id: &PrestigeUpgradeId) -> i64 {
    match catalog.prestige_upgrade(id) {
        Some(def) => idle_econ::prestige_upgrade_cost(def, state.prestige_upgrade_level(id)),
        None => {
            warn!(%id, "cost requested for unknown prestige upgrade");
            i64::MAX
        }
    }
}

pub fn can_afford_prestige_upgrade(
    state: &PlayerState,
    catalog: &Catalog,
    id: &PrestigeUpgradeId,
) -> bool {
    catalog.prestige_upgrade(id).is_some_and(|def| {
        let level = state.prestige_upgrade_level(id);
        level < u32::MAX
            && !idle_econ::at_max_level(def.max_level, level)
            && state.prestige.current_prestige_points
                >= idle_econ::prestige_upgrade_cost(def, level)
    })
}

/// Offline reward multiplier from owned OfflineBonus upgrades.
pub fn offline_bonus(state: &PlayerState, catalog: &Catalog) -> f64 {
    idle_econ::offline_bonus(owned(state, catalog))
}

/// Mutating view that performs resets and sells prestige upgrades.
pub struct PrestigeEngine<'a> {
    state: &'a mut PlayerState,
    catalog: &'a Catalog,
    config: &'a GameConfig,
    events: &'a mut EventQueue,
    now: DateTime<Utc>,
}

impl<'a> PrestigeEngine<'a> {
    pub fn new(
        state: &'a mut PlayerState,
        catalog: &'a Catalog,
        config: &'a GameConfig,
        events: &'a mut EventQueue,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            state,
            catalog,
            config,
            events,
            now,
        }
    }

    /// Emit [`GameEvent::PrestigeAvailabilityChanged`] if eligibility differs
    /// from `last`, updating it.
    pub fn refresh_availability(&mut self, last: &mut bool) {
        let now_available = can_prestige(self.state, self.config);
        if now_available != *last {
            *last = now_available;
            debug!(available = now_available, "prestige availability changed");
            self.events
                .push(GameEvent::PrestigeAvailabilityChanged(now_available));
        }
    }

    /// Reset the run in exchange for prestige points, returning the gain.
    pub fn perform_prestige(&mut self) -> Result<i64, PrestigeError> {
        if !can_prestige(self.state, self.config) {
            return Err(PrestigeError::NotEligible {
                points: self.state.current_points,
                required: self.config.min_prestige_points,
            });
        }
        let gain = calculate_prestige_points(self.state, self.config);

        let prestige = &mut self.state.prestige;
        prestige.level = prestige.level.saturating_add(1);
        prestige.total_prestige_points = prestige.total_prestige_points.saturating_add(gain);
        prestige.current_prestige_points = prestige.current_prestige_points.saturating_add(gain);
        prestige.last_prestige_time = Some(self.now);
        let level = prestige.level;

        self.state.current_points = 0;
        self.state.upgrade_levels.clear();

        let mut upgrades = UpgradeEngine::new(self.state, self.catalog, self.events);
        upgrades.recalculate_all_effects();
        self.recalculate_prestige_effects();

        info!(gain, level, "prestige performed");
        self.events.push(GameEvent::PrestigePerformed(gain));
        self.events.push(GameEvent::PrestigePointsChanged(
            self.state.prestige.current_prestige_points,
        ));
        Ok(gain)
    }

    /// Buy one level of a prestige upgrade, returning the new level.
    pub fn purchase_prestige_upgrade(&mut self, id: &PrestigeUpgradeId) -> Result<u32, PurchaseError> {
        let catalog = self.catalog;
        let Some(def) = catalog.prestige_upgrade(id) else {
            warn!(%id, "purchase of unknown prestige upgrade");
            return Err(PurchaseError::UnknownUpgrade(id.to_string()));
        };
        let level = self.state.prestige_upgrade_level(id);
        let new_level = match level.checked_add(1) {
            Some(next) if !idle_econ::at_max_level(def.max_level, level) => next,
            _ => return Err(PurchaseError::MaxLevelReached(id.to_string())),
        };
        let cost = idle_econ::prestige_upgrade_cost(def, level);
        let available = self.state.prestige.current_prestige_points;
        if available < cost {
            debug!(%id, cost, available, "prestige upgrade not affordable");
            return Err(PurchaseError::InsufficientPoints { cost, available });
        }

        self.state.prestige.current_prestige_points -= cost;
        self.state
            .prestige
            .upgrade_levels
            .insert(id.clone(), new_level);
        self.recalculate_prestige_effects();
        info!(%id, new_level, cost, "prestige upgrade purchased");
        self.events.push(GameEvent::PrestigePointsChanged(
            self.state.prestige.current_prestige_points,
        ));
        Ok(new_level)
    }

    /// Recompute the global multiplier from owned GlobalMultiplier upgrades.
    pub fn recalculate_prestige_effects(&mut self) {
        let multiplier = idle_econ::global_multiplier(owned(self.state, self.catalog));
        self.state.prestige.global_multiplier = multiplier;
        debug!(multiplier, "prestige effects recalculated");
    }
}
