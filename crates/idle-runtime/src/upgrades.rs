//! Production upgrade shop.

use crate::events::{EventQueue, GameEvent};
use crate::points::PointEngine;
use crate::PurchaseError;
use idle_core::{Catalog, PlayerState, UpgradeDefinition, UpgradeId};
use tracing::{debug, warn};

/// Price of the next level of `id`; `i64::MAX` when the id is unknown.
pub fn current_cost(state: &PlayerState, catalog: &Catalog, id: &UpgradeId) -> i64 {
    match catalog.upgrade(id) {
        Some(def) => idle_econ::upgrade_cost(def, state.upgrade_level(id)),
        None => {
            warn!(%id, "cost requested for unknown upgrade");
            i64::MAX
        }
    }
}

pub fn total_invested_cost(state: &PlayerState, catalog: &Catalog, id: &UpgradeId) -> i64 {
    catalog
        .upgrade(id)
        .map(|def| idle_econ::total_invested_cost(def, state.upgrade_level(id)))
        .unwrap_or(0)
}

fn purchasable(state: &PlayerState, def: &UpgradeDefinition) -> bool {
    let level = state.upgrade_level(&def.id);
    level < u32::MAX
        && !idle_econ::at_max_level(def.max_level, level)
        && state.current_points >= idle_econ::upgrade_cost(def, level)
}

/// Whether the next level of `id` exists and is affordable.
pub fn can_purchase(state: &PlayerState, catalog: &Catalog, id: &UpgradeId) -> bool {
    catalog
        .upgrade(id)
        .map(|def| purchasable(state, def))
        .unwrap_or(false)
}

/// Catalog upgrades whose next level the player can buy right now.
pub fn affordable_upgrades<'c>(state: &PlayerState, catalog: &'c Catalog) -> Vec<&'c UpgradeDefinition> {
    catalog
        .upgrades
        .iter()
        .filter(|def| purchasable(state, def))
        .collect()
}

/// Mutating view used to buy production upgrades.
pub struct UpgradeEngine<'a> {
    state: &'a mut PlayerState,
    catalog: &'a Catalog,
    events: &'a mut EventQueue,
}

impl<'a> UpgradeEngine<'a> {
    pub fn new(state: &'a mut PlayerState, catalog: &'a Catalog, events: &'a mut EventQueue) -> Self {
        Self {
            state,
            catalog,
            events,
        }
    }

    fn points(&mut self) -> PointEngine<'_> {
        PointEngine::new(self.state, self.catalog, self.events)
    }

    /// Buy one level of `id`, returning the new level.
    pub fn purchase(&mut self, id: &UpgradeId) -> Result<u32, PurchaseError> {
        let result = self.try_purchase(id);
        if let Err(reason) = &result {
            debug!(%id, %reason, "upgrade purchase failed");
            self.events.push(GameEvent::UpgradePurchaseFailed {
                id: id.clone(),
                reason: reason.clone(),
            });
        }
        result
    }

    fn try_purchase(&mut self, id: &UpgradeId) -> Result<u32, PurchaseError> {
        let catalog = self.catalog;
        let Some(def) = catalog.upgrade(id) else {
            warn!(%id, "purchase of unknown upgrade");
            return Err(PurchaseError::UnknownUpgrade(id.to_string()));
        };
        let level = self.state.upgrade_level(id);
        let new_level = match level.checked_add(1) {
            Some(next) if !idle_econ::at_max_level(def.max_level, level) => next,
            _ => return Err(PurchaseError::MaxLevelReached(id.to_string())),
        };
        let cost = idle_econ::upgrade_cost(def, level);
        if !self.points().spend_points(cost) {
            return Err(PurchaseError::InsufficientPoints {
                cost,
                available: self.state.current_points,
            });
        }

        self.state.upgrade_levels.insert(id.clone(), new_level);
        self.state.total_upgrades_purchased = self.state.total_upgrades_purchased.saturating_add(1);
        let mut points = self.points();
        points.increase_points_per_click(def.per_click_effect);
        points.increase_points_per_second(def.per_second_effect);
        debug!(%id, new_level, cost, "upgrade purchased");
        self.events.push(GameEvent::UpgradePurchased {
            id: id.clone(),
            new_level,
        });
        Ok(new_level)
    }

    pub fn recalculate_all_effects(&mut self) {
        self.points().recalculate_stats();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> UpgradeId {
        UpgradeId::new(s)
    }

    fn fixture(points: i64) -> (PlayerState, Catalog, EventQueue) {
        let mut s = PlayerState::default();
        s.current_points = points;
        (s, Catalog::builtin(), EventQueue::new())
    }

    #[test]
    fn purchase_applies_effect_and_counts() {
        let (mut s, c, mut q) = fixture(100);
        let lvl = UpgradeEngine::new(&mut s, &c, &mut q)
            .purchase(&id("stronger_finger"))
            .unwrap();
        assert_eq!(lvl, 1);
        assert_eq!(s.current_points, 90);
        assert_eq!(s.points_per_click, 2);
        assert_eq!(s.total_upgrades_purchased, 1);
        assert_eq!(
            q.drain(),
            vec![
                GameEvent::PointsChanged(90),
                GameEvent::PointsPerClickChanged(2),
                GameEvent::UpgradePurchased {
                    id: id("stronger_finger"),
                    new_level: 1
                },
            ]
        );
        assert_eq!(current_cost(&s, &c, &id("stronger_finger")), 12);
        assert_eq!(total_invested_cost(&s, &c, &id("stronger_finger")), 10);
    }

    #[test]
    fn insufficient_points_leaves_state_untouched() {
        let (mut s, c, mut q) = fixture(9);
        let before = s.clone();
        let err = UpgradeEngine::new(&mut s, &c, &mut q)
            .purchase(&id("stronger_finger"))
            .unwrap_err();
        assert_eq!(
            err,
            PurchaseError::InsufficientPoints {
                cost: 10,
                available: 9
            }
        );
        assert_eq!(s, before);
        assert!(matches!(
            q.drain().as_slice(),
            [GameEvent::UpgradePurchaseFailed { .. }]
        ));
    }

    #[test]
    fn unknown_upgrade_fails_closed() {
        let (mut s, c, mut q) = fixture(1_000);
        assert_eq!(current_cost(&s, &c, &id("nope")), i64::MAX);
        assert!(!can_purchase(&s, &c, &id("nope")));
        let err = UpgradeEngine::new(&mut s, &c, &mut q)
            .purchase(&id("nope"))
            .unwrap_err();
        assert_eq!(err, PurchaseError::UnknownUpgrade("nope".into()));
        assert_eq!(s.current_points, 1_000);
    }

    #[test]
    fn max_level_is_enforced() {
        let (mut s, c, mut q) = fixture(i64::MAX / 2);
        s.upgrade_levels.insert(id("steel_gloves"), 100);
        assert!(!can_purchase(&s, &c, &id("steel_gloves")));
        let err = UpgradeEngine::new(&mut s, &c, &mut q)
            .purchase(&id("steel_gloves"))
            .unwrap_err();
        assert_eq!(err, PurchaseError::MaxLevelReached("steel_gloves".into()));
        assert_eq!(s.upgrade_level(&id("steel_gloves")), 100);
    }

    #[test]
    fn saturated_level_counts_as_maxed() {
        let (mut s, c, mut q) = fixture(i64::MAX);
        s.upgrade_levels.insert(id("stronger_finger"), u32::MAX);
        let err = UpgradeEngine::new(&mut s, &c, &mut q)
            .purchase(&id("stronger_finger"))
            .unwrap_err();
        assert_eq!(err, PurchaseError::MaxLevelReached("stronger_finger".into()));
        assert!(!can_purchase(&s, &c, &id("stronger_finger")));
        assert_eq!(s.current_points, i64::MAX);
        assert_eq!(s.upgrade_level(&id("stronger_finger")), u32::MAX);
    }

    #[test]
    fn affordable_lists_only_buyable() {
        let (s, c, _) = fixture(60);
        let ids: Vec<_> = affordable_upgrades(&s, &c)
            .into_iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["stronger_finger", "auto_tapper"]);
    }

    #[test]
    fn recalculate_drops_incremental_bonuses() {
        let (mut s, c, mut q) = fixture(0);
        s.upgrade_levels.insert(id("auto_tapper"), 4);
        s.points_per_second = 50;
        UpgradeEngine::new(&mut s, &c, &mut q).recalculate_all_effects();
        assert_eq!(s.points_per_second, 4);
    }
}
