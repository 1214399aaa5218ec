//! Point balance and production rates.

use crate::events::{EventQueue, GameEvent};
use idle_core::{Catalog, PlayerState, INITIAL_POINTS_PER_CLICK, INITIAL_POINTS_PER_SECOND};
use tracing::debug;

/// Mutating view over the balance and rates of a [`PlayerState`].
pub struct PointEngine<'a> {
    state: &'a mut PlayerState,
    catalog: &'a Catalog,
    events: &'a mut EventQueue,
}

impl<'a> PointEngine<'a> {
    pub fn new(state: &'a mut PlayerState, catalog: &'a Catalog, events: &'a mut EventQueue) -> Self {
        Self {
            state,
            catalog,
            events,
        }
    }

    pub fn current_points(&self) -> i64 {
        self.state.current_points
    }

    /// Credit `amount` points. Non-positive amounts are ignored.
    pub fn add_points(&mut self, amount: i64) {
        if amount <= 0 {
            return;
        }
        self.state.current_points = self.state.current_points.saturating_add(amount);
        self.events
            .push(GameEvent::PointsChanged(self.state.current_points));
    }

    /// Debit `amount` points if the balance covers it.
    pub fn spend_points(&mut self, amount: i64) -> bool {
        if amount <= 0 || self.state.current_points < amount {
            return false;
        }
        self.state.current_points -= amount;
        self.events
            .push(GameEvent::PointsChanged(self.state.current_points));
        true
    }

    pub fn increase_points_per_click(&mut self, amount: i64) {
        if amount <= 0 {
            return;
        }
        self.state.points_per_click = self.state.points_per_click.saturating_add(amount);
        self.events
            .push(GameEvent::PointsPerClickChanged(self.state.points_per_click));
    }

    pub fn increase_points_per_second(&mut self, amount: i64) {
        if amount <= 0 {
            return;
        }
        self.state.points_per_second = self.state.points_per_second.saturating_add(amount);
        self.events
            .push(GameEvent::PointsPerSecondChanged(self.state.points_per_second));
    }

    pub fn perform_click(&mut self) {
        self.state.total_clicks = self.state.total_clicks.saturating_add(1);
        let gain = self.state.points_per_click;
        self.add_points(gain);
        self.events.push(GameEvent::Clicked);
    }

    /// Idle production for `dt_secs` seconds; also accrues play time.
    pub fn tick(&mut self, dt_secs: f64) {
        if !dt_secs.is_finite() || dt_secs <= 0.0 {
            return;
        }
        self.state.total_play_time_seconds += dt_secs;
        let gain = (self.state.points_per_second as f64 * dt_secs).floor();
        if gain >= i64::MAX as f64 {
            self.add_points(i64::MAX);
        } else {
            self.add_points(gain as i64);
        }
    }

    /// Rebuild both rates from the baseline plus owned upgrade levels.
    pub fn recalculate_stats(&mut self) {
        let mut per_click = INITIAL_POINTS_PER_CLICK;
        let mut per_second = INITIAL_POINTS_PER_SECOND;
        for def in &self.catalog.upgrades {
            let level = i64::from(self.state.upgrade_level(&def.id));
            if level == 0 {
                continue;
            }
            per_click = per_click.saturating_add(level.saturating_mul(def.per_click_effect));
            per_second = per_second.saturating_add(level.saturating_mul(def.per_second_effect));
        }
        self.state.points_per_click = per_click;
        self.state.points_per_second = per_second;
        debug!(per_click, per_second, "stats recalculated");
        self.events.push(GameEvent::PointsPerClickChanged(per_click));
        self.events.push(GameEvent::PointsPerSecondChanged(per_second));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idle_core::UpgradeId;
    use proptest::prelude::*;

    fn fixture() -> (PlayerState, Catalog, EventQueue) {
        (PlayerState::default(), Catalog::builtin(), EventQueue::new())
    }

    #[test]
    fn click_adds_rate_and_counts() {
        let (mut s, c, mut q) = fixture();
        let mut e = PointEngine::new(&mut s, &c, &mut q);
        e.perform_click();
        e.perform_click();
        assert_eq!(e.current_points(), 2);
        assert_eq!(s.total_clicks, 2);
        assert_eq!(
            q.drain(),
            vec![
                GameEvent::PointsChanged(1),
                GameEvent::Clicked,
                GameEvent::PointsChanged(2),
                GameEvent::Clicked,
            ]
        );
    }

    #[test]
    fn spend_fails_without_funds() {
        let (mut s, c, mut q) = fixture();
        s.current_points = 5;
        let mut e = PointEngine::new(&mut s, &c, &mut q);
        assert!(!e.spend_points(6));
        assert!(!e.spend_points(0));
        assert!(e.spend_points(5));
        assert_eq!(s.current_points, 0);
        assert_eq!(q.drain(), vec![GameEvent::PointsChanged(0)]);
    }

    #[test]
    fn non_positive_amounts_are_ignored() {
        let (mut s, c, mut q) = fixture();
        let mut e = PointEngine::new(&mut s, &c, &mut q);
        e.add_points(0);
        e.add_points(-3);
        e.increase_points_per_click(-1);
        e.increase_points_per_second(0);
        assert!(q.is_empty());
        assert_eq!(s.current_points, 0);
        assert_eq!(s.points_per_click, 1);
    }

    #[test]
    fn addition_saturates() {
        let (mut s, c, mut q) = fixture();
        s.current_points = i64::MAX - 1;
        PointEngine::new(&mut s, &c, &mut q).add_points(10);
        assert_eq!(s.current_points, i64::MAX);
    }

    #[test]
    fn tick_adds_idle_points_and_play_time() {
        let (mut s, c, mut q) = fixture();
        s.points_per_second = 3;
        let mut e = PointEngine::new(&mut s, &c, &mut q);
        e.tick(1.0);
        e.tick(2.0);
        assert_eq!(s.current_points, 9);
        assert_eq!(s.total_play_time_seconds, 3.0);
    }

    #[test]
    fn tick_without_production_is_silent() {
        let (mut s, c, mut q) = fixture();
        PointEngine::new(&mut s, &c, &mut q).tick(1.0);
        assert!(q.is_empty());
        assert_eq!(s.total_play_time_seconds, 1.0);
    }

    #[test]
    fn recalculate_from_levels() {
        let (mut s, c, mut q) = fixture();
        s.upgrade_levels.insert(UpgradeId::new("stronger_finger"), 3);
        s.upgrade_levels.insert(UpgradeId::new("auto_tapper"), 2);
        s.upgrade_levels.insert(UpgradeId::new("no_longer_sold"), 9);
        s.points_per_click = 999;
        PointEngine::new(&mut s, &c, &mut q).recalculate_stats();
        assert_eq!(s.points_per_click, 4);
        assert_eq!(s.points_per_second, 2);
    }

    proptest! {
        #[test]
        fn recalculate_is_idempotent(a in 0u32..200, b in 0u32..200, junk in 0i64..1_000) {
            let (mut s, c, mut q) = fixture();
            s.upgrade_levels.insert(UpgradeId::new("steel_gloves"), a);
            s.upgrade_levels.insert(UpgradeId::new("point_farm"), b);
            s.points_per_second = junk;
            PointEngine::new(&mut s, &c, &mut q).recalculate_stats();
            let once = (s.points_per_click, s.points_per_second);
            PointEngine::new(&mut s, &c, &mut q).recalculate_stats();
            prop_assert_eq!(once, (s.points_per_click, s.points_per_second));
            prop_assert_eq!(once, (1 + 5 * i64::from(a), 8 * i64::from(b)));
        }

        #[test]
        fn balance_never_negative(ops in proptest::collection::vec((any::<bool>(), 1i64..1_000), 0..60)) {
            let (mut s, c, mut q) = fixture();
            let mut e = PointEngine::new(&mut s, &c, &mut q);
            for (add, n) in ops {
                if add { e.add_points(n) } else { let _ = e.spend_points(n); }
                prop_assert!(e.current_points() >= 0);
            }
        }
    }
}
