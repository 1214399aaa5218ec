//! Catch-up rewards for time spent away from the game.

use crate::events::{EventQueue, GameEvent};
use crate::points::PointEngine;
use crate::prestige;
use idle_core::{Catalog, GameConfig, PlayerState};
use tracing::info;

/// Mutable offline reward tuning, seeded from [`GameConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OfflineSettings {
    max_offline_hours: f64,
    efficiency: f64,
}

impl OfflineSettings {
    pub fn from_config(config: &GameConfig) -> Self {
        let mut settings = Self {
            max_offline_hours: 24.0,
            efficiency: 0.5,
        };
        settings.set_max_offline_hours(config.max_offline_hours);
        settings.set_offline_efficiency(config.offline_efficiency);
        settings
    }

    pub fn max_offline_hours(&self) -> f64 {
        self.max_offline_hours
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    /// Clamped to at least one hour.
    pub fn set_max_offline_hours(&mut self, hours: f64) {
        if hours.is_nan() {
            return;
        }
        self.max_offline_hours = hours.max(1.0);
    }

    /// Clamped to [0, 1].
    pub fn set_offline_efficiency(&mut self, efficiency: f64) {
        if efficiency.is_nan() {
            return;
        }
        self.efficiency = efficiency.clamp(0.0, 1.0);
    }
}

impl Default for OfflineSettings {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

/// Points `elapsed_secs` of absence would earn with the current rates.
pub fn calculate_offline_rewards(
    state: &PlayerState,
    catalog: &Catalog,
    settings: &OfflineSettings,
    elapsed_secs: f64,
) -> i64 {
    idle_econ::offline_reward(
        state.points_per_second,
        settings.efficiency,
        prestige::offline_bonus(state, catalog),
        elapsed_secs,
        settings.max_offline_hours,
    )
}

/// "45s", "12m", "3.5h" or "1.2d".
pub fn format_offline_time(seconds: f64) -> String {
    idle_econ::format_duration(seconds)
}

/// Mutating view that credits offline rewards.
pub struct OfflineRewardsEngine<'a> {
    state: &'a mut PlayerState,
    catalog: &'a Catalog,
    settings: &'a OfflineSettings,
    events: &'a mut EventQueue,
}

impl<'a> OfflineRewardsEngine<'a> {
    pub fn new(
        state: &'a mut PlayerState,
        catalog: &'a Catalog,
        settings: &'a OfflineSettings,
        events: &'a mut EventQueue,
    ) -> Self {
        Self {
            state,
            catalog,
            settings,
            events,
        }
    }

    /// Credit the reward for `elapsed_secs` offline and return it.
    pub fn calculate_and_apply_offline_rewards(&mut self, elapsed_secs: f64) -> i64 {
        let amount = calculate_offline_rewards(self.state, self.catalog, self.settings, elapsed_secs);
        if amount > 0 {
            PointEngine::new(self.state, self.catalog, self.events).add_points(amount);
            info!(
                amount,
                away = %format_offline_time(elapsed_secs),
                "offline rewards applied"
            );
            self.events.push(GameEvent::OfflineRewardsApplied {
                amount,
                seconds: elapsed_secs,
            });
        }
        amount
    }
}
