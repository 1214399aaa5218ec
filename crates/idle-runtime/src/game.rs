//! Composition root: owns the player state, wires the engines together and
//! drives lifecycle, persistence and event delivery.

use crate::achievements::{self, AchievementEngine};
use crate::events::{EventQueue, GameEvent};
use crate::offline::{self, OfflineRewardsEngine, OfflineSettings};
use crate::points::PointEngine;
use crate::prestige::{self, PrestigeEngine};
use crate::upgrades::{self, UpgradeEngine};
use crate::{PrestigeError, PurchaseError, SetupError};
use idle_core::config::validate_config;
use idle_core::{
    validate_catalog, AchievementDefinition, AchievementId, AchievementKind, AchievementProgress,
    Catalog, Clock, GameConfig, PlayerState, PrestigeUpgradeId, SystemClock, UpgradeDefinition,
    UpgradeId,
};
use persistence::{PersistenceGateway, SaveStore};
use tracing::{debug, info};

/// Handle returned by [`Game::subscribe`].
pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&GameEvent)>;

/// Collects the collaborators of a [`Game`] and validates them once.
pub struct GameBuilder {
    catalog: Option<Catalog>,
    config: GameConfig,
    store: Option<Box<dyn SaveStore>>,
    clock: Box<dyn Clock>,
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self {
            catalog: None,
            config: GameConfig::default(),
            store: None,
            clock: Box::new(SystemClock),
        }
    }
}

impl GameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store<S: SaveStore + 'static>(mut self, store: S) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn build(self) -> Result<Game, SetupError> {
        let GameBuilder {
            catalog,
            config,
            store,
            clock,
        } = self;
        let catalog = catalog.ok_or(SetupError::MissingCatalog)?;
        let store = store.ok_or(SetupError::MissingStore)?;
        validate_catalog(&catalog).map_err(SetupError::InvalidCatalog)?;
        validate_config(&config).map_err(SetupError::InvalidConfig)?;

        let gateway = PersistenceGateway::new(store, config.save_key.clone())
            .with_autosave_interval(config.autosave_interval_secs);
        let state = PlayerState::fresh(clock.now());
        debug!(
            upgrades = catalog.upgrades.len(),
            achievements = catalog.achievements.len(),
            prestige_upgrades = catalog.prestige_upgrades.len(),
            "game assembled"
        );
        Ok(Game {
            offline: OfflineSettings::from_config(&config),
            catalog,
            config,
            clock,
            gateway,
            state,
            events: EventQueue::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
            started: false,
            paused: false,
            prestige_available: false,
        })
    }
}

/// A running game session.
pub struct Game {
    catalog: Catalog,
    config: GameConfig,
    offline: OfflineSettings,
    clock: Box<dyn Clock>,
    gateway: PersistenceGateway<Box<dyn SaveStore>>,
    state: PlayerState,
    events: EventQueue,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
    started: bool,
    paused: bool,
    prestige_available: bool,
}

impl Game {
    pub fn builder() -> GameBuilder {
        GameBuilder::new()
    }

    fn points(&mut self) -> PointEngine<'_> {
        PointEngine::new(&mut self.state, &self.catalog, &mut self.events)
    }

    fn upgrades(&mut self) -> UpgradeEngine<'_> {
        UpgradeEngine::new(&mut self.state, &self.catalog, &mut self.events)
    }

    fn achievements(&mut self) -> AchievementEngine<'_> {
        let now = self.clock.now();
        AchievementEngine::new(&mut self.state, &self.catalog, &mut self.events, now)
    }

    fn prestige(&mut self) -> PrestigeEngine<'_> {
        let now = self.clock.now();
        PrestigeEngine::new(
            &mut self.state,
            &self.catalog,
            &self.config,
            &mut self.events,
            now,
        )
    }

    fn offline_rewards(&mut self) -> OfflineRewardsEngine<'_> {
        OfflineRewardsEngine::new(
            &mut self.state,
            &self.catalog,
            &self.offline,
            &mut self.events,
        )
    }

    // ---- lifecycle ----

    /// Load the save (crediting offline time) or begin a new game, then
    /// publish the initial rates and balance.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        let now = self.clock.now();
        let restored = match self.gateway.load(now) {
            Some(loaded) => {
                self.state = loaded.state;
                if loaded.offline_seconds >= idle_econ::MIN_OFFLINE_SECONDS {
                    self.offline_rewards()
                        .calculate_and_apply_offline_rewards(loaded.offline_seconds);
                }
                true
            }
            None => {
                self.state = PlayerState::fresh(now);
                false
            }
        };
        self.prepare_state();
        if restored {
            self.events
                .push(GameEvent::LoadCompleted(Box::new(self.state.clone())));
        }
        self.started = true;
        self.paused = false;
        info!(
            points = self.state.current_points,
            prestige_level = self.state.prestige.level,
            "game started"
        );
        self.dispatch();
    }

    fn prepare_state(&mut self) {
        self.achievements().sync_entries();
        self.upgrades().recalculate_all_effects();
        self.prestige().recalculate_prestige_effects();
        self.events
            .push(GameEvent::PointsChanged(self.state.current_points));
    }

    /// Stop idle production and autosave, saving once.
    pub fn pause(&mut self) {
        if !self.started || self.paused {
            return;
        }
        self.paused = true;
        self.gateway.disable_auto_save();
        self.save();
        info!("game paused");
    }

    pub fn resume(&mut self) {
        if !self.started || !self.paused {
            return;
        }
        self.paused = false;
        self.gateway.enable_auto_save();
        info!("game resumed");
    }

    pub fn on_focus_changed(&mut self, has_focus: bool) {
        if has_focus {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn on_pause_changed(&mut self, paused: bool) {
        if paused {
            self.pause();
        } else {
            self.resume();
        }
    }

    pub fn on_quit(&mut self) {
        if self.started && self.save() {
            info!("saved on quit");
        }
    }

    // ---- operations ----

    /// Does nothing before [`Game::start`].
    pub fn click(&mut self) {
        if !self.started {
            return;
        }
        self.points().perform_click();
        self.dispatch();
    }

    /// One external tick: idle production, play time and autosave. Does
    /// nothing before [`Game::start`] or while paused.
    pub fn tick(&mut self) {
        if !self.started || self.paused {
            return;
        }
        let dt = self.config.tick_interval_secs;
        self.points().tick(dt);
        self.events.push(GameEvent::PlayTimeAdvanced(
            self.state.total_play_time_seconds,
        ));
        self.dispatch();

        let now = self.clock.now();
        if self.gateway.tick(&self.state, now) {
            self.events.push(GameEvent::SaveCompleted);
            self.dispatch();
        }
    }

    pub fn purchase_upgrade(&mut self, id: &UpgradeId) -> Result<u32, PurchaseError> {
        if !self.started {
            return Err(PurchaseError::NotStarted);
        }
        let result = self.upgrades().purchase(id);
        self.dispatch();
        result
    }

    pub fn purchase_prestige_upgrade(&mut self, id: &PrestigeUpgradeId) -> Result<u32, PurchaseError> {
        if !self.started {
            return Err(PurchaseError::NotStarted);
        }
        let result = self.prestige().purchase_prestige_upgrade(id);
        self.dispatch();
        result
    }

    /// Reset the run for prestige points and save the result.
    pub fn perform_prestige(&mut self) -> Result<i64, PrestigeError> {
        if !self.started {
            return Err(PrestigeError::NotStarted);
        }
        let result = self.prestige().perform_prestige();
        self.dispatch();
        if result.is_ok() {
            self.save();
        }
        result
    }

    /// Write the state now. Returns `false` before [`Game::start`] or when
    /// the store fails.
    pub fn save(&mut self) -> bool {
        if !self.started {
            return false;
        }
        let now = self.clock.now();
        let saved = self.gateway.save(&self.state, now);
        if saved {
            self.events.push(GameEvent::SaveCompleted);
            self.dispatch();
        }
        saved
    }

    /// Remove the save and restart from a fresh state.
    pub fn delete_save(&mut self) -> bool {
        let deleted = self.gateway.delete_save();
        self.state = PlayerState::fresh(self.clock.now());
        self.prepare_state();
        info!("progress reset");
        self.dispatch();
        deleted
    }

    pub fn has_save(&self) -> bool {
        self.gateway.has_save()
    }

    pub fn enable_auto_save(&mut self) {
        self.gateway.enable_auto_save();
    }

    pub fn disable_auto_save(&mut self) {
        self.gateway.disable_auto_save();
    }

    pub fn is_auto_save_enabled(&self) -> bool {
        self.gateway.is_auto_save_enabled()
    }

    pub fn set_max_offline_hours(&mut self, hours: f64) {
        self.offline.set_max_offline_hours(hours);
    }

    pub fn set_offline_efficiency(&mut self, efficiency: f64) {
        self.offline.set_offline_efficiency(efficiency);
    }

    pub fn offline_settings(&self) -> &OfflineSettings {
        &self.offline
    }

    // ---- events ----

    /// Register a callback invoked for every event, after the built-in
    /// reactions to that event have run.
    pub fn subscribe<F: FnMut(&GameEvent) + 'static>(&mut self, subscriber: F) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn dispatch(&mut self) {
        while let Some(event) = self.events.pop() {
            self.react(&event);
            for (_, subscriber) in self.subscribers.iter_mut() {
                subscriber(&event);
            }
        }
    }

    fn react(&mut self, event: &GameEvent) {
        match event {
            GameEvent::PointsChanged(points) => {
                self.achievements()
                    .update_progress(AchievementKind::TotalPoints, *points);
                let mut available = self.prestige_available;
                self.prestige().refresh_availability(&mut available);
                self.prestige_available = available;
            }
            GameEvent::Clicked => {
                let clicks = self.state.total_clicks;
                self.achievements()
                    .update_progress(AchievementKind::TotalClicks, clicks);
            }
            GameEvent::PointsPerClickChanged(rate) => {
                self.achievements()
                    .update_progress(AchievementKind::PointsPerClick, *rate);
            }
            GameEvent::PointsPerSecondChanged(rate) => {
                self.achievements()
                    .update_progress(AchievementKind::PointsPerSecond, *rate);
            }
            GameEvent::UpgradePurchased { .. } => {
                let bought = self.state.total_upgrades_purchased;
                let highest = i64::from(self.state.max_upgrade_level());
                let mut achievements = self.achievements();
                achievements.update_progress(AchievementKind::UpgradeCount, bought);
                achievements.update_progress(AchievementKind::MaxUpgradeLevel, highest);
            }
            GameEvent::PrestigePerformed(_) => {
                let level = self.state.prestige.level;
                self.achievements()
                    .update_progress(AchievementKind::ReachLevel, level);
                let mut available = self.prestige_available;
                self.prestige().refresh_availability(&mut available);
                self.prestige_available = available;
            }
            GameEvent::PlayTimeAdvanced(seconds) => {
                self.achievements()
                    .update_progress(AchievementKind::TimeSpent, seconds.floor() as i64);
            }
            _ => {}
        }
    }

    // ---- queries ----

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn current_points(&self) -> i64 {
        self.state.current_points
    }

    pub fn points_per_click(&self) -> i64 {
        self.state.points_per_click
    }

    pub fn points_per_second(&self) -> i64 {
        self.state.points_per_second
    }

    pub fn upgrade_level(&self, id: &UpgradeId) -> u32 {
        self.state.upgrade_level(id)
    }

    pub fn upgrade_cost(&self, id: &UpgradeId) -> i64 {
        upgrades::current_cost(&self.state, &self.catalog, id)
    }

    pub fn can_purchase_upgrade(&self, id: &UpgradeId) -> bool {
        upgrades::can_purchase(&self.state, &self.catalog, id)
    }

    pub fn total_invested_cost(&self, id: &UpgradeId) -> i64 {
        upgrades::total_invested_cost(&self.state, &self.catalog, id)
    }

    pub fn affordable_upgrades(&self) -> Vec<&UpgradeDefinition> {
        upgrades::affordable_upgrades(&self.state, &self.catalog)
    }

    pub fn is_achievement_unlocked(&self, id: &AchievementId) -> bool {
        achievements::is_unlocked(&self.state, id)
    }

    pub fn unlocked_achievement_count(&self) -> usize {
        achievements::unlocked_count(&self.state, &self.catalog)
    }

    pub fn achievement_count(&self) -> usize {
        achievements::total_count(&self.catalog)
    }

    pub fn visible_achievements(&self) -> Vec<&AchievementDefinition> {
        achievements::visible_definitions(&self.state, &self.catalog)
    }

    pub fn user_achievement(&self, id: &AchievementId) -> Option<&AchievementProgress> {
        achievements::user_achievement(&self.state, id)
    }

    pub fn can_prestige(&self) -> bool {
        prestige::can_prestige(&self.state, &self.config)
    }

    pub fn calculate_prestige_points(&self) -> i64 {
        prestige::calculate_prestige_points(&self.state, &self.config)
    }

    pub fn prestige_upgrade_cost(&self, id: &PrestigeUpgradeId) -> i64 {
        prestige::prestige_upgrade_cost(&self.state, &self.catalog, id)
    }

    pub fn can_afford_prestige_upgrade(&self, id: &PrestigeUpgradeId) -> bool {
        prestige::can_afford_prestige_upgrade(&self.state, &self.catalog, id)
    }

    pub fn global_multiplier(&self) -> f64 {
        self.state.prestige.global_multiplier
    }

    pub fn offline_bonus(&self) -> f64 {
        prestige::offline_bonus(&self.state, &self.catalog)
    }

    pub fn calculate_offline_rewards(&self, elapsed_secs: f64) -> i64 {
        offline::calculate_offline_rewards(&self.state, &self.catalog, &self.offline, elapsed_secs)
    }
}
