#![deny(warnings)]

//! Persistence layer: save envelope codec, blob stores and the save gateway.
//!
//! Saves are JSON documents of the form
//! `{ "state": PlayerState, "saveTimestamp": RFC3339, "schemaVersion": "1" }`.
//! Failures never escape to game logic: saving reports `false`, loading a
//! missing, unreadable, corrupt or newer-schema blob reports `None`.

use chrono::{DateTime, Duration, Utc};
use idle_core::{validate_state, PlayerState, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod store;

pub use store::{FileStore, MemoryStore, SaveStore};

/// Current save schema. Older versions load with missing fields defaulted.
pub const SCHEMA_VERSION: &str = "1";

/// Default seconds between autosaves.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: f64 = 5.0;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported save schema version: {0}")]
    UnsupportedSchema(String),
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("save holds an invalid state: {0}")]
    InvalidState(#[from] ValidationError),
}

/// On-disk wrapper around the player state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEnvelope {
    pub state: PlayerState,
    pub save_timestamp: DateTime<Utc>,
    pub schema_version: String,
}

/// Serialize `state` stamped with `now`.
pub fn encode(state: &PlayerState, now: DateTime<Utc>) -> Result<String, PersistenceError> {
    let envelope = SaveEnvelope {
        state: state.clone(),
        save_timestamp: now,
        schema_version: SCHEMA_VERSION.to_string(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse a save blob, rejecting schemas newer than this build understands
/// and states that break the balance invariants.
pub fn decode(blob: &str) -> Result<SaveEnvelope, PersistenceError> {
    let envelope: SaveEnvelope = serde_json::from_str(blob)?;
    let current: u32 = SCHEMA_VERSION.parse().unwrap_or(1);
    match envelope.schema_version.trim().parse::<u32>() {
        Ok(v) if v <= current => {}
        _ => {
            return Err(PersistenceError::UnsupportedSchema(
                envelope.schema_version.clone(),
            ))
        }
    }
    validate_state(&envelope.state)?;
    Ok(envelope)
}

/// A successfully restored save.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedSave {
    pub state: PlayerState,
    pub saved_at: DateTime<Utc>,
    /// Seconds between `saved_at` and the load, never negative.
    pub offline_seconds: f64,
}

/// Saves and restores the player state through a [`SaveStore`] and drives
/// interval-based autosave from the external tick.
#[derive(Debug)]
pub struct PersistenceGateway<S> {
    store: S,
    key: String,
    autosave_enabled: bool,
    autosave_interval: Duration,
    last_save: Option<DateTime<Utc>>,
    autosave_anchor: Option<DateTime<Utc>>,
}

fn duration_from_secs(secs: f64) -> Duration {
    Duration::milliseconds((secs.max(0.0) * 1_000.0).round() as i64)
}

impl<S: SaveStore> PersistenceGateway<S> {
    /// Gateway writing under `key`, with autosave enabled at the default interval.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            autosave_enabled: true,
            autosave_interval: duration_from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            autosave_anchor: None,
        }
    }

    pub fn with_autosave_interval(mut self, secs: f64) -> Self {
        self.autosave_interval = duration_from_secs(secs);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn last_save(&self) -> Option<DateTime<Utc>> {
        self.last_save
    }

    /// Write the state. Errors are logged and reported as `false`.
    pub fn save(&mut self, state: &PlayerState, now: DateTime<Utc>) -> bool {
        let result = encode(state, now).and_then(|blob| self.store.write(&self.key, &blob));
        match result {
            Ok(()) => {
                self.last_save = Some(now);
                self.autosave_anchor = Some(now);
                debug!(key = %self.key, points = state.current_points, "game saved");
                true
            }
            Err(e) => {
                error!(key = %self.key, error = %e, "save failed");
                false
            }
        }
    }

    /// Read the save, if a valid one exists.
    pub fn load(&self, now: DateTime<Utc>) -> Option<LoadedSave> {
        let blob = match self.store.read(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!(key = %self.key, "no save data; starting fresh");
                return None;
            }
            Err(e) => {
                error!(key = %self.key, error = %e, "could not read save");
                return None;
            }
        };
        let envelope = match decode(&blob) {
            Ok(env) => env,
            Err(e) => {
                warn!(key = %self.key, error = %e, "discarding unreadable save");
                return None;
            }
        };
        let elapsed = now.signed_duration_since(envelope.save_timestamp);
        let offline_seconds = (elapsed.num_milliseconds() as f64 / 1_000.0).max(0.0);
        info!(
            points = envelope.state.current_points,
            offline_seconds, "save loaded"
        );
        Some(LoadedSave {
            state: envelope.state,
            saved_at: envelope.save_timestamp,
            offline_seconds,
        })
    }

    pub fn has_save(&self) -> bool {
        self.store.contains(&self.key).unwrap_or_else(|e| {
            warn!(key = %self.key, error = %e, "could not probe save");
            false
        })
    }

    /// Remove the save blob. Returns `false` if the store refused.
    pub fn delete_save(&mut self) -> bool {
        match self.store.remove(&self.key) {
            Ok(()) => {
                info!(key = %self.key, "save deleted");
                self.last_save = None;
                true
            }
            Err(e) => {
                error!(key = %self.key, error = %e, "could not delete save");
                false
            }
        }
    }

    pub fn enable_auto_save(&mut self) {
        self.autosave_enabled = true;
        debug!("autosave enabled");
    }

    pub fn disable_auto_save(&mut self) {
        self.autosave_enabled = false;
        debug!("autosave disabled");
    }

    pub fn is_auto_save_enabled(&self) -> bool {
        self.autosave_enabled
    }

    /// Autosave once the interval has elapsed since the last save. The first
    /// tick only starts the timer. Returns whether a save happened.
    pub fn tick(&mut self, state: &PlayerState, now: DateTime<Utc>) -> bool {
        if !self.autosave_enabled {
            return false;
        }
        let anchor = *self.autosave_anchor.get_or_insert(now);
        if now.signed_duration_since(anchor) >= self.autosave_interval {
            return self.save(state, now);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use idle_core::{AchievementId, AchievementProgress, PrestigeUpgradeId, UpgradeId};
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn gateway() -> PersistenceGateway<MemoryStore> {
        PersistenceGateway::new(MemoryStore::new(), "slot")
    }

    /// Store whose writes always fail.
    struct BrokenStore;

    impl SaveStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
            Err(PersistenceError::Io(std::io::Error::other("disk gone")))
        }
        fn write(&mut self, _key: &str, _blob: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::Io(std::io::Error::other("disk gone")))
        }
        fn remove(&mut self, _key: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::Io(std::io::Error::other("disk gone")))
        }
    }

    #[test]
    fn envelope_has_documented_shape() {
        let blob = encode(&PlayerState::fresh(t0()), t0()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(v["schemaVersion"], "1");
        assert!(v["saveTimestamp"].is_string());
        assert_eq!(v["state"]["pointsPerClick"], 1);
    }

    #[test]
    fn save_then_load_reports_offline_time() {
        let mut gw = gateway();
        let mut state = PlayerState::fresh(t0());
        state.current_points = 77;
        assert!(!gw.has_save());
        assert!(gw.save(&state, t0()));
        assert!(gw.has_save());
        let loaded = gw.load(t0() + Duration::seconds(7_200)).unwrap();
        assert_eq!(loaded.state, state);
        assert_eq!(loaded.saved_at, t0());
        assert_eq!(loaded.offline_seconds, 7_200.0);
    }

    #[test]
    fn clock_skew_never_yields_negative_offline_time() {
        let mut gw = gateway();
        gw.save(&PlayerState::fresh(t0()), t0());
        let loaded = gw.load(t0() - Duration::seconds(30)).unwrap();
        assert_eq!(loaded.offline_seconds, 0.0);
    }

    #[test]
    fn missing_and_corrupt_saves_load_as_none() {
        let mut gw = gateway();
        assert!(gw.load(t0()).is_none());
        gw.store_mut().write("slot", "{not json").unwrap();
        assert!(gw.load(t0()).is_none());
        gw.store_mut().write("slot", r#"{"state":{}}"#).unwrap();
        assert!(gw.load(t0()).is_none());
    }

    #[test]
    fn negative_balances_load_as_none() {
        let mut gw = gateway();
        let blob = r#"{"state":{"currentPoints":-500,"prestige":{"currentPrestigePoints":-7}},"saveTimestamp":"2024-03-01T12:00:00Z","schemaVersion":"1"}"#;
        assert!(matches!(
            decode(blob),
            Err(PersistenceError::InvalidState(_))
        ));
        gw.store_mut().write("slot", blob).unwrap();
        assert!(gw.load(t0()).is_none());

        let blob = r#"{"state":{"totalClicks":-1},"saveTimestamp":"2024-03-01T12:00:00Z","schemaVersion":"1"}"#;
        gw.store_mut().write("slot", blob).unwrap();
        assert!(gw.load(t0()).is_none());
    }

    #[test]
    fn newer_schema_is_rejected_older_fields_default() {
        let mut gw = gateway();
        let blob = r#"{"state":{"currentPoints":9},"saveTimestamp":"2024-03-01T12:00:00Z","schemaVersion":"2"}"#;
        gw.store_mut().write("slot", blob).unwrap();
        assert!(gw.load(t0()).is_none());
        assert!(matches!(
            decode(blob),
            Err(PersistenceError::UnsupportedSchema(v)) if v == "2"
        ));

        let blob = r#"{"state":{"currentPoints":9},"saveTimestamp":"2024-03-01T12:00:00Z","schemaVersion":"1"}"#;
        gw.store_mut().write("slot", blob).unwrap();
        let loaded = gw.load(t0()).unwrap();
        assert_eq!(loaded.state.current_points, 9);
        assert_eq!(loaded.state.points_per_click, 1);
    }

    #[test]
    fn failures_are_swallowed() {
        let mut gw = PersistenceGateway::new(BrokenStore, "slot");
        assert!(!gw.save(&PlayerState::fresh(t0()), t0()));
        assert!(gw.last_save().is_none());
        assert!(gw.load(t0()).is_none());
        assert!(!gw.has_save());
        assert!(!gw.delete_save());
    }

    #[test]
    fn delete_removes_blob() {
        let mut gw = gateway();
        gw.save(&PlayerState::fresh(t0()), t0());
        assert!(gw.delete_save());
        assert!(!gw.has_save());
        assert!(gw.load(t0()).is_none());
    }

    #[test]
    fn autosave_waits_for_interval() {
        let mut gw = gateway();
        let state = PlayerState::fresh(t0());
        assert!(!gw.tick(&state, t0()));
        assert!(gw.last_save().is_none());
        assert!(!gw.tick(&state, t0() + Duration::seconds(4)));
        assert!(gw.tick(&state, t0() + Duration::seconds(5)));
        assert_eq!(gw.last_save(), Some(t0() + Duration::seconds(5)));
        assert!(!gw.tick(&state, t0() + Duration::seconds(9)));
        assert!(gw.tick(&state, t0() + Duration::seconds(10)));
    }

    #[test]
    fn autosave_respects_toggle_and_interval_override() {
        let mut gw = gateway().with_autosave_interval(30.0);
        let state = PlayerState::fresh(t0());
        gw.disable_auto_save();
        assert!(!gw.is_auto_save_enabled());
        assert!(!gw.tick(&state, t0()));
        assert!(!gw.tick(&state, t0() + Duration::seconds(100)));
        assert!(gw.last_save().is_none());
        gw.enable_auto_save();
        assert!(!gw.tick(&state, t0() + Duration::seconds(100)));
        assert!(!gw.tick(&state, t0() + Duration::seconds(120)));
        assert!(gw.tick(&state, t0() + Duration::seconds(130)));
    }

    #[test]
    fn file_backed_gateway_roundtrip() {
        let dir = store::scratch_dir("gateway");
        let mut gw = PersistenceGateway::new(FileStore::new(&dir), "main");
        let state = PlayerState::fresh(t0());
        assert!(gw.save(&state, t0()));
        let reopened = PersistenceGateway::new(FileStore::new(&dir), "main");
        assert_eq!(reopened.load(t0()).unwrap().state, state);
        let _ = std::fs::remove_dir_all(dir);
    }

    prop_compose! {
        fn reachable_state()(
            points in 0i64..i64::MAX / 2,
            ppc in 1i64..1_000_000,
            pps in 0i64..1_000_000,
            clicks in 0i64..10_000_000,
            bought in 0i64..100_000,
            play in 0.0f64..1e9,
            levels in proptest::collection::btree_map("[a-z_]{1,12}", 1u32..500, 0..6),
            unlocked in proptest::collection::btree_map("[a-z_]{1,12}", (any::<bool>(), 0i64..1_000_000), 0..6),
            prestige_level in 0i64..1_000,
            prestige_points in 0i64..1_000_000,
            multiplier in 1.0f64..100.0,
            prestige_levels in proptest::collection::btree_map("[a-z_]{1,12}", 0u32..50, 0..4),
            start_secs in 0i64..2_000_000_000,
        ) -> PlayerState {
            let start = Utc.timestamp_opt(start_secs, 0).unwrap();
            let mut s = PlayerState::fresh(start);
            s.current_points = points;
            s.points_per_click = ppc;
            s.points_per_second = pps;
            s.total_clicks = clicks;
            s.total_upgrades_purchased = bought;
            s.total_play_time_seconds = play;
            s.upgrade_levels = levels.into_iter().map(|(k, v)| (UpgradeId(k), v)).collect();
            s.achievement_progress = unlocked
                .into_iter()
                .map(|(k, (u, p))| {
                    let at = if u { Some(start) } else { None };
                    (AchievementId(k), AchievementProgress { unlocked: u, progress: p, unlocked_at: at })
                })
                .collect();
            s.prestige.level = prestige_level;
            s.prestige.total_prestige_points = prestige_points;
            s.prestige.current_prestige_points = prestige_points / 2;
            s.prestige.global_multiplier = multiplier;
            s.prestige.last_prestige_time = if prestige_level > 0 { Some(start) } else { None };
            s.prestige.upgrade_levels = prestige_levels
                .into_iter()
                .map(|(k, v)| (PrestigeUpgradeId(k), v))
                .collect();
            s
        }
    }

    proptest! {
        #[test]
        fn load_of_save_is_identity(state in reachable_state(), later in 0i64..1_000_000) {
            let mut gw = gateway();
            let saved_at = state.play_start_time;
            prop_assert!(gw.save(&state, saved_at));
            let loaded = gw.load(saved_at + Duration::seconds(later)).unwrap();
            prop_assert_eq!(loaded.state, state);
            prop_assert_eq!(loaded.offline_seconds, later as f64);
        }
    }
}
