#![deny(warnings)]

//! Single-threaded game runtime for Point Generator.
//!
//! The engines are short-lived views over one [`idle_core::PlayerState`];
//! [`Game`] owns the state, builds the engines for each operation and
//! drains the resulting [`GameEvent`]s before returning:
//! - achievements and prestige availability react to each event first
//! - subscribers then observe it, in emission order

use thiserror::Error;

pub mod achievements;
pub mod events;
pub mod game;
pub mod offline;
pub mod points;
pub mod prestige;
pub mod upgrades;

pub use achievements::AchievementEngine;
pub use events::{EventQueue, GameEvent};
pub use game::{Game, GameBuilder, SubscriptionId};
pub use offline::{OfflineRewardsEngine, OfflineSettings};
pub use points::PointEngine;
pub use prestige::PrestigeEngine;
pub use upgrades::UpgradeEngine;

/// Why a production or prestige upgrade could not be bought.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("unknown upgrade: {0}")]
    UnknownUpgrade(String),
    #[error("upgrade {0} is at its maximum level")]
    MaxLevelReached(String),
    #[error("costs {cost}, only {available} available")]
    InsufficientPoints { cost: i64, available: i64 },
    #[error("game has not started")]
    NotStarted,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PrestigeError {
    #[error("prestige needs {required} points, have {points}")]
    NotEligible { points: i64, required: i64 },
    #[error("game has not started")]
    NotStarted,
}

/// Wiring errors reported by [`GameBuilder::build`].
#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    #[error("no catalog supplied")]
    MissingCatalog,
    #[error("no save store supplied")]
    MissingStore,
    #[error("invalid catalog: {0}")]
    InvalidCatalog(idle_core::ValidationError),
    #[error("invalid config: {0}")]
    InvalidConfig(idle_core::ValidationError),
}
