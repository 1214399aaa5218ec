//! Typed notifications emitted by the engines, delivered in emission order.

use crate::PurchaseError;
use idle_core::{AchievementDefinition, AchievementId, PlayerState, UpgradeId};
use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// New point balance.
    PointsChanged(i64),
    PointsPerClickChanged(i64),
    PointsPerSecondChanged(i64),
    Clicked,
    UpgradePurchased {
        id: UpgradeId,
        new_level: u32,
    },
    UpgradePurchaseFailed {
        id: UpgradeId,
        reason: PurchaseError,
    },
    AchievementUnlocked(AchievementDefinition),
    AchievementProgressChanged {
        id: AchievementId,
        current: i64,
        target: i64,
    },
    /// Prestige points earned by the reset.
    PrestigePerformed(i64),
    /// New spendable prestige point balance.
    PrestigePointsChanged(i64),
    PrestigeAvailabilityChanged(bool),
    OfflineRewardsApplied {
        amount: i64,
        seconds: f64,
    },
    SaveCompleted,
    /// Snapshot of a restored save, after offline rewards and recalculation.
    LoadCompleted(Box<PlayerState>),
    /// Accumulated play time in seconds after an idle tick.
    PlayTimeAdvanced(f64),
}

/// FIFO of events awaiting dispatch.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return everything queued, oldest first.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let mut q = EventQueue::new();
        q.push(GameEvent::Clicked);
        q.push(GameEvent::PointsChanged(1));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(GameEvent::Clicked));
        assert_eq!(q.drain(), vec![GameEvent::PointsChanged(1)]);
        assert!(q.is_empty());
    }
}
