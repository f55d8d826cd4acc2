//! Analytics events emitted by the engine.
//!
//! Events are handed to an [`EventSink`] after the state they describe has
//! been saved. Sinks cannot fail back into the engine: delivery problems are
//! the sink's own business.

use serde::Serialize;

use crate::achievements::AchievementId;
use crate::types::{BillingCycle, TierKey};

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PassEvent {
    /// A tier change was granted by checkout.
    TierChanged {
        from: TierKey,
        to: TierKey,
        billing_cycle: BillingCycle,
    },
    /// Credits were spent.
    CreditsConsumed { cost: u64, remaining: u64 },
    /// A badge entered the earned set.
    AchievementUnlocked {
        id: AchievementId,
        title: &'static str,
    },
}

impl PassEvent {
    /// Short identifier suitable for storage and dispatch.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TierChanged { .. } => "tier_changed",
            Self::CreditsConsumed { .. } => "credits_consumed",
            Self::AchievementUnlocked { .. } => "achievement_unlocked",
        }
    }
}

/// Fire-and-forget receiver of [`PassEvent`]s.
pub trait EventSink {
    fn notify(&mut self, event: PassEvent);
}

/// Discards every event.
impl EventSink for () {
    fn notify(&mut self, _event: PassEvent) {}
}

/// Collects events for later delivery.
impl EventSink for Vec<PassEvent> {
    fn notify(&mut self, event: PassEvent) {
        self.push(event);
    }
}

impl<E: EventSink + ?Sized> EventSink for &mut E {
    fn notify(&mut self, event: PassEvent) {
        (**self).notify(event);
    }
}
