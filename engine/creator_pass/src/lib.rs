//! # Creator Pass Engine
//!
//! Entitlement, credit, and progression rules for the Creator Pass front end.
//! The crate exposes [`CreatorPass`], whose entry points cover every
//! user-facing decision:
//!
//! | Concern        | Entry point(s)                                           |
//! |----------------|----------------------------------------------------------|
//! | Entitlement    | [`CreatorPass::tier`], `can_access`, `scroll_access`     |
//! | Credits        | `credits`, `consume_credits`, `grant_tier_upgrade`       |
//! | Onboarding     | `progress`, `complete_step`, `skip_step`, `reset_progress` |
//! | Achievements   | `achievements`, `reset_achievements`                     |
//! | Guidance       | `recommendations`, `trust_score`                         |
//!
//! ## Architecture
//!
//! The decision logic lives in pure modules ([`tiers`], [`credits`],
//! [`trust`], [`progress`], [`achievements`], [`recommend`]). Persistence is
//! fully delegated to [`storage`] over an injected [`Store`]. This file only
//! sequences load → decide → save → notify; every entry point re-reads the
//! store on entry instead of caching state between calls.
//!
//! Dates and timestamps are passed in by the caller, so the engine never
//! reads a clock.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info};

pub mod achievements;
pub mod credits;
pub mod events;
pub mod progress;
pub mod recommend;
pub mod storage;
pub mod tiers;
pub mod trust;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_entitlement;
#[cfg(test)]
mod test_progress;
#[cfg(test)]
mod test_storage;
#[cfg(test)]
mod test_trust;

use achievements::{AchievementId, EarnedAchievements};
use events::{EventSink, PassEvent};
use progress::{Flow, Transition, TransitionRejection};
use recommend::Recommendation;
use storage::{
    load_achievements, load_credits, load_flow, load_subscription, save_achievements,
    save_credits, save_flow, save_subscription, StaleWrite,
};
use tiers::ScrollAccess;
use trust::{TrustScoreInputs, TrustScoreResult};

pub use storage::{MemoryStore, Store};
pub use types::{BillingCycle, CreditBalance, Role, StepState, SubscriptionRecord, TierKey};

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("insufficient credits: requested {requested}, remaining {remaining}")]
    InsufficientCredits { requested: u64, remaining: u64 },
    #[error("cannot move step `{step}`: {reason}")]
    InvalidStepTransition {
        step: String,
        reason: TransitionRejection,
    },
    #[error("{to} is not an upgrade from {from}")]
    NotAnUpgrade { from: TierKey, to: TierKey },
    #[error(transparent)]
    StaleWrite(#[from] StaleWrite),
}

/// Result of a step transition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepOutcome {
    pub flow: Flow,
    pub unlocked: Vec<AchievementId>,
}

pub struct CreatorPass<S: Store, E: EventSink = ()> {
    store: S,
    sink: E,
}

impl<S: Store> CreatorPass<S> {
    pub fn new(store: S) -> Self {
        Self::with_sink(store, ())
    }
}

impl<S: Store, E: EventSink> CreatorPass<S, E> {
    pub fn with_sink(store: S, sink: E) -> Self {
        Self { store, sink }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (S, E) {
        (self.store, self.sink)
    }

    // ─────────────────────────────────────────────────────────
    // Entitlement
    // ─────────────────────────────────────────────────────────

    pub fn subscription(&self) -> SubscriptionRecord {
        load_subscription(&self.store).value
    }

    /// Current tier; anything unreadable resolves to `free`.
    pub fn tier(&self) -> TierKey {
        self.subscription().tier
    }

    pub fn can_access(&self, resource_tier: TierKey) -> bool {
        tiers::can_access(resource_tier, self.tier())
    }

    pub fn scroll_access(&self) -> Vec<ScrollAccess> {
        tiers::scroll_access(self.tier())
    }

    // ─────────────────────────────────────────────────────────
    // Credits
    // ─────────────────────────────────────────────────────────

    /// Current balance. A due reset, or the replacement of a corrupted
    /// record, is persisted before returning.
    pub fn credits(&mut self, today: NaiveDate) -> Result<CreditBalance, Error> {
        let tier = self.tier();
        let loaded = load_credits(&self.store, tier, today);
        let due = credits::is_reset_due(&loaded.value, today);
        let balance = credits::reset(&loaded.value, tiers::tier(tier), today);

        if due || loaded.fault.is_some() {
            save_credits(&mut self.store, &balance, loaded.version)?;
            debug!(total = balance.total, rollover = balance.rollover, "credit period settled");
        }
        Ok(balance)
    }

    /// Spend `cost` credits. On failure nothing is written.
    pub fn consume_credits(&mut self, cost: u64, today: NaiveDate) -> Result<CreditBalance, Error> {
        let tier = self.tier();
        let loaded = load_credits(&self.store, tier, today);
        let current = credits::reset(&loaded.value, tiers::tier(tier), today);

        let balance = credits::consume(&current, cost)?;
        save_credits(&mut self.store, &balance, loaded.version)?;

        info!(cost, remaining = balance.remaining, "credits consumed");
        self.sink.notify(PassEvent::CreditsConsumed {
            cost,
            remaining: balance.remaining,
        });
        Ok(balance)
    }

    /// Apply a tier purchased through checkout. The payment itself is
    /// verified upstream and trusted here.
    ///
    /// Downgrades are rejected; re-granting the current tier refreshes the
    /// billing cycle and allotment.
    pub fn grant_tier_upgrade(
        &mut self,
        new_tier: TierKey,
        billing_cycle: BillingCycle,
        now: DateTime<Utc>,
    ) -> Result<CreditBalance, Error> {
        let subscription = load_subscription(&self.store);
        let from = subscription.value.tier;
        if tiers::rank(new_tier) < tiers::rank(from) {
            return Err(Error::NotAnUpgrade { from, to: new_tier });
        }

        let today = now.date_naive();
        let loaded = load_credits(&self.store, from, today);
        let current = credits::reset(&loaded.value, tiers::tier(from), today);
        let balance = credits::grant_tier_upgrade(&current, tiers::tier(new_tier));

        let record = SubscriptionRecord {
            tier: new_tier,
            billing_cycle,
            subscribed_at: Some(now),
        };
        let mut earned = load_achievements(&self.store);
        let unlocked = achievements::unlock(&mut earned.value, None, &record);

        save_subscription(&mut self.store, &record, subscription.version)?;
        save_credits(&mut self.store, &balance, loaded.version)?;
        if !unlocked.is_empty() {
            save_achievements(&mut self.store, &earned.value, earned.version)?;
        }

        info!(from = %from, to = %new_tier, total = balance.total, "tier granted");
        if from != new_tier {
            self.sink.notify(PassEvent::TierChanged {
                from,
                to: new_tier,
                billing_cycle,
            });
        }
        self.notify_unlocked(&unlocked);
        Ok(balance)
    }

    // ─────────────────────────────────────────────────────────
    // Onboarding
    // ─────────────────────────────────────────────────────────

    pub fn progress(&self, role: Role) -> Flow {
        load_flow(&self.store, role).value
    }

    pub fn complete_step(&mut self, role: Role, step_id: &str) -> Result<StepOutcome, Error> {
        self.transition(role, step_id, Transition::Complete)
    }

    pub fn skip_step(&mut self, role: Role, step_id: &str) -> Result<StepOutcome, Error> {
        self.transition(role, step_id, Transition::Skip)
    }

    fn transition(
        &mut self,
        role: Role,
        step_id: &str,
        transition: Transition,
    ) -> Result<StepOutcome, Error> {
        let mut flow = load_flow(&self.store, role);
        flow.value.apply(step_id, transition)?;

        let subscription = self.subscription();
        let mut earned = load_achievements(&self.store);
        let unlocked = achievements::unlock(&mut earned.value, Some(&flow.value), &subscription);

        save_flow(&mut self.store, &flow.value, flow.version)?;
        if !unlocked.is_empty() {
            save_achievements(&mut self.store, &earned.value, earned.version)?;
        }

        info!(
            role = %role,
            step = step_id,
            ?transition,
            percent = flow.value.percent_complete(),
            "onboarding step resolved"
        );
        self.notify_unlocked(&unlocked);
        Ok(StepOutcome {
            flow: flow.value,
            unlocked,
        })
    }

    /// User-initiated restart of one role's flow. Earned achievements stay.
    pub fn reset_progress(&mut self, role: Role) -> Result<Flow, Error> {
        let loaded = load_flow(&self.store, role);
        let flow = Flow::new(role);
        save_flow(&mut self.store, &flow, loaded.version)?;
        info!(role = %role, "onboarding progress reset");
        Ok(flow)
    }

    // ─────────────────────────────────────────────────────────
    // Achievements
    // ─────────────────────────────────────────────────────────

    pub fn achievements(&self) -> EarnedAchievements {
        load_achievements(&self.store).value
    }

    /// User-initiated reset; the only operation that shrinks the earned set.
    pub fn reset_achievements(&mut self) -> Result<(), Error> {
        let mut loaded = load_achievements(&self.store);
        loaded.value.clear();
        save_achievements(&mut self.store, &loaded.value, loaded.version)?;
        info!("achievements reset");
        Ok(())
    }

    fn notify_unlocked(&mut self, unlocked: &[AchievementId]) {
        for id in unlocked {
            info!(achievement = %id, "achievement unlocked");
            self.sink.notify(PassEvent::AchievementUnlocked {
                id: *id,
                title: achievements::achievement(*id).title,
            });
        }
    }

    // ─────────────────────────────────────────────────────────
    // Guidance
    // ─────────────────────────────────────────────────────────

    /// Recomputed on every call and never persisted. A due credit reset is
    /// reflected but not written.
    pub fn recommendations(&self, role: Role, today: NaiveDate) -> Vec<Recommendation> {
        let tier = self.tier();
        let loaded = load_credits(&self.store, tier, today);
        let balance = credits::reset(&loaded.value, tiers::tier(tier), today);
        let flow = self.progress(role);
        let earned = self.achievements();
        recommend::recommend(role, tier, &balance, &flow, &earned)
    }

    pub fn trust_score(&self, inputs: &TrustScoreInputs) -> TrustScoreResult {
        trust::compute(inputs)
    }
}
