//! # Credit ledger
//!
//! Pure operations over [`CreditBalance`]. Every function takes a balance by
//! reference and returns a new one, so a failed operation cannot leave a
//! half-applied value behind.
//!
//! ## Reset
//!
//! A reset only applies once `today` has reached `reset_date`, and moves
//! `reset_date` to the first day of the following month. Calling [`reset`]
//! again for the same day is therefore a no-op, which keeps double resets
//! from repeated reads harmless.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::tiers::Tier;
use crate::types::CreditBalance;
use crate::Error;

/// Usage at or above this percentage is reported as [`UsageStatus::Critical`].
pub const CRITICAL_USAGE_PERCENT: u8 = 90;
/// Usage at or above this percentage is reported as [`UsageStatus::Low`].
pub const LOW_USAGE_PERCENT: u8 = 70;
/// Largest `total + rollover` a persisted balance may hold. Anything above
/// this can only come from a corrupted record.
pub const MAX_AVAILABLE_CREDITS: u64 = 1 << 40;

/// First day of the month after `today`.
pub fn next_reset_date(today: NaiveDate) -> NaiveDate {
    today
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .unwrap_or(NaiveDate::MAX)
}

/// A full, unused allotment for `tier`.
pub fn fresh(tier: &Tier, today: NaiveDate) -> CreditBalance {
    CreditBalance {
        total: tier.monthly_credits,
        used: 0,
        remaining: tier.monthly_credits,
        rollover: 0,
        reset_date: next_reset_date(today),
    }
}

/// Spend `cost` credits. Fails without touching `balance` when the cost
/// exceeds what remains.
pub fn consume(balance: &CreditBalance, cost: u64) -> Result<CreditBalance, Error> {
    if cost > balance.remaining {
        return Err(Error::InsufficientCredits {
            requested: cost,
            remaining: balance.remaining,
        });
    }

    Ok(CreditBalance {
        used: balance.used + cost,
        remaining: balance.remaining - cost,
        ..balance.clone()
    })
}

/// Start a new period if one is due.
pub fn reset(balance: &CreditBalance, tier: &Tier, today: NaiveDate) -> CreditBalance {
    if today < balance.reset_date {
        return balance.clone();
    }

    let total = tier.monthly_credits;
    let rollover = tier
        .rollover_cap
        .carry(balance.remaining)
        .min(u64::MAX - total);
    CreditBalance {
        total,
        used: 0,
        remaining: total + rollover,
        rollover,
        reset_date: next_reset_date(today),
    }
}

pub fn is_reset_due(balance: &CreditBalance, today: NaiveDate) -> bool {
    today >= balance.reset_date
}

/// Apply a tier change to the current period.
///
/// The new allotment takes effect immediately and `used` is kept. The total
/// never drops below what has already been spent out of it, so `remaining`
/// stays non-negative even when the allotment shrinks.
pub fn grant_tier_upgrade(balance: &CreditBalance, new_tier: &Tier) -> CreditBalance {
    let total = new_tier
        .monthly_credits
        .max(balance.used.saturating_sub(balance.rollover));
    // total + rollover >= used holds with or without the clamp.
    let rollover = balance.rollover.min(u64::MAX - total);
    CreditBalance {
        total,
        remaining: total + rollover - balance.used,
        rollover,
        ..balance.clone()
    }
}

/// Rounded share of this period's credits already spent. An empty allotment
/// counts as fully used.
pub fn usage_percent(balance: &CreditBalance) -> u8 {
    let available = balance.available();
    if available == 0 {
        return 100;
    }
    let percent = (balance.used as f64 / available as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    Healthy,
    Low,
    Critical,
}

impl UsageStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy credit balance",
            Self::Low => "Credits running low",
            Self::Critical => "Low credits - consider upgrading",
        }
    }
}

pub fn usage_status(balance: &CreditBalance) -> UsageStatus {
    match usage_percent(balance) {
        p if p >= CRITICAL_USAGE_PERCENT => UsageStatus::Critical,
        p if p >= LOW_USAGE_PERCENT => UsageStatus::Low,
        _ => UsageStatus::Healthy,
    }
}

/// Render-ready summary for the credit meter.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditSummary {
    #[serde(flatten)]
    pub balance: CreditBalance,
    pub usage_percent: u8,
    pub status: UsageStatus,
    pub message: &'static str,
}

impl From<CreditBalance> for CreditSummary {
    fn from(balance: CreditBalance) -> Self {
        let status = usage_status(&balance);
        Self {
            usage_percent: usage_percent(&balance),
            status,
            message: status.message(),
            balance,
        }
    }
}
