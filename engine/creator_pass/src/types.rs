//! # Types
//!
//! Shared data structures used across all modules of the Creator Pass engine.
//!
//! ## Design decisions
//!
//! ### Keys are parsed, never trusted
//!
//! Tier and role identifiers arrive as strings from persisted blobs and from
//! the rendering layer. [`TierKey::parse_or_free`] maps anything unknown to
//! [`TierKey::Free`], so a corrupted record can only ever lose privilege.
//!
//! ### Credit balance as a checked record
//!
//! [`CreditBalance`] stores `remaining` redundantly so the persisted JSON keeps
//! the shape the front end already reads. [`CreditBalance::is_consistent`]
//! re-derives it on every load:
//!
//! ```text
//! remaining == total + rollover - used      (and remaining >= 0)
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Entitlement tier key. Ordering lives in the tier catalog, not here.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKey {
    Free,
    Starter,
    Pro,
    Legacy,
}

impl TierKey {
    pub const ALL: [TierKey; 4] = [
        TierKey::Free,
        TierKey::Starter,
        TierKey::Pro,
        TierKey::Legacy,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Self::Free),
            "starter" => Some(Self::Starter),
            "pro" => Some(Self::Pro),
            "legacy" => Some(Self::Legacy),
            _ => None,
        }
    }

    /// Least-privilege parse: unknown keys resolve to [`TierKey::Free`].
    pub fn parse_or_free(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|| {
            warn!(tier = raw, "unknown tier key, falling back to free");
            Self::Free
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Legacy => "legacy",
        }
    }
}

impl fmt::Display for TierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

/// The `creator_pass_tier` record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub tier: TierKey,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    /// Set only by an upgrade through checkout.
    #[serde(default)]
    pub subscribed_at: Option<DateTime<Utc>>,
}

impl Default for SubscriptionRecord {
    fn default() -> Self {
        Self {
            tier: TierKey::Free,
            billing_cycle: BillingCycle::Monthly,
            subscribed_at: None,
        }
    }
}

/// Monthly credit balance, persisted under `credits`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    /// Allotment for the current period.
    pub total: u64,
    /// Consumed since the last reset.
    pub used: u64,
    pub remaining: u64,
    /// Carried over from the previous period.
    pub rollover: u64,
    /// First day on which the next reset applies.
    pub reset_date: NaiveDate,
}

impl CreditBalance {
    /// Re-derive `remaining` and compare with the stored value.
    pub fn is_consistent(&self) -> bool {
        self.total
            .checked_add(self.rollover)
            .and_then(|available| available.checked_sub(self.used))
            == Some(self.remaining)
    }

    /// Credits available this period before any consumption.
    pub fn available(&self) -> u64 {
        self.total.saturating_add(self.rollover)
    }
}

/// User role selected on the landing page; picks the onboarding flow.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    SoloCreator,
    Agency,
    TeamLead,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::SoloCreator, Role::Agency, Role::TeamLead];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "solo-creator" => Some(Self::SoloCreator),
            "agency" => Some(Self::Agency),
            "team-lead" => Some(Self::TeamLead),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::SoloCreator => "solo-creator",
            Self::Agency => "agency",
            Self::TeamLead => "team-lead",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SoloCreator => "Solo Creator",
            Self::Agency => "Agency Partner",
            Self::TeamLead => "Team Lead",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Lifecycle of a single onboarding step.
///
/// ```text
/// Pending ──complete──► Completed
///    └─────skip───────► Skipped     (optional steps only)
/// ```
///
/// Both `Completed` and `Skipped` are terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Completed,
    Skipped,
}

impl StepState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}
