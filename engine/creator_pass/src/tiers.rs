//! # Tiers
//!
//! Static tier catalog, the entitlement resolver, and the catalog of gated
//! scrolls.
//!
//! | Tier      | Rank | Monthly credits | Rollover cap |
//! |-----------|------|-----------------|--------------|
//! | `free`    | 0    | 0               | 0            |
//! | `starter` | 1    | 500             | 0            |
//! | `pro`     | 2    | 2 500           | 1 000        |
//! | `legacy`  | 3    | 10 000          | unlimited    |
//!
//! Access never depends on anything except rank, so the rendering layer can
//! only ever display the boolean it receives.

use serde::{Serialize, Serializer};

use crate::types::TierKey;

/// Upper bound on credits carried into the next period.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RolloverCap {
    Limited(u64),
    Unlimited,
}

impl RolloverCap {
    /// Portion of `remaining` that survives a reset.
    pub fn carry(self, remaining: u64) -> u64 {
        match self {
            Self::Limited(cap) => remaining.min(cap),
            Self::Unlimited => remaining,
        }
    }
}

impl Serialize for RolloverCap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Limited(cap) => serializer.serialize_u64(*cap),
            Self::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub key: TierKey,
    pub name: &'static str,
    pub rank: u8,
    pub monthly_credits: u64,
    pub rollover_cap: RolloverCap,
    pub features: &'static [&'static str],
}

static CATALOG: [Tier; 4] = [
    Tier {
        key: TierKey::Free,
        name: "Free",
        rank: 0,
        monthly_credits: 0,
        rollover_cap: RolloverCap::Limited(0),
        features: &["Master Index scroll", "Creator Pass scroll"],
    },
    Tier {
        key: TierKey::Starter,
        name: "Starter",
        rank: 1,
        monthly_credits: 500,
        rollover_cap: RolloverCap::Limited(0),
        features: &[
            "Basic trust scoring",
            "3 social platforms",
            "Monthly reports",
            "Email support",
            "Basic fraud detection",
        ],
    },
    Tier {
        key: TierKey::Pro,
        name: "Pro",
        rank: 2,
        monthly_credits: 2_500,
        rollover_cap: RolloverCap::Limited(1_000),
        features: &[
            "Advanced trust scoring",
            "Unlimited social platforms",
            "Real-time notifications",
            "Priority email support",
            "Advanced fraud detection",
            "API access",
            "Custom branding",
        ],
    },
    Tier {
        key: TierKey::Legacy,
        name: "Legacy",
        rank: 3,
        monthly_credits: 10_000,
        rollover_cap: RolloverCap::Unlimited,
        features: &[
            "Everything in Pro plan",
            "White-label dashboard",
            "Dedicated account manager",
            "Custom integrations",
            "Phone support",
            "SLA guarantee",
            "Advanced analytics suite",
        ],
    },
];

/// All tiers in rank order.
pub fn catalog() -> &'static [Tier] {
    &CATALOG
}

pub fn tier(key: TierKey) -> &'static Tier {
    match key {
        TierKey::Free => &CATALOG[0],
        TierKey::Starter => &CATALOG[1],
        TierKey::Pro => &CATALOG[2],
        TierKey::Legacy => &CATALOG[3],
    }
}

pub fn rank(key: TierKey) -> u8 {
    tier(key).rank
}

/// Free resources are always accessible; otherwise the user's rank must be
/// at least the resource's rank.
pub fn can_access(resource_tier: TierKey, user_tier: TierKey) -> bool {
    resource_tier == TierKey::Free || rank(user_tier) >= rank(resource_tier)
}

/// String-keyed variant for callers holding raw, possibly corrupted keys.
pub fn can_access_raw(resource_tier: &str, user_tier: &str) -> bool {
    can_access(
        TierKey::parse_or_free(resource_tier),
        TierKey::parse_or_free(user_tier),
    )
}

// ── Scroll catalog ───────────────────────────────────────────────────

/// A gated content item.
#[derive(Clone, Debug, Serialize)]
pub struct Scroll {
    pub id: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub tier: TierKey,
}

static SCROLLS: [Scroll; 5] = [
    Scroll {
        id: "00-index",
        title: "Master Index",
        subtitle: "Your Entry Point",
        tier: TierKey::Free,
    },
    Scroll {
        id: "creator-pass",
        title: "Creator Pass",
        subtitle: "The Master Key",
        tier: TierKey::Free,
    },
    Scroll {
        id: "10-agency-scroll",
        title: "Agency Scroll",
        subtitle: "Partnership Framework",
        tier: TierKey::Pro,
    },
    Scroll {
        id: "AGENCY_CLI_QUICKSTART",
        title: "CLI Quickstart",
        subtitle: "Command Reference",
        tier: TierKey::Pro,
    },
    Scroll {
        id: "ASCENSION_SCROLL",
        title: "Ascension Scroll",
        subtitle: "Advanced Rituals",
        tier: TierKey::Legacy,
    },
];

pub fn scrolls() -> &'static [Scroll] {
    &SCROLLS
}

pub fn scroll(id: &str) -> Option<&'static Scroll> {
    SCROLLS.iter().find(|s| s.id == id)
}

/// Render-ready lock decision for one scroll.
#[derive(Clone, Debug, Serialize)]
pub struct ScrollAccess {
    pub scroll: &'static Scroll,
    pub locked: bool,
}

pub fn scroll_access(user_tier: TierKey) -> Vec<ScrollAccess> {
    SCROLLS
        .iter()
        .map(|scroll| ScrollAccess {
            scroll,
            locked: !can_access(scroll.tier, user_tier),
        })
        .collect()
}

/// Scrolls `user_tier` cannot open, in catalog order.
pub fn locked_scrolls(user_tier: TierKey) -> Vec<&'static Scroll> {
    SCROLLS
        .iter()
        .filter(|s| !can_access(s.tier, user_tier))
        .collect()
}

/// The cheapest tier that unlocks every currently locked scroll, if any.
pub fn unlocking_tier(user_tier: TierKey) -> Option<TierKey> {
    locked_scrolls(user_tier)
        .into_iter()
        .map(|s| s.tier)
        .max_by_key(|key| rank(*key))
}
