//! # Storage
//!
//! Typed helpers over an injected key → JSON-blob [`Store`].
//!
//! | Key                        | Type                   | Description                 |
//! |----------------------------|------------------------|-----------------------------|
//! | `credits`                  | `CreditBalance`        | Current credit period       |
//! | `creator_pass_tier`        | `SubscriptionRecord`   | Tier, billing cycle, since  |
//! | `cli_onboarding_<roleId>`  | `OnboardingRecord`     | Completed / skipped steps   |
//! | `achievements`             | `EarnedAchievements`   | Earned badge ids            |
//!
//! ## Versioned writes
//!
//! Every record carries a version that starts at 1 and increases on each
//! write; an absent record has version 0. [`Store::set`] takes the version
//! the caller read and rejects the write with [`StaleWrite`] if another
//! writer got there first. Two tabs racing on the same key therefore lose
//! one write loudly instead of silently.
//!
//! ## Recovery
//!
//! Loads never fail. A blob that does not parse, or a balance that breaks its
//! invariant, is replaced by a fresh default and reported as a
//! [`StateFault`]. The stored version is kept so the next save overwrites
//! the bad record.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::achievements::EarnedAchievements;
use crate::credits;
use crate::progress::{Flow, OnboardingRecord};
use crate::tiers;
use crate::types::{BillingCycle, CreditBalance, Role, SubscriptionRecord, TierKey};

// ── Storage Keys ─────────────────────────────────────────────────────

pub const CREDITS_KEY: &str = "credits";
pub const SUBSCRIPTION_KEY: &str = "creator_pass_tier";
pub const ACHIEVEMENTS_KEY: &str = "achievements";
pub const ONBOARDING_KEY_PREFIX: &str = "cli_onboarding_";

/// All persisted record keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataKey {
    Credits,
    Subscription,
    Onboarding(Role),
    Achievements,
}

impl DataKey {
    pub fn as_key(&self) -> String {
        match self {
            Self::Credits => CREDITS_KEY.to_string(),
            Self::Subscription => SUBSCRIPTION_KEY.to_string(),
            Self::Onboarding(role) => format!("{ONBOARDING_KEY_PREFIX}{}", role.id()),
            Self::Achievements => ACHIEVEMENTS_KEY.to_string(),
        }
    }
}

// ── Store interface ──────────────────────────────────────────────────

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub value: String,
    pub version: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("stale write to `{key}`: read version {expected}, stored version is {found}")]
pub struct StaleWrite {
    pub key: String,
    pub expected: u64,
    pub found: u64,
}

pub trait Store {
    fn get(&self, key: &str) -> Option<Record>;

    /// Write `value` if the stored version still equals `expected`.
    /// Returns the new version.
    fn set(&mut self, key: &str, value: String, expected: u64) -> Result<u64, StaleWrite>;
}

impl<S: Store + ?Sized> Store for &mut S {
    fn get(&self, key: &str) -> Option<Record> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String, expected: u64) -> Result<u64, StaleWrite> {
        (**self).set(key, value, expected)
    }
}

/// In-process store, used by tests and as the daemon's request snapshot.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from already-versioned records.
    pub fn from_records(records: impl IntoIterator<Item = (String, Record)>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.records.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn version(&self, key: &str) -> u64 {
        self.records.get(key).map_or(0, |r| r.version)
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<Record> {
        self.records.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String, expected: u64) -> Result<u64, StaleWrite> {
        let found = self.version(key);
        if found != expected {
            return Err(StaleWrite {
                key: key.to_string(),
                expected,
                found,
            });
        }
        let version = found + 1;
        self.records
            .insert(key.to_string(), Record { value, version });
        Ok(version)
    }
}

// ── Recovery ─────────────────────────────────────────────────────────

/// A persisted-state problem that was recovered from instead of surfaced.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum StateFault {
    #[error("invalid tier key `{0}`, treated as free")]
    InvalidTierKey(String),
    #[error("malformed record `{key}`: {reason}")]
    MalformedPersistedState { key: String, reason: String },
}

/// A value read from the store with the version it was read at.
#[derive(Clone, Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub version: u64,
    pub fault: Option<StateFault>,
}

fn malformed(key: &str, reason: impl Into<String>) -> StateFault {
    let fault = StateFault::MalformedPersistedState {
        key: key.to_string(),
        reason: reason.into(),
    };
    warn!("{fault}; substituting a fresh default");
    fault
}

fn load_or<T, F>(store: &impl Store, key: &str, default: F) -> Loaded<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match store.get(key) {
        None => Loaded {
            value: default(),
            version: 0,
            fault: None,
        },
        Some(record) => match serde_json::from_str(&record.value) {
            Ok(value) => Loaded {
                value,
                version: record.version,
                fault: None,
            },
            Err(e) => Loaded {
                value: default(),
                version: record.version,
                fault: Some(malformed(key, e.to_string())),
            },
        },
    }
}

fn save<T: Serialize>(
    store: &mut impl Store,
    key: &str,
    value: &T,
    version: u64,
) -> Result<u64, StaleWrite> {
    // Serializing plain data structs with string keys cannot fail.
    let json = serde_json::to_string(value).unwrap_or_default();
    store.set(key, json, version)
}

// ── Subscription ─────────────────────────────────────────────────────

/// On-disk form of the subscription record. The tier stays a raw string so an
/// unknown key degrades to `free` instead of failing the whole record, and a
/// bare tier string is accepted as well.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSubscription {
    Bare(String),
    #[serde(rename_all = "camelCase")]
    Full {
        tier: String,
        #[serde(default)]
        billing_cycle: BillingCycle,
        #[serde(default)]
        subscribed_at: Option<DateTime<Utc>>,
    },
}

pub fn load_subscription(store: &impl Store) -> Loaded<SubscriptionRecord> {
    let key = DataKey::Subscription.as_key();
    let raw: Loaded<Option<StoredSubscription>> = load_or(store, &key, || None);

    let (tier, billing_cycle, subscribed_at) = match raw.value {
        None => {
            return Loaded {
                value: SubscriptionRecord::default(),
                version: raw.version,
                fault: raw.fault,
            }
        }
        Some(StoredSubscription::Bare(tier)) => (tier, BillingCycle::Monthly, None),
        Some(StoredSubscription::Full {
            tier,
            billing_cycle,
            subscribed_at,
        }) => (tier, billing_cycle, subscribed_at),
    };

    let (tier, fault) = match TierKey::parse(&tier) {
        Some(key) => (key, None),
        None => {
            let fault = StateFault::InvalidTierKey(tier);
            warn!("{fault}");
            (TierKey::Free, Some(fault))
        }
    };

    Loaded {
        value: SubscriptionRecord {
            tier,
            billing_cycle,
            subscribed_at,
        },
        version: raw.version,
        fault,
    }
}

pub fn save_subscription(
    store: &mut impl Store,
    record: &SubscriptionRecord,
    version: u64,
) -> Result<u64, StaleWrite> {
    save(store, &DataKey::Subscription.as_key(), record, version)
}

// ── Credits ──────────────────────────────────────────────────────────

/// Load the credit balance, falling back to a fresh allotment for `tier` when
/// the record is missing, unparseable, or inconsistent.
pub fn load_credits(store: &impl Store, tier: TierKey, today: NaiveDate) -> Loaded<CreditBalance> {
    let key = DataKey::Credits.as_key();
    let fresh = || credits::fresh(tiers::tier(tier), today);
    let loaded: Loaded<Option<CreditBalance>> = load_or(store, &key, || None);

    match loaded.value {
        Some(balance)
            if balance.is_consistent()
                && balance.available() <= credits::MAX_AVAILABLE_CREDITS =>
        {
            Loaded {
                value: balance,
                version: loaded.version,
                fault: None,
            }
        }
        Some(balance) if balance.is_consistent() => Loaded {
            value: fresh(),
            version: loaded.version,
            fault: Some(malformed(
                &key,
                format!(
                    "total {} + rollover {} exceeds {}",
                    balance.total,
                    balance.rollover,
                    credits::MAX_AVAILABLE_CREDITS
                ),
            )),
        },
        Some(balance) => Loaded {
            value: fresh(),
            version: loaded.version,
            fault: Some(malformed(
                &key,
                format!(
                    "remaining {} does not equal total {} + rollover {} - used {}",
                    balance.remaining, balance.total, balance.rollover, balance.used
                ),
            )),
        },
        None => Loaded {
            value: fresh(),
            version: loaded.version,
            fault: loaded.fault,
        },
    }
}

pub fn save_credits(
    store: &mut impl Store,
    balance: &CreditBalance,
    version: u64,
) -> Result<u64, StaleWrite> {
    debug_assert!(balance.is_consistent(), "saving inconsistent balance {balance:?}");
    save(store, &DataKey::Credits.as_key(), balance, version)
}

// ── Onboarding ───────────────────────────────────────────────────────

pub fn load_flow(store: &impl Store, role: Role) -> Loaded<Flow> {
    let key = DataKey::Onboarding(role).as_key();
    let loaded: Loaded<OnboardingRecord> = load_or(store, &key, OnboardingRecord::default);
    Loaded {
        value: Flow::from_record(role, &loaded.value),
        version: loaded.version,
        fault: loaded.fault,
    }
}

pub fn save_flow(store: &mut impl Store, flow: &Flow, version: u64) -> Result<u64, StaleWrite> {
    save(
        store,
        &DataKey::Onboarding(flow.role).as_key(),
        &flow.to_record(),
        version,
    )
}

// ── Achievements ─────────────────────────────────────────────────────

pub fn load_achievements(store: &impl Store) -> Loaded<EarnedAchievements> {
    load_or(
        store,
        &DataKey::Achievements.as_key(),
        EarnedAchievements::default,
    )
}

pub fn save_achievements(
    store: &mut impl Store,
    earned: &EarnedAchievements,
    version: u64,
) -> Result<u64, StaleWrite> {
    save(store, &DataKey::Achievements.as_key(), earned, version)
}
