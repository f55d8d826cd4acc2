use chrono::{TimeZone, Utc};

use crate::achievements::AchievementId;
use crate::events::PassEvent;
use crate::invariants::assert_rank_order;
use crate::storage::{self, Store};
use crate::tiers::{self, can_access, can_access_raw, locked_scrolls, unlocking_tier};
use crate::{BillingCycle, CreatorPass, MemoryStore, TierKey};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap()
}

#[test]
fn test_catalog_ranks_are_ordered() {
    assert_rank_order();
    assert_eq!(tiers::catalog().len(), TierKey::ALL.len());
    for key in TierKey::ALL {
        assert_eq!(tiers::tier(key).key, key);
    }
}

#[test]
fn test_free_resources_are_always_accessible() {
    for user in TierKey::ALL {
        assert!(can_access(TierKey::Free, user));
    }
}

#[test]
fn test_access_is_monotonic_in_rank() {
    for resource in TierKey::ALL {
        for lower in TierKey::ALL {
            for higher in TierKey::ALL {
                if tiers::rank(lower) <= tiers::rank(higher) && can_access(resource, lower) {
                    assert!(
                        can_access(resource, higher),
                        "{higher} lost access to {resource} that {lower} has"
                    );
                }
            }
        }
    }
}

#[test]
fn test_pro_user_scroll_matrix() {
    assert!(can_access(TierKey::Pro, TierKey::Pro));
    assert!(can_access(TierKey::Starter, TierKey::Pro));
    assert!(!can_access(TierKey::Legacy, TierKey::Pro));
}

#[test]
fn test_unknown_keys_resolve_to_free() {
    assert!(can_access_raw("free", "platinum"));
    assert!(!can_access_raw("pro", "platinum"));
    // An unreadable resource key is treated as free content.
    assert!(can_access_raw("mystery", "free"));
    assert!(can_access_raw("PRO", "legacy"));
}

#[test]
fn test_scroll_access_for_free_user() {
    let locked: Vec<&str> = tiers::scroll_access(TierKey::Free)
        .into_iter()
        .filter(|a| a.locked)
        .map(|a| a.scroll.id)
        .collect();

    assert_eq!(
        locked,
        vec!["10-agency-scroll", "AGENCY_CLI_QUICKSTART", "ASCENSION_SCROLL"]
    );
    let helper: Vec<&str> = locked_scrolls(TierKey::Free).iter().map(|s| s.id).collect();
    assert_eq!(helper, locked);
    assert!(locked_scrolls(TierKey::Legacy).is_empty());
    assert_eq!(unlocking_tier(TierKey::Free), Some(TierKey::Legacy));
    assert_eq!(unlocking_tier(TierKey::Starter), Some(TierKey::Legacy));
    assert_eq!(unlocking_tier(TierKey::Legacy), None);
}

#[test]
fn test_scroll_lookup() {
    assert_eq!(tiers::scroll("ASCENSION_SCROLL").map(|s| s.tier), Some(TierKey::Legacy));
    assert!(tiers::scroll("missing").is_none());
}

#[test]
fn test_missing_record_is_free() {
    let pass = CreatorPass::new(MemoryStore::new());
    assert_eq!(pass.tier(), TierKey::Free);
    assert!(pass.subscription().subscribed_at.is_none());
    assert!(!pass.can_access(TierKey::Starter));
}

#[test]
fn test_unknown_persisted_tier_is_free() {
    let mut store = MemoryStore::new();
    store
        .set(
            storage::SUBSCRIPTION_KEY,
            r#"{"tier":"platinum","billingCycle":"yearly"}"#.to_string(),
            0,
        )
        .unwrap();
    let pass = CreatorPass::new(store);

    assert_eq!(pass.tier(), TierKey::Free);
    assert_eq!(pass.subscription().billing_cycle, BillingCycle::Yearly);
}

#[test]
fn test_bare_tier_string_is_accepted() {
    let mut store = MemoryStore::new();
    store
        .set(storage::SUBSCRIPTION_KEY, r#""pro""#.to_string(), 0)
        .unwrap();
    let loaded = storage::load_subscription(&store);

    assert_eq!(loaded.value.tier, TierKey::Pro);
    assert!(loaded.fault.is_none());
}

#[test]
fn test_upgrade_emits_events_and_unlocks_badge() {
    let mut pass = CreatorPass::with_sink(MemoryStore::new(), Vec::new());
    pass.grant_tier_upgrade(TierKey::Pro, BillingCycle::Monthly, now())
        .unwrap();

    assert_eq!(pass.tier(), TierKey::Pro);
    assert_eq!(pass.subscription().subscribed_at, Some(now()));
    assert!(pass.achievements().contains(AchievementId::UpgradedTier));

    let (_, events) = pass.into_parts();
    assert_eq!(
        events,
        vec![
            PassEvent::TierChanged {
                from: TierKey::Free,
                to: TierKey::Pro,
                billing_cycle: BillingCycle::Monthly,
            },
            PassEvent::AchievementUnlocked {
                id: AchievementId::UpgradedTier,
                title: "Ascended",
            },
        ]
    );
}

#[test]
fn test_regranting_same_tier_is_quiet() {
    let mut pass = CreatorPass::with_sink(MemoryStore::new(), Vec::new());
    pass.grant_tier_upgrade(TierKey::Starter, BillingCycle::Monthly, now())
        .unwrap();
    pass.grant_tier_upgrade(TierKey::Starter, BillingCycle::Yearly, now())
        .unwrap();

    assert_eq!(pass.subscription().billing_cycle, BillingCycle::Yearly);
    let (_, events) = pass.into_parts();
    let tier_changes = events
        .iter()
        .filter(|e| matches!(e, PassEvent::TierChanged { .. }))
        .count();
    assert_eq!(tier_changes, 1);
}
