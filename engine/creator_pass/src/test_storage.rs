use chrono::{NaiveDate, TimeZone, Utc};

use crate::achievements::{AchievementId, EarnedAchievements};
use crate::storage::{
    self, load_achievements, load_credits, load_flow, load_subscription, save_achievements,
    DataKey, StaleWrite, StateFault, Store,
};
use crate::{BillingCycle, CreatorPass, Error, MemoryStore, Role, TierKey};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
}

#[test]
fn test_data_keys() {
    assert_eq!(DataKey::Credits.as_key(), "credits");
    assert_eq!(DataKey::Subscription.as_key(), "creator_pass_tier");
    assert_eq!(DataKey::Achievements.as_key(), "achievements");
    assert_eq!(
        DataKey::Onboarding(Role::SoloCreator).as_key(),
        "cli_onboarding_solo-creator"
    );
}

#[test]
fn test_versions_start_at_one_and_increase() {
    let mut store = MemoryStore::new();
    assert_eq!(store.version("credits"), 0);
    assert_eq!(store.set("credits", "{}".into(), 0), Ok(1));
    assert_eq!(store.set("credits", "{}".into(), 1), Ok(2));
}

#[test]
fn test_stale_version_is_rejected() {
    let mut store = MemoryStore::new();
    store.set("credits", "a".into(), 0).unwrap();

    assert_eq!(
        store.set("credits", "b".into(), 0),
        Err(StaleWrite {
            key: "credits".into(),
            expected: 0,
            found: 1,
        })
    );
    assert_eq!(store.get("credits").map(|r| r.value), Some("a".to_string()));
}

#[test]
fn test_second_tab_loses_loudly() {
    let mut store = MemoryStore::new();

    // Both tabs read the empty set at version 0.
    let mut tab_a = load_achievements(&store);
    let mut tab_b = load_achievements(&store);
    tab_a.value.insert(AchievementId::FirstAuth);
    tab_b.value.insert(AchievementId::FirstClient);

    save_achievements(&mut store, &tab_a.value, tab_a.version).unwrap();
    let err = save_achievements(&mut store, &tab_b.value, tab_b.version).unwrap_err();
    assert_eq!(err.found, 1);

    // A reload and retry keeps both badges.
    let mut retry = load_achievements(&store);
    retry.value.insert(AchievementId::FirstClient);
    save_achievements(&mut store, &retry.value, retry.version).unwrap();

    let earned = load_achievements(&store).value;
    let expected: EarnedAchievements = [AchievementId::FirstAuth, AchievementId::FirstClient]
        .into_iter()
        .collect();
    assert_eq!(earned, expected);
}

#[test]
fn test_stale_flow_save_is_rejected() {
    let mut store = MemoryStore::new();
    let stale = load_flow(&store, Role::Agency);

    {
        let mut pass = CreatorPass::new(&mut store);
        pass.complete_step(Role::Agency, "install").unwrap();
    }

    let result = storage::save_flow(&mut store, &stale.value, stale.version);
    assert!(result.is_err());

    let mut pass = CreatorPass::new(&mut store);
    assert!(pass.progress(Role::Agency).has_completed("install"));
    assert!(matches!(
        pass.complete_step(Role::Agency, "install"),
        Err(Error::InvalidStepTransition { .. })
    ));
}

#[test]
fn test_malformed_json_is_recovered() {
    let mut store = MemoryStore::new();
    store
        .set(&DataKey::Onboarding(Role::TeamLead).as_key(), "{not json".into(), 0)
        .unwrap();
    store.set(storage::ACHIEVEMENTS_KEY, "42".into(), 0).unwrap();

    let flow = load_flow(&store, Role::TeamLead);
    assert_eq!(flow.version, 1);
    assert!(matches!(
        flow.fault,
        Some(StateFault::MalformedPersistedState { .. })
    ));
    assert_eq!(flow.value.completed_count(), 0);

    let earned = load_achievements(&store);
    assert!(earned.value.is_empty());
    assert!(earned.fault.is_some());

    // The next save overwrites the bad record.
    let mut pass = CreatorPass::new(store);
    pass.complete_step(Role::TeamLead, "install").unwrap();
    assert_eq!(
        pass.store().version(&DataKey::Onboarding(Role::TeamLead).as_key()),
        2
    );
}

#[test]
fn test_invalid_tier_key_is_reported() {
    let mut store = MemoryStore::new();
    store
        .set(storage::SUBSCRIPTION_KEY, r#"{"tier":"gold"}"#.into(), 0)
        .unwrap();

    let loaded = load_subscription(&store);
    assert_eq!(loaded.value.tier, TierKey::Free);
    assert_eq!(loaded.fault, Some(StateFault::InvalidTierKey("gold".into())));
}

#[test]
fn test_upgrade_over_corrupted_subscription() {
    let mut store = MemoryStore::new();
    store
        .set(storage::SUBSCRIPTION_KEY, "[1,2,3]".into(), 0)
        .unwrap();
    let mut pass = CreatorPass::new(store);
    assert_eq!(pass.tier(), TierKey::Free);

    let now = Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap();
    pass.grant_tier_upgrade(TierKey::Legacy, BillingCycle::Yearly, now)
        .unwrap();

    assert_eq!(pass.tier(), TierKey::Legacy);
    assert_eq!(pass.store().version(storage::SUBSCRIPTION_KEY), 2);
}

#[test]
fn test_missing_credits_use_tier_allotment() {
    let store = MemoryStore::new();
    let loaded = load_credits(&store, TierKey::Pro, today());

    assert_eq!(loaded.version, 0);
    assert!(loaded.fault.is_none());
    assert_eq!(loaded.value.total, 2_500);
    assert_eq!(
        loaded.value.reset_date,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    );
}
