use crate::achievements::AchievementId;
use crate::events::PassEvent;
use crate::invariants::{assert_achievements_monotonic, assert_sequential, assert_valid_step_states};
use crate::progress::{steps_for, Flow, OnboardingRecord, ProgressBand, TransitionRejection};
use crate::storage::{self, Store};
use crate::{CreatorPass, Error, MemoryStore, Role, StepState};

fn rejection(result: Result<(), Error>) -> TransitionRejection {
    match result {
        Err(Error::InvalidStepTransition { reason, .. }) => reason,
        other => panic!("expected a rejected transition, got {other:?}"),
    }
}

#[test]
fn test_new_flow_is_all_pending() {
    for role in Role::ALL {
        let flow = Flow::new(role);
        assert_eq!(flow.total_steps(), steps_for(role).len());
        assert!(flow.steps.iter().all(|s| s.state == StepState::Pending));
        assert_eq!(flow.percent_complete(), 0);
        assert_eq!(flow.status_band(), ProgressBand::NotStarted);
        assert_eq!(flow.current_step().map(|s| s.id), Some("install"));
    }
}

#[test]
fn test_steps_complete_in_order() {
    let mut flow = Flow::new(Role::SoloCreator);
    let before = flow.clone();

    flow.complete("install").unwrap();
    flow.complete("auth").unwrap();

    assert_valid_step_states(&before, &flow);
    assert_sequential(&flow);
    assert_eq!(flow.completed_count(), 2);
    assert_eq!(flow.percent_complete(), 40);
    assert_eq!(flow.status_band(), ProgressBand::MakingProgress);
    assert_eq!(flow.current_step().map(|s| s.id), Some("profile"));
}

#[test]
fn test_out_of_order_is_rejected() {
    let mut flow = Flow::new(Role::TeamLead);
    assert_eq!(
        rejection(flow.complete("team-setup")),
        TransitionRejection::OutOfOrder
    );
    assert_eq!(flow, Flow::new(Role::TeamLead));
}

#[test]
fn test_unknown_step_is_rejected() {
    let mut flow = Flow::new(Role::TeamLead);
    assert_eq!(
        rejection(flow.complete("onboard-client")),
        TransitionRejection::UnknownStep
    );
}

#[test]
fn test_completed_step_is_terminal() {
    let mut flow = Flow::new(Role::Agency);
    flow.complete("install").unwrap();

    assert_eq!(
        rejection(flow.complete("install")),
        TransitionRejection::AlreadyResolved
    );
    assert_eq!(flow.state_of("install"), Some(StepState::Completed));
}

#[test]
fn test_required_step_cannot_be_skipped() {
    let mut flow = Flow::new(Role::Agency);
    assert_eq!(rejection(flow.skip("install")), TransitionRejection::NotOptional);
    assert_eq!(flow.state_of("install"), Some(StepState::Pending));
}

#[test]
fn test_optional_steps_can_be_skipped() {
    let mut flow = Flow::new(Role::Agency);
    for id in ["install", "auth", "agency-mode", "onboard-client", "run-audit"] {
        flow.complete(id).unwrap();
    }
    assert!(!flow.is_finished());

    flow.skip("branding").unwrap();
    flow.complete("automation").unwrap();

    assert!(flow.is_finished());
    assert_eq!(flow.skipped_count(), 1);
    // Skipped steps do not count toward completion.
    assert_eq!(flow.percent_complete(), 86);
    assert_eq!(flow.status_band(), ProgressBand::AlmostThere);
    assert!(flow.current_step().is_none());
    assert_eq!(
        rejection(flow.complete("branding")),
        TransitionRejection::AlreadyResolved
    );
}

#[test]
fn test_can_visit_only_up_to_first_pending() {
    let mut flow = Flow::new(Role::SoloCreator);
    flow.complete("install").unwrap();

    assert!(flow.can_visit(0));
    assert!(flow.can_visit(1));
    assert!(!flow.can_visit(2));
    assert!(!flow.can_visit(99));
}

#[test]
fn test_record_round_trip_keeps_states() {
    let mut flow = Flow::new(Role::SoloCreator);
    for id in ["install", "auth", "profile", "first-gen"] {
        flow.complete(id).unwrap();
    }
    flow.skip("templates").unwrap();

    let record = flow.to_record();
    assert_eq!(record.skipped, vec!["templates".to_string()]);
    assert_eq!(Flow::from_record(Role::SoloCreator, &record), flow);
}

#[test]
fn test_from_record_drops_bad_entries() {
    let record = OnboardingRecord {
        completed: vec!["install".into(), "ghost-step".into()],
        skipped: vec!["auth".into(), "install".into()],
    };
    let flow = Flow::from_record(Role::SoloCreator, &record);

    assert_eq!(flow.state_of("install"), Some(StepState::Completed));
    assert_eq!(flow.state_of("auth"), Some(StepState::Pending));
    assert!(flow.step("ghost-step").is_none());
}

#[test]
fn test_from_record_reopens_steps_past_a_gap() {
    let record = OnboardingRecord {
        completed: vec!["auth".into(), "profile".into()],
        skipped: vec![],
    };
    let flow = Flow::from_record(Role::SoloCreator, &record);

    assert_sequential(&flow);
    assert_eq!(flow.completed_count(), 0);
    assert_eq!(flow.current_step().map(|s| s.id), Some("install"));
}

#[test]
fn test_out_of_order_record_is_repaired_on_next_save() {
    let mut store = MemoryStore::new();
    let key = storage::DataKey::Onboarding(Role::Agency).as_key();
    store
        .set(&key, r#"{"completed":["auth","run-audit"],"skipped":["branding"]}"#.to_string(), 0)
        .unwrap();
    let mut pass = CreatorPass::new(store);

    pass.complete_step(Role::Agency, "install").unwrap();

    let saved = storage::load_flow(pass.store(), Role::Agency).value.to_record();
    assert_eq!(saved.completed, vec!["install".to_string()]);
    assert!(saved.skipped.is_empty());
}

#[test]
fn test_rejected_transition_writes_nothing() {
    let mut pass = CreatorPass::new(MemoryStore::new());
    let key = storage::DataKey::Onboarding(Role::Agency).as_key();

    assert!(pass.skip_step(Role::Agency, "install").is_err());
    assert_eq!(pass.store().version(&key), 0);
}

#[test]
fn test_flows_are_independent_per_role() {
    let mut pass = CreatorPass::new(MemoryStore::new());
    pass.complete_step(Role::Agency, "install").unwrap();

    assert!(pass.progress(Role::Agency).has_completed("install"));
    assert!(!pass.progress(Role::SoloCreator).has_completed("install"));
}

#[test]
fn test_install_and_auth_unlock_first_badges() {
    let mut pass = CreatorPass::with_sink(MemoryStore::new(), Vec::new());

    let outcome = pass.complete_step(Role::SoloCreator, "install").unwrap();
    assert!(outcome.unlocked.is_empty());

    let outcome = pass.complete_step(Role::SoloCreator, "auth").unwrap();
    assert_eq!(
        outcome.unlocked,
        vec![AchievementId::FirstInstall, AchievementId::FirstAuth]
    );

    let (_, events) = pass.into_parts();
    let names: Vec<&str> = events.iter().map(PassEvent::name).collect();
    assert_eq!(names, vec!["achievement_unlocked", "achievement_unlocked"]);
}

#[test]
fn test_full_agency_flow_unlocks_chain() {
    let mut pass = CreatorPass::new(MemoryStore::new());
    let mut previous = pass.achievements();

    for id in ["install", "auth", "agency-mode", "onboard-client", "run-audit", "branding"] {
        pass.complete_step(Role::Agency, id).unwrap();
        let earned = pass.achievements();
        assert_achievements_monotonic(&previous, &earned);
        previous = earned;
    }
    let outcome = pass.skip_step(Role::Agency, "automation").unwrap();

    assert_eq!(outcome.unlocked, vec![AchievementId::OnboardingComplete]);
    let earned = pass.achievements();
    assert!(earned.contains(AchievementId::FirstClient));
    assert!(!earned.contains(AchievementId::AutomationSetup));
    assert!(!earned.contains(AchievementId::FirstGeneration));
}

#[test]
fn test_reset_progress_keeps_achievements() {
    let mut pass = CreatorPass::new(MemoryStore::new());
    pass.complete_step(Role::TeamLead, "install").unwrap();
    pass.complete_step(Role::TeamLead, "auth").unwrap();

    let flow = pass.reset_progress(Role::TeamLead).unwrap();

    assert_eq!(flow, Flow::new(Role::TeamLead));
    assert_eq!(pass.progress(Role::TeamLead), flow);
    assert!(pass.achievements().contains(AchievementId::FirstAuth));
}

#[test]
fn test_reset_achievements_clears_everything() {
    let mut pass = CreatorPass::new(MemoryStore::new());
    pass.complete_step(Role::TeamLead, "install").unwrap();
    pass.complete_step(Role::TeamLead, "auth").unwrap();

    pass.reset_achievements().unwrap();
    assert!(pass.achievements().is_empty());

    // Re-evaluation on the next transition earns them back.
    pass.complete_step(Role::TeamLead, "team-setup").unwrap();
    assert!(pass.achievements().contains(AchievementId::FirstInstall));
}

#[test]
fn test_unknown_earned_ids_survive_a_save() {
    let mut store = MemoryStore::new();
    store
        .set(
            storage::ACHIEVEMENTS_KEY,
            r#"["legacy-badge"]"#.to_string(),
            0,
        )
        .unwrap();
    let mut pass = CreatorPass::new(store);

    pass.complete_step(Role::SoloCreator, "install").unwrap();
    pass.complete_step(Role::SoloCreator, "auth").unwrap();

    let earned = pass.achievements();
    assert!(earned.iter().any(|id| id == "legacy-badge"));
    assert_eq!(earned.len(), 3);
}
