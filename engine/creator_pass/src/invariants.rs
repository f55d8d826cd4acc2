#![allow(dead_code)]

use crate::achievements::EarnedAchievements;
use crate::progress::Flow;
use crate::tiers;
use crate::types::{CreditBalance, StepState};

/// INV-1: remaining == total + rollover - used, and never negative.
pub fn assert_balance_consistent(balance: &CreditBalance) {
    assert!(
        balance.is_consistent(),
        "INV-1 violated: remaining {} != total {} + rollover {} - used {}",
        balance.remaining,
        balance.total,
        balance.rollover,
        balance.used
    );
}

/// INV-2: `used` only grows between resets.
pub fn assert_used_monotonic(before: &CreditBalance, after: &CreditBalance) {
    if before.reset_date == after.reset_date {
        assert!(
            after.used >= before.used,
            "INV-2 violated: used decreased from {} to {} within a period",
            before.used,
            after.used
        );
    }
}

/// INV-3: tier ranks are strictly increasing in catalog order, starting at 0.
pub fn assert_rank_order() {
    let catalog = tiers::catalog();
    assert_eq!(catalog[0].rank, 0, "INV-3 violated: free rank is not 0");
    for pair in catalog.windows(2) {
        assert!(
            pair[0].rank < pair[1].rank,
            "INV-3 violated: {} rank {} !< {} rank {}",
            pair[0].key,
            pair[0].rank,
            pair[1].key,
            pair[1].rank
        );
    }
}

/// INV-4: the earned set never shrinks.
pub fn assert_achievements_monotonic(before: &EarnedAchievements, after: &EarnedAchievements) {
    assert!(
        after.is_superset(before),
        "INV-4 violated: achievements shrank from {:?} to {:?}",
        before,
        after
    );
}

/// INV-5: no step leaves a terminal state, and only optional steps are skipped.
pub fn assert_valid_step_states(before: &Flow, after: &Flow) {
    for (old, new) in before.steps.iter().zip(&after.steps) {
        assert_eq!(old.id, new.id, "INV-5 violated: step order changed");
        if old.state.is_resolved() {
            assert_eq!(
                old.state, new.state,
                "INV-5 violated: step {} left terminal state {:?}",
                old.id, old.state
            );
        }
        if new.state == StepState::Skipped {
            assert!(
                new.optional,
                "INV-5 violated: required step {} was skipped",
                new.id
            );
        }
    }
}

/// INV-6: every resolved step is preceded only by resolved steps.
pub fn assert_sequential(flow: &Flow) {
    let first_pending = flow
        .steps
        .iter()
        .position(|s| !s.state.is_resolved())
        .unwrap_or(flow.steps.len());
    for step in &flow.steps[first_pending..] {
        assert_eq!(
            step.state,
            StepState::Pending,
            "INV-6 violated: step {} resolved after a pending step",
            step.id
        );
    }
}
