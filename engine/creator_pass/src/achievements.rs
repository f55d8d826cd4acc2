//! # Achievements
//!
//! Unlock rules live in one declarative table, [`ACHIEVEMENTS`], evaluated
//! in table order after every progress transition or tier change. Results
//! are unioned into the earned set, so evaluation is idempotent and the set
//! only grows. The only way to shrink it is [`EarnedAchievements::clear`],
//! reached from an explicit user reset.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::progress::Flow;
use crate::types::{SubscriptionRecord, TierKey};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AchievementId {
    FirstInstall,
    FirstAuth,
    FirstGeneration,
    FirstClient,
    OnboardingComplete,
    AutomationSetup,
    UpgradedTier,
}

impl AchievementId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstInstall => "first-install",
            Self::FirstAuth => "first-auth",
            Self::FirstGeneration => "first-generation",
            Self::FirstClient => "first-client",
            Self::OnboardingComplete => "onboarding-complete",
            Self::AutomationSetup => "automation-setup",
            Self::UpgradedTier => "upgraded-tier",
        }
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State a rule may inspect.
pub struct MilestoneContext<'a> {
    /// The flow that just changed, if the trigger was a step transition.
    pub flow: Option<&'a Flow>,
    pub subscription: &'a SubscriptionRecord,
    pub earned: &'a EarnedAchievements,
}

impl MilestoneContext<'_> {
    fn completed(&self, step_id: &str) -> bool {
        self.flow.is_some_and(|flow| flow.has_completed(step_id))
    }
}

pub struct Achievement {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    rule: fn(&MilestoneContext<'_>) -> bool,
}

impl Achievement {
    pub fn is_unlocked_by(&self, ctx: &MilestoneContext<'_>) -> bool {
        (self.rule)(ctx)
    }
}

pub static ACHIEVEMENTS: [Achievement; 7] = [
    Achievement {
        id: AchievementId::FirstInstall,
        title: "CLI Novice",
        description: "Installed Vauntico CLI",
        rule: |ctx| ctx.completed("install") && ctx.completed("auth"),
    },
    Achievement {
        id: AchievementId::FirstAuth,
        title: "Authenticated",
        description: "Connected your account",
        rule: |ctx| ctx.completed("auth"),
    },
    Achievement {
        id: AchievementId::FirstGeneration,
        title: "Dream Weaver",
        description: "Generated your first content",
        rule: |ctx| ctx.completed("first-gen"),
    },
    Achievement {
        id: AchievementId::FirstClient,
        title: "Agency Pioneer",
        description: "Onboarded your first client",
        rule: |ctx| ctx.completed("onboard-client"),
    },
    Achievement {
        id: AchievementId::OnboardingComplete,
        title: "CLI Master",
        description: "Completed full onboarding",
        rule: |ctx| ctx.flow.is_some_and(Flow::is_finished),
    },
    Achievement {
        id: AchievementId::AutomationSetup,
        title: "Automation Architect",
        description: "Setup automated workflows",
        rule: |ctx| ctx.completed("automation"),
    },
    Achievement {
        id: AchievementId::UpgradedTier,
        title: "Ascended",
        description: "Upgraded your Creator Pass tier",
        rule: |ctx| {
            ctx.subscription.subscribed_at.is_some() && ctx.subscription.tier != TierKey::Free
        },
    },
];

pub fn achievement(id: AchievementId) -> &'static Achievement {
    let index = match id {
        AchievementId::FirstInstall => 0,
        AchievementId::FirstAuth => 1,
        AchievementId::FirstGeneration => 2,
        AchievementId::FirstClient => 3,
        AchievementId::OnboardingComplete => 4,
        AchievementId::AutomationSetup => 5,
        AchievementId::UpgradedTier => 6,
    };
    &ACHIEVEMENTS[index]
}

/// The persisted `achievements` set.
///
/// Ids written by other surfaces are kept verbatim, so loading and saving
/// never drops an earned badge this engine does not know about.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EarnedAchievements(BTreeSet<String>);

impl EarnedAchievements {
    pub fn contains(&self, id: AchievementId) -> bool {
        self.0.contains(id.as_str())
    }

    /// Returns `true` if the id was not already earned.
    pub fn insert(&mut self, id: AchievementId) -> bool {
        self.0.insert(id.as_str().to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_superset(&self, other: &EarnedAchievements) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Explicit user reset.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<AchievementId> for EarnedAchievements {
    fn from_iter<I: IntoIterator<Item = AchievementId>>(iter: I) -> Self {
        Self(iter.into_iter().map(|id| id.as_str().to_string()).collect())
    }
}

/// Rules that hold for `ctx` but are not yet earned, in table order.
pub fn evaluate(ctx: &MilestoneContext<'_>) -> Vec<AchievementId> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !ctx.earned.contains(a.id) && a.is_unlocked_by(ctx))
        .map(|a| a.id)
        .collect()
}

/// Evaluate every rule and union the result into `earned`. Returns the ids
/// that were newly unlocked.
pub fn unlock(
    earned: &mut EarnedAchievements,
    flow: Option<&Flow>,
    subscription: &SubscriptionRecord,
) -> Vec<AchievementId> {
    let newly = evaluate(&MilestoneContext {
        flow,
        subscription,
        earned: &*earned,
    });
    for id in &newly {
        earned.insert(*id);
    }
    newly
}

/// Render-ready badge view.
#[derive(Clone, Debug, Serialize)]
pub struct Badge {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub earned: bool,
}

pub fn badges(earned: &EarnedAchievements) -> Vec<Badge> {
    ACHIEVEMENTS
        .iter()
        .map(|a| Badge {
            id: a.id,
            title: a.title,
            description: a.description,
            earned: earned.contains(a.id),
        })
        .collect()
}
