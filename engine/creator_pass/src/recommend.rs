//! # Recommendations
//!
//! [`recommend`] is a pure function of role, tier, credits, progress and
//! achievements. Rules run in a fixed order:
//!
//! 1. bootstrap (nothing completed yet)
//! 2. role-specific nudges
//! 3. tier and credit nudges
//! 4. achievement chains
//! 5. exploration
//!
//! The result is stably sorted by priority, so entries in the same band keep
//! rule order and identical inputs always yield identical output.

use serde::Serialize;

use crate::achievements::{AchievementId, EarnedAchievements};
use crate::credits::{usage_status, UsageStatus};
use crate::progress::Flow;
use crate::types::{CreditBalance, Role, TierKey};

/// Completed steps needed before the exploration nudge.
pub const EXPLORATION_MIN_COMPLETED: usize = 3;
/// Earned achievements needed before the exploration nudge.
pub const EXPLORATION_MIN_ACHIEVEMENTS: usize = 2;

/// Declaration order is sort order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Setup,
    Learning,
    Creation,
    Growth,
    Automation,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Action,
    Scroll,
    Upgrade,
    Feature,
}

/// Which rule produced a recommendation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Bootstrap,
    Role,
    Tier,
    AchievementChain,
    Exploration,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: &'static str,
    pub priority: Priority,
    pub category: Category,
    pub kind: Kind,
    pub title: &'static str,
    pub description: &'static str,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_id: Option<&'static str>,
    pub condition: Condition,
}

struct Rec {
    id: &'static str,
    priority: Priority,
    category: Category,
    kind: Kind,
    title: &'static str,
    description: &'static str,
    action: &'static str,
    scroll_id: Option<&'static str>,
}

impl Rec {
    fn because(self, condition: Condition) -> Recommendation {
        Recommendation {
            id: self.id,
            priority: self.priority,
            category: self.category,
            kind: self.kind,
            title: self.title,
            description: self.description,
            action: self.action,
            scroll_id: self.scroll_id,
            condition,
        }
    }
}

pub fn recommend(
    role: Role,
    tier: TierKey,
    credits: &CreditBalance,
    progress: &Flow,
    achievements: &EarnedAchievements,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    // 1. Bootstrap
    if progress.completed_count() == 0 {
        recs.push(
            Rec {
                id: "start-onboarding",
                priority: Priority::High,
                category: Category::Setup,
                kind: Kind::Action,
                title: "Start Your CLI Journey",
                description: "Complete the onboarding flow to unlock powerful automation commands",
                action: "Start Onboarding",
                scroll_id: None,
            }
            .because(Condition::Bootstrap),
        );
    }

    // 2. Role
    match role {
        Role::Agency => {
            if !achievements.contains(AchievementId::FirstClient) {
                recs.push(
                    Rec {
                        id: "agency-first-client",
                        priority: Priority::High,
                        category: Category::Learning,
                        kind: Kind::Scroll,
                        title: "Agency Scroll",
                        description:
                            "Master client onboarding, white-label setups, and revenue models",
                        action: "Read Agency Scroll",
                        scroll_id: Some("10-agency-scroll"),
                    }
                    .because(Condition::Role),
                );
            }
            if matches!(tier, TierKey::Free | TierKey::Starter) {
                recs.push(
                    Rec {
                        id: "agency-upgrade-pro",
                        priority: Priority::Medium,
                        category: Category::Growth,
                        kind: Kind::Upgrade,
                        title: "Upgrade to Pro",
                        description:
                            "Get white-label rights and advanced CLI tools for agency scaling",
                        action: "View Pro Benefits",
                        scroll_id: None,
                    }
                    .because(Condition::Role),
                );
            }
        }
        Role::SoloCreator => {
            if !achievements.contains(AchievementId::FirstGeneration) {
                recs.push(
                    Rec {
                        id: "creator-first-gen",
                        priority: Priority::High,
                        category: Category::Creation,
                        kind: Kind::Action,
                        title: "Generate Your First Content",
                        description: "Use DreamMover to create your first AI-powered landing page",
                        action: "Open DreamMover",
                        scroll_id: None,
                    }
                    .because(Condition::Role),
                );
            }
            recs.push(
                Rec {
                    id: "creator-ascension",
                    priority: Priority::Medium,
                    category: Category::Learning,
                    kind: Kind::Scroll,
                    title: "Ascension Scroll",
                    description: "Deep dive into advanced automation and scaling strategies",
                    action: "Unlock Ascension Scroll",
                    scroll_id: Some("ASCENSION_SCROLL"),
                }
                .because(Condition::Role),
            );
        }
        Role::TeamLead => {
            recs.push(
                Rec {
                    id: "team-collaboration",
                    priority: Priority::High,
                    category: Category::Setup,
                    kind: Kind::Feature,
                    title: "Enable Team Features",
                    description:
                        "Set up vault sharing and collaborative workflows for your team",
                    action: "Configure Team",
                    scroll_id: None,
                }
                .because(Condition::Role),
            );
        }
    }

    // 3. Tier and credits
    match tier {
        TierKey::Free => recs.push(
            Rec {
                id: "unlock-full-library",
                priority: Priority::High,
                category: Category::Growth,
                kind: Kind::Upgrade,
                title: "Unlock Full Library",
                description:
                    "Access all scrolls, CLI tools, and premium features with Creator Pass",
                action: "Compare Tiers",
                scroll_id: None,
            }
            .because(Condition::Tier),
        ),
        // Agencies already got a role-specific upgrade nudge.
        TierKey::Starter if role != Role::Agency => recs.push(
            Rec {
                id: "upgrade-to-pro",
                priority: Priority::Medium,
                category: Category::Growth,
                kind: Kind::Upgrade,
                title: "Ascend to Pro",
                description: "Unlock pro scrolls, credit rollover, and advanced CLI tools",
                action: "View Pro Benefits",
                scroll_id: None,
            }
            .because(Condition::Tier),
        ),
        _ => {}
    }
    if tier != TierKey::Free && usage_status(credits) == UsageStatus::Critical {
        recs.push(
            Rec {
                id: "low-credits",
                priority: Priority::High,
                category: Category::Growth,
                kind: Kind::Upgrade,
                title: "Running Low on Credits",
                description: "Upgrade your tier to raise your monthly credit allotment",
                action: "Compare Tiers",
                scroll_id: None,
            }
            .because(Condition::Tier),
        );
    }

    // 4. Achievement chains
    if achievements.contains(AchievementId::OnboardingComplete)
        && !achievements.contains(AchievementId::AutomationSetup)
    {
        recs.push(
            Rec {
                id: "setup-automation",
                priority: Priority::Medium,
                category: Category::Automation,
                kind: Kind::Action,
                title: "Setup Automation",
                description: "Configure automated workflows to save time and scale efficiently",
                action: "Open Automation Tools",
                scroll_id: None,
            }
            .because(Condition::AchievementChain),
        );
    }

    // 5. Exploration
    if progress.completed_count() >= EXPLORATION_MIN_COMPLETED
        && achievements.len() >= EXPLORATION_MIN_ACHIEVEMENTS
    {
        recs.push(
            Rec {
                id: "explore-advanced",
                priority: Priority::Low,
                category: Category::Learning,
                kind: Kind::Scroll,
                title: "Explore Advanced Scrolls",
                description: "You're making great progress! Dive into specialized topics",
                action: "Browse Library",
                scroll_id: None,
            }
            .because(Condition::Exploration),
        );
    }

    // `sort_by_key` is stable: rule order survives within a priority band.
    recs.sort_by_key(|r| r.priority);
    recs
}
