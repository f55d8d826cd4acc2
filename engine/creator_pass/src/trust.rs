//! # Trust score
//!
//! Deterministic creator trust score. The weighted sum below is the
//! canonical formula; it is not re-derived per call and carries no random
//! term.
//!
//! | Factor            | Contribution                                   |
//! |-------------------|------------------------------------------------|
//! | platform          | `platform_weight * 100 * 0.30`                 |
//! | followers         | `min(100, log10(followers + 1) * 20) * 0.25`   |
//! | engagement        | `engagement_score * 0.25`                      |
//! | content frequency | `content_frequency_score * 0.15`               |
//! | verification      | `verification_score * 0.05`                    |
//!
//! The rounded sum is clamped to `[0, 1000]` and labelled with
//! [`TrustTier::for_score`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const MAX_SCORE: u16 = 1000;

const PLATFORM_WEIGHT: f64 = 0.30;
const FOLLOWER_WEIGHT: f64 = 0.25;
const ENGAGEMENT_WEIGHT: f64 = 0.25;
const CONTENT_WEIGHT: f64 = 0.15;
const VERIFICATION_WEIGHT: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustScoreInputs {
    pub platform_weight: f64,
    pub followers: u64,
    /// 0..=100
    pub engagement_score: f64,
    /// 0..=100
    pub content_frequency_score: f64,
    /// 0..=100
    pub verification_score: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Platform,
    Followers,
    Engagement,
    ContentFrequency,
    Verification,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum TrustTier {
    Developing,
    Beginner,
    Intermediate,
    Advanced,
    Master,
}

impl TrustTier {
    pub fn for_score(score: u16) -> Self {
        match score {
            850.. => Self::Master,
            750.. => Self::Advanced,
            650.. => Self::Intermediate,
            500.. => Self::Beginner,
            _ => Self::Developing,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustScoreResult {
    pub score: u16,
    pub tier_label: TrustTier,
    pub breakdown: BTreeMap<Factor, f64>,
}

/// Scores outside `0..=100` (and NaN) are pulled back into range.
fn unit_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn follower_base(followers: u64) -> f64 {
    ((followers as f64 + 1.0).log10() * 20.0).min(100.0)
}

pub fn compute(inputs: &TrustScoreInputs) -> TrustScoreResult {
    let platform_weight = if inputs.platform_weight.is_finite() {
        inputs.platform_weight.max(0.0)
    } else {
        0.0
    };

    let breakdown = BTreeMap::from([
        (Factor::Platform, platform_weight * 100.0 * PLATFORM_WEIGHT),
        (
            Factor::Followers,
            follower_base(inputs.followers) * FOLLOWER_WEIGHT,
        ),
        (
            Factor::Engagement,
            unit_score(inputs.engagement_score) * ENGAGEMENT_WEIGHT,
        ),
        (
            Factor::ContentFrequency,
            unit_score(inputs.content_frequency_score) * CONTENT_WEIGHT,
        ),
        (
            Factor::Verification,
            unit_score(inputs.verification_score) * VERIFICATION_WEIGHT,
        ),
    ]);

    let sum: f64 = breakdown.values().sum();
    let score = sum.round().clamp(0.0, f64::from(MAX_SCORE)) as u16;

    TrustScoreResult {
        score,
        tier_label: TrustTier::for_score(score),
        breakdown,
    }
}

// ── Input catalogs ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Instagram,
    Tiktok,
    Twitter,
    Linkedin,
}

impl Platform {
    pub fn weight(&self) -> f64 {
        match self {
            Self::Youtube => 1.2,
            Self::Instagram => 1.0,
            Self::Tiktok => 1.1,
            Self::Twitter => 0.9,
            Self::Linkedin => 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngagementLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl EngagementLevel {
    pub fn score(&self) -> f64 {
        match self {
            Self::Low => 20.0,
            Self::Medium => 40.0,
            Self::High => 60.0,
            Self::VeryHigh => 80.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFrequency {
    Rare,
    Occasional,
    Regular,
    Frequent,
}

impl ContentFrequency {
    pub fn score(&self) -> f64 {
        match self {
            Self::Rare => 15.0,
            Self::Occasional => 30.0,
            Self::Regular => 50.0,
            Self::Frequent => 70.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationLevel {
    None,
    Basic,
    Advanced,
    Verified,
}

impl VerificationLevel {
    pub fn score(&self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Basic => 25.0,
            Self::Advanced => 50.0,
            Self::Verified => 75.0,
        }
    }
}

/// Calculator form answers, converted to raw inputs via [`From`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProfileAnswers {
    pub platform: Platform,
    pub followers: u64,
    pub engagement: EngagementLevel,
    pub content: ContentFrequency,
    pub verification: VerificationLevel,
}

impl From<ProfileAnswers> for TrustScoreInputs {
    fn from(answers: ProfileAnswers) -> Self {
        Self {
            platform_weight: answers.platform.weight(),
            followers: answers.followers,
            engagement_score: answers.engagement.score(),
            content_frequency_score: answers.content.score(),
            verification_score: answers.verification.score(),
        }
    }
}

// ── Guidance ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Tip {
    pub title: &'static str,
    pub description: &'static str,
}

const DEVELOPING_TIPS: [Tip; 2] = [
    Tip {
        title: "Focus on Consistency",
        description: "Post regularly and engage with your audience to build momentum",
    },
    Tip {
        title: "Grow Your Following",
        description: "Collaborate with other creators and use relevant hashtags",
    },
];

const GROWING_TIPS: [Tip; 2] = [
    Tip {
        title: "Optimize Content Strategy",
        description: "Analyze your top-performing content and create more like it",
    },
    Tip {
        title: "Get Verified",
        description: "Platform verification significantly boosts trust scores",
    },
];

const ESTABLISHED_TIPS: [Tip; 2] = [
    Tip {
        title: "Monetize Your Influence",
        description: "Your high trust score opens doors to premium opportunities",
    },
    Tip {
        title: "Join Vauntico Pro",
        description: "Advanced analytics and automation tools for top creators",
    },
];

pub fn guidance(score: u16) -> &'static [Tip] {
    match score {
        750.. => &ESTABLISHED_TIPS,
        500.. => &GROWING_TIPS,
        _ => &DEVELOPING_TIPS,
    }
}
