use crate::trust::{
    compute, guidance, ContentFrequency, EngagementLevel, Factor, Platform, ProfileAnswers,
    TrustScoreInputs, TrustTier, VerificationLevel, MAX_SCORE,
};
use crate::{CreatorPass, MemoryStore};

fn inputs(
    weight: f64,
    followers: u64,
    engagement: f64,
    content: f64,
    verification: f64,
) -> TrustScoreInputs {
    TrustScoreInputs {
        platform_weight: weight,
        followers,
        engagement_score: engagement,
        content_frequency_score: content,
        verification_score: verification,
    }
}

#[test]
fn test_reference_profile_scores_74() {
    let result = compute(&inputs(1.0, 10_000, 60.0, 50.0, 25.0));

    assert_eq!(result.score, 74);
    assert_eq!(result.tier_label, TrustTier::Developing);
    assert!((result.breakdown[&Factor::Platform] - 30.0).abs() < 1e-9);
    assert!((result.breakdown[&Factor::Followers] - 20.0).abs() < 0.01);
    assert!((result.breakdown[&Factor::Engagement] - 15.0).abs() < 1e-9);
    assert!((result.breakdown[&Factor::ContentFrequency] - 7.5).abs() < 1e-9);
    assert!((result.breakdown[&Factor::Verification] - 1.25).abs() < 1e-9);
}

#[test]
fn test_score_is_deterministic() {
    let profile = inputs(1.2, 250_000, 80.0, 70.0, 75.0);
    assert_eq!(compute(&profile), compute(&profile));
}

#[test]
fn test_zero_profile_scores_zero() {
    let result = compute(&inputs(0.0, 0, 0.0, 0.0, 0.0));
    assert_eq!(result.score, 0);
    assert_eq!(result.tier_label, TrustTier::Developing);
}

#[test]
fn test_follower_factor_saturates() {
    let huge = compute(&inputs(0.0, u64::MAX, 0.0, 0.0, 0.0));
    assert!((huge.breakdown[&Factor::Followers] - 25.0).abs() < 1e-9);
}

#[test]
fn test_out_of_range_inputs_are_clamped() {
    let wild = compute(&inputs(f64::NAN, 0, 500.0, -20.0, f64::NAN));

    assert_eq!(wild.breakdown[&Factor::Platform], 0.0);
    assert_eq!(wild.breakdown[&Factor::Engagement], 25.0);
    assert_eq!(wild.breakdown[&Factor::ContentFrequency], 0.0);
    assert_eq!(wild.breakdown[&Factor::Verification], 0.0);
    assert_eq!(wild.score, 25);
}

#[test]
fn test_score_never_exceeds_max() {
    let extreme = compute(&inputs(1e12, u64::MAX, 100.0, 100.0, 100.0));
    assert_eq!(extreme.score, MAX_SCORE);
    assert_eq!(extreme.tier_label, TrustTier::Master);
}

#[test]
fn test_tier_label_thresholds() {
    assert_eq!(TrustTier::for_score(499), TrustTier::Developing);
    assert_eq!(TrustTier::for_score(500), TrustTier::Beginner);
    assert_eq!(TrustTier::for_score(650), TrustTier::Intermediate);
    assert_eq!(TrustTier::for_score(750), TrustTier::Advanced);
    assert_eq!(TrustTier::for_score(849), TrustTier::Advanced);
    assert_eq!(TrustTier::for_score(850), TrustTier::Master);
}

#[test]
fn test_profile_answers_map_to_inputs() {
    let answers = ProfileAnswers {
        platform: Platform::Instagram,
        followers: 10_000,
        engagement: EngagementLevel::High,
        content: ContentFrequency::Regular,
        verification: VerificationLevel::Basic,
    };
    let raw: TrustScoreInputs = answers.into();

    assert_eq!(raw, inputs(1.0, 10_000, 60.0, 50.0, 25.0));
    let pass = CreatorPass::new(MemoryStore::new());
    assert_eq!(pass.trust_score(&raw).score, 74);
}

#[test]
fn test_guidance_bands() {
    assert_eq!(guidance(74)[0].title, "Focus on Consistency");
    assert_eq!(guidance(500)[1].title, "Get Verified");
    assert_eq!(guidance(900)[0].title, "Monetize Your Influence");
}
