//! Axum REST API handlers.
//!
//! Every handler runs one engine call against a fresh snapshot of the
//! `records` table and commits the result before answering; see
//! [`transact`].

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use creator_pass::achievements::{self, AchievementId, Badge};
use creator_pass::credits::CreditSummary;
use creator_pass::events::PassEvent;
use creator_pass::progress::FlowSummary;
use creator_pass::recommend::Recommendation;
use creator_pass::tiers::{self, ScrollAccess, Tier};
use creator_pass::trust::{self, ProfileAnswers, Tip, TrustScoreInputs, TrustScoreResult};
use creator_pass::{BillingCycle, CreatorPass, MemoryStore, Role, SubscriptionRecord, TierKey};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db;
use crate::dispatcher;
use crate::errors::{DaemonError, Result};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

type Pass<'a> = CreatorPass<&'a mut MemoryStore, &'a mut Vec<PassEvent>>;

/// Load a snapshot, run `f` against it, then commit the writes and queued
/// events. Engine errors abort before anything is written.
async fn transact<T, F>(pool: &SqlitePool, f: F) -> Result<T>
where
    F: FnOnce(&mut Pass<'_>) -> std::result::Result<T, creator_pass::Error>,
{
    let mut snapshot = db::load_snapshot(pool).await?;
    let mut events = Vec::new();
    let value = {
        let mut pass = CreatorPass::with_sink(snapshot.store_mut(), &mut events);
        f(&mut pass)?
    };
    db::commit(pool, &snapshot.changes(), &events).await?;
    Ok(value)
}

fn parse_role(raw: &str) -> Result<Role> {
    Role::parse(raw).ok_or_else(|| DaemonError::UnknownRole(raw.to_string()))
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub pending_events: i64,
}

#[derive(Debug, Serialize)]
pub struct TierResponse {
    pub subscription: SubscriptionRecord,
    pub tier: &'static Tier,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub tier: TierKey,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub resource_tier: TierKey,
    pub user_tier: TierKey,
    pub allowed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollsResponse {
    pub tier: TierKey,
    pub unlocking_tier: Option<TierKey>,
    pub scrolls: Vec<ScrollAccess>,
}

#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    pub cost: u64,
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub progress: FlowSummary,
    pub unlocked: Vec<AchievementId>,
}

#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    pub earned: Vec<String>,
    pub badges: Vec<Badge>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub role: Role,
    pub count: usize,
    pub recommendations: Vec<Recommendation>,
}

/// Either the calculator's form answers or raw numeric inputs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TrustScoreRequest {
    Answers(ProfileAnswers),
    Inputs(TrustScoreInputs),
}

#[derive(Debug, Serialize)]
pub struct TrustScoreResponse {
    #[serde(flatten)]
    pub result: TrustScoreResult,
    pub tips: &'static [Tip],
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health(State(state): State<Arc<ApiState>>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pending_events: db::count_pending(&state.pool, dispatcher::MAX_ATTEMPTS).await?,
    }))
}

/// `GET /tier`
pub async fn get_tier(State(state): State<Arc<ApiState>>) -> Result<Json<TierResponse>> {
    let subscription = transact(&state.pool, |pass| Ok(pass.subscription())).await?;
    Ok(Json(TierResponse {
        tier: tiers::tier(subscription.tier),
        subscription,
    }))
}

/// `POST /tier/upgrade`
///
/// Applies a tier already paid for through checkout.
pub async fn upgrade_tier(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<UpgradeRequest>,
) -> Result<Json<CreditSummary>> {
    let balance = transact(&state.pool, |pass| {
        pass.grant_tier_upgrade(req.tier, req.billing_cycle, Utc::now())
    })
    .await?;
    Ok(Json(balance.into()))
}

/// `GET /access/:tier`
///
/// The path names the resource being asked about, so an unknown key is a
/// bad lookup (404) rather than free content. Stored tier keys still fall
/// back to `free`.
pub async fn get_access(
    State(state): State<Arc<ApiState>>,
    Path(raw_tier): Path<String>,
) -> Result<Json<AccessResponse>> {
    let resource_tier =
        TierKey::parse(&raw_tier).ok_or_else(|| DaemonError::UnknownTier(raw_tier.clone()))?;
    let user_tier = transact(&state.pool, |pass| Ok(pass.tier())).await?;
    Ok(Json(AccessResponse {
        resource_tier,
        user_tier,
        allowed: tiers::can_access(resource_tier, user_tier),
    }))
}

/// `GET /scrolls`
pub async fn get_scrolls(State(state): State<Arc<ApiState>>) -> Result<Json<ScrollsResponse>> {
    let (tier, scrolls) =
        transact(&state.pool, |pass| Ok((pass.tier(), pass.scroll_access()))).await?;
    Ok(Json(ScrollsResponse {
        tier,
        unlocking_tier: tiers::unlocking_tier(tier),
        scrolls,
    }))
}

/// `GET /credits`
///
/// A due monthly reset is applied and persisted on read.
pub async fn get_credits(State(state): State<Arc<ApiState>>) -> Result<Json<CreditSummary>> {
    let today = Utc::now().date_naive();
    let balance = transact(&state.pool, |pass| pass.credits(today)).await?;
    Ok(Json(balance.into()))
}

/// `POST /credits/consume`
pub async fn consume_credits(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<ConsumeRequest>,
) -> Result<Json<CreditSummary>> {
    let today = Utc::now().date_naive();
    let balance = transact(&state.pool, |pass| pass.consume_credits(req.cost, today)).await?;
    Ok(Json(balance.into()))
}

/// `GET /onboarding/:role`
pub async fn get_progress(
    State(state): State<Arc<ApiState>>,
    Path(role): Path<String>,
) -> Result<Json<FlowSummary>> {
    let role = parse_role(&role)?;
    let flow = transact(&state.pool, |pass| Ok(pass.progress(role))).await?;
    Ok(Json(flow.into()))
}

/// `POST /onboarding/:role/steps/:step/complete`
pub async fn complete_step(
    State(state): State<Arc<ApiState>>,
    Path((role, step)): Path<(String, String)>,
) -> Result<Json<StepResponse>> {
    let role = parse_role(&role)?;
    let outcome = transact(&state.pool, |pass| pass.complete_step(role, &step)).await?;
    Ok(Json(StepResponse {
        progress: outcome.flow.into(),
        unlocked: outcome.unlocked,
    }))
}

/// `POST /onboarding/:role/steps/:step/skip`
pub async fn skip_step(
    State(state): State<Arc<ApiState>>,
    Path((role, step)): Path<(String, String)>,
) -> Result<Json<StepResponse>> {
    let role = parse_role(&role)?;
    let outcome = transact(&state.pool, |pass| pass.skip_step(role, &step)).await?;
    Ok(Json(StepResponse {
        progress: outcome.flow.into(),
        unlocked: outcome.unlocked,
    }))
}

/// `DELETE /onboarding/:role`
pub async fn reset_progress(
    State(state): State<Arc<ApiState>>,
    Path(role): Path<String>,
) -> Result<Json<FlowSummary>> {
    let role = parse_role(&role)?;
    let flow = transact(&state.pool, |pass| pass.reset_progress(role)).await?;
    Ok(Json(flow.into()))
}

/// `GET /achievements`
pub async fn get_achievements(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<AchievementsResponse>> {
    let earned = transact(&state.pool, |pass| Ok(pass.achievements())).await?;
    Ok(Json(AchievementsResponse {
        badges: achievements::badges(&earned),
        earned: earned.iter().map(String::from).collect(),
    }))
}

/// `DELETE /achievements`
pub async fn reset_achievements(State(state): State<Arc<ApiState>>) -> Result<StatusCode> {
    transact(&state.pool, |pass| pass.reset_achievements()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /recommendations/:role`
pub async fn get_recommendations(
    State(state): State<Arc<ApiState>>,
    Path(role): Path<String>,
) -> Result<Json<RecommendationsResponse>> {
    let role = parse_role(&role)?;
    let today = Utc::now().date_naive();
    let recommendations =
        transact(&state.pool, |pass| Ok(pass.recommendations(role, today))).await?;
    Ok(Json(RecommendationsResponse {
        role,
        count: recommendations.len(),
        recommendations,
    }))
}

/// `POST /trust-score`
///
/// Pure computation; nothing is read or written.
pub async fn post_trust_score(Json(req): Json<TrustScoreRequest>) -> Json<TrustScoreResponse> {
    let inputs: TrustScoreInputs = match req {
        TrustScoreRequest::Answers(answers) => answers.into(),
        TrustScoreRequest::Inputs(inputs) => inputs,
    };
    let result = trust::compute(&inputs);
    Json(TrustScoreResponse {
        tips: trust::guidance(result.score),
        result,
    })
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
