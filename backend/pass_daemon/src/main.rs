//! Creator Pass daemon: entry point.
//!
//! Persists the engine's key → JSON records in SQLite and serves the
//! engine's decisions to the front end over a loopback-only Axum REST API.
//! A background dispatcher drains queued analytics events to the collector.

mod analytics;
mod api;
mod config;
mod db;
mod dispatcher;
mod errors;
mod events;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use dispatcher::DispatcherState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    if !config.bind_addr.is_loopback() {
        warn!("BIND_ADDR {} is not a loopback address", config.bind_addr);
    }

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    // ─── Background dispatcher ────────────────────────────
    let dispatcher_state = Arc::new(DispatcherState {
        pool: pool.clone(),
        config: config.clone(),
        client,
    });
    tokio::spawn(dispatcher::run(dispatcher_state));

    // ─── REST API ─────────────────────────────────────────
    let api_state = Arc::new(api::ApiState { pool });

    let app = Router::new()
        .route("/health", get(api::health))
        .route("/tier", get(api::get_tier))
        .route("/tier/upgrade", post(api::upgrade_tier))
        .route("/access/:tier", get(api::get_access))
        .route("/scrolls", get(api::get_scrolls))
        .route("/credits", get(api::get_credits))
        .route("/credits/consume", post(api::consume_credits))
        .route(
            "/onboarding/:role",
            get(api::get_progress).delete(api::reset_progress),
        )
        .route(
            "/onboarding/:role/steps/:step/complete",
            post(api::complete_step),
        )
        .route("/onboarding/:role/steps/:step/skip", post(api::skip_step))
        .route(
            "/achievements",
            get(api::get_achievements).delete(api::reset_achievements),
        )
        .route("/recommendations/:role", get(api::get_recommendations))
        .route("/trust-score", post(api::post_trust_score))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(api_state);

    let addr = SocketAddr::new(config.bind_addr, config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
