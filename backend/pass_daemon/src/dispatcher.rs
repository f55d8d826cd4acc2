//! Long-running background task that drains the outbox into the analytics
//! collector. Nothing here touches engine records.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::analytics;
use crate::config::Config;
use crate::db;

/// Events are abandoned after this many failed ticks.
pub const MAX_ATTEMPTS: u32 = 5;
/// Delivered events are kept this long, then pruned.
pub const DELIVERED_RETENTION_SECS: i64 = 7 * 24 * 60 * 60;

pub struct DispatcherState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Spawn the dispatcher loop as a background [`tokio`] task.
pub async fn run(state: Arc<DispatcherState>) {
    let Some(url) = state.config.analytics_url.clone() else {
        info!("ANALYTICS_URL not set; events stay in the outbox");
        return;
    };
    info!("Dispatcher starting, collector: {url}");

    loop {
        match dispatch_once(&state.pool, &state.client, &url, state.config.dispatch_batch_size)
            .await
        {
            Ok((0, 0)) => {}
            Ok((sent, failed)) => info!("Dispatched {sent} events ({failed} failed)"),
            Err(e) => error!("Dispatcher tick error: {e}"),
        }

        let cutoff = Utc::now().timestamp() - DELIVERED_RETENTION_SECS;
        match db::prune_delivered(&state.pool, cutoff).await {
            Ok(0) => {}
            Ok(pruned) => info!("Pruned {pruned} delivered events"),
            Err(e) => error!("Outbox prune error: {e}"),
        }

        tokio::time::sleep(Duration::from_secs(state.config.dispatch_interval_secs)).await;
    }
}

/// Perform a single drain iteration.
///
/// Returns `(delivered, failed)`.
async fn dispatch_once(
    pool: &SqlitePool,
    client: &Client,
    url: &str,
    batch_size: u32,
) -> crate::errors::Result<(usize, usize)> {
    let pending = db::fetch_pending(pool, batch_size, MAX_ATTEMPTS).await?;
    let (mut sent, mut failed) = (0, 0);

    for record in &pending {
        match analytics::send_event(client, url, record).await {
            Ok(()) => {
                db::mark_delivered(pool, record.id).await?;
                sent += 1;
            }
            Err(e) => {
                warn!(id = record.id, attempts = record.attempts + 1, "{e}");
                db::mark_failed(pool, record.id, &e.to_string()).await?;
                failed += 1;
            }
        }
    }

    Ok((sent, failed))
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
