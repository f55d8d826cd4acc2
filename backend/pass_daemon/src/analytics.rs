//! Analytics collector client.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the collector rate-limits or fails
//!   with a server error, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transport errors (connection refused, timeout) are retried the same way.
//! * After [`MAX_RETRIES`] retries the event is handed back to the caller as
//!   failed; the outbox keeps it for a later tick.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{DaemonError, Result};
use crate::events::OutboxRecord;

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;
const MAX_RETRIES: u32 = 3;

/// Body posted to the collector, one event per request.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub event: String,
    pub properties: Value,
    /// Unix seconds at which the engine raised the event
    pub timestamp: i64,
    /// Outbox id, usable by the collector to drop duplicates
    pub insert_id: i64,
}

impl Envelope {
    pub fn from_record(record: &OutboxRecord) -> Result<Self> {
        Ok(Self {
            event: record.event_type.clone(),
            properties: serde_json::from_str(&record.payload)?,
            timestamp: record.created_at,
            insert_id: record.id,
        })
    }
}

/// Rate limits and server errors are worth another try; other statuses are not.
pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub fn next_backoff(current: u64) -> u64 {
    (current * 2).min(MAX_BACKOFF_SECS)
}

/// Deliver one outbox event.
pub async fn send_event(client: &Client, url: &str, record: &OutboxRecord) -> Result<()> {
    let envelope = Envelope::from_record(record)?;
    let mut backoff = INITIAL_BACKOFF_SECS;
    let mut retries = 0;

    loop {
        let failure = match client.post(url).json(&envelope).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(id = record.id, event = %record.event_type, "analytics event delivered");
                return Ok(());
            }
            Ok(resp) if !is_retryable(resp.status()) => {
                return Err(DaemonError::Delivery(format!(
                    "collector rejected event {} with {}",
                    record.id,
                    resp.status()
                )));
            }
            Ok(resp) => format!("collector answered {}", resp.status()),
            Err(e) => e.to_string(),
        };

        if retries >= MAX_RETRIES {
            return Err(DaemonError::Delivery(failure));
        }
        warn!("Analytics delivery failed (will retry in {backoff}s): {failure}");
        tokio::time::sleep(Duration::from_secs(backoff)).await;
        backoff = next_backoff(backoff);
        retries += 1;
    }
}
