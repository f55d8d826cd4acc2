//! Outbox rows for analytics events raised by the engine.

use creator_pass::events::PassEvent;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// An engine event encoded for the `outbox` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutboxEvent {
    pub event_type: &'static str,
    pub payload: String,
}

impl NewOutboxEvent {
    pub fn encode(event: &PassEvent) -> Result<Self> {
        Ok(Self {
            event_type: event.name(),
            payload: serde_json::to_string(event)?,
        })
    }
}

/// A row as stored in / read from the `outbox` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OutboxRecord {
    pub id: i64,
    pub event_type: String,
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub delivered_at: Option<i64>,
}
