//! Database layer: migrations, versioned record commits, and the outbox.

use std::str::FromStr;

use chrono::Utc;
use creator_pass::events::PassEvent;
use creator_pass::storage::{Record, StaleWrite};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::errors::Result;
use crate::events::{NewOutboxEvent, OutboxRecord};
use crate::store::{Change, Snapshot};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // Every connection to `:memory:` opens its own empty database.
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────

/// Read every record into a request snapshot.
pub async fn load_snapshot(pool: &SqlitePool) -> Result<Snapshot> {
    let rows: Vec<(String, String, i64)> =
        sqlx::query_as("SELECT key, value, version FROM records")
            .fetch_all(pool)
            .await?;

    Ok(Snapshot::new(rows.into_iter().map(|(key, value, version)| {
        (
            key,
            Record {
                value,
                version: version as u64,
            },
        )
    })))
}

/// Apply a request's writes and queue its events in one transaction.
///
/// Each change only lands if the stored version still equals the version the
/// request read. The first mismatch aborts the whole commit with
/// [`StaleWrite`], leaving both tables untouched.
pub async fn commit(pool: &SqlitePool, changes: &[Change], events: &[PassEvent]) -> Result<()> {
    if changes.is_empty() && events.is_empty() {
        return Ok(());
    }

    let now = Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    for change in changes {
        let rows_affected = if change.read_version == 0 {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO records (key, value, version, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&change.key)
            .bind(&change.value)
            .bind(change.new_version as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        } else {
            sqlx::query(
                r#"
                UPDATE records
                SET    value = ?1, version = ?2, updated_at = ?3
                WHERE  key = ?4 AND version = ?5
                "#,
            )
            .bind(&change.value)
            .bind(change.new_version as i64)
            .bind(now)
            .bind(&change.key)
            .bind(change.read_version as i64)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        };

        if rows_affected == 0 {
            let found: Option<(i64,)> = sqlx::query_as("SELECT version FROM records WHERE key = ?1")
                .bind(&change.key)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(StaleWrite {
                key: change.key.clone(),
                expected: change.read_version,
                found: found.map_or(0, |(v,)| v as u64),
            }
            .into());
        }
    }

    for event in events {
        let encoded = NewOutboxEvent::encode(event)?;
        sqlx::query("INSERT INTO outbox (event_type, payload, created_at) VALUES (?1, ?2, ?3)")
            .bind(encoded.event_type)
            .bind(&encoded.payload)
            .bind(now)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    debug!(
        records = changes.len(),
        events = events.len(),
        "request committed"
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Outbox
// ─────────────────────────────────────────────────────────

/// Undelivered events that have not exhausted their attempts, oldest first.
pub async fn fetch_pending(
    pool: &SqlitePool,
    limit: u32,
    max_attempts: u32,
) -> Result<Vec<OutboxRecord>> {
    let rows = sqlx::query_as::<_, OutboxRecord>(
        r#"
        SELECT id, event_type, payload, attempts, last_error, created_at, delivered_at
        FROM   outbox
        WHERE  delivered_at IS NULL AND attempts < ?1
        ORDER  BY id ASC
        LIMIT  ?2
        "#,
    )
    .bind(max_attempts)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn mark_delivered(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE outbox SET delivered_at = ?1 WHERE id = ?2")
        .bind(Utc::now().timestamp())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_failed(pool: &SqlitePool, id: i64, error: &str) -> Result<()> {
    sqlx::query("UPDATE outbox SET attempts = attempts + 1, last_error = ?1 WHERE id = ?2")
        .bind(error)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Number of events still waiting for delivery. Abandoned events are not
/// counted.
pub async fn count_pending(pool: &SqlitePool, max_attempts: u32) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM outbox WHERE delivered_at IS NULL AND attempts < ?1",
    )
    .bind(max_attempts)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Delete delivered events at or before `cutoff` (unix seconds).
pub async fn prune_delivered(pool: &SqlitePool, cutoff: i64) -> Result<u64> {
    let result =
        sqlx::query("DELETE FROM outbox WHERE delivered_at IS NOT NULL AND delivered_at <= ?1")
            .bind(cutoff)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
