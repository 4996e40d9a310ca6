//! Retry store — the durable queue of pending redeliveries.
//!
//! Every operation is a single short statement against the `retry_queue`
//! table; no transaction is ever held across a delivery call. Mutations are
//! conditioned on the entry's current `attempts` value, which acts as an
//! optimistic-concurrency version: a reschedule or removal that returns
//! `false` means another scheduler pass claimed the entry first.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use relay_common::error::AppError;
use relay_common::types::{Channel, RetryQueueEntry};

pub struct RetryStore;

impl RetryStore {
    /// Insert a fresh entry with `attempts = 0`, due after the base delay.
    pub async fn enqueue(
        pool: &PgPool,
        channel: Channel,
        recipient: &str,
        body: &str,
        base_delay_secs: u64,
    ) -> Result<RetryQueueEntry, AppError> {
        let entry: RetryQueueEntry = sqlx::query_as(
            r#"
            INSERT INTO retry_queue (id, channel, recipient, body, attempts, next_retry_at)
            VALUES ($1, $2, $3, $4, 0, NOW() + $5 * INTERVAL '1 second')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(channel.to_string())
        .bind(recipient)
        .bind(body)
        .bind(base_delay_secs as i64)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            entry_id = %entry.id,
            channel = %channel,
            delay_secs = base_delay_secs,
            "Message queued for retry"
        );

        Ok(entry)
    }

    /// All entries due at `now` that still have attempts remaining, in no
    /// particular order. A plain read: calling twice without an intervening
    /// mutation returns the same entries.
    pub async fn due(
        pool: &PgPool,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<Vec<RetryQueueEntry>, AppError> {
        let entries: Vec<RetryQueueEntry> = sqlx::query_as(
            "SELECT * FROM retry_queue WHERE next_retry_at <= $1 AND attempts < $2",
        )
        .bind(now)
        .bind(max_attempts as i32)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Record a failed attempt: increment `attempts` and push `next_retry_at`
    /// out by `delay_secs`. Returns `false` if the entry was concurrently
    /// claimed (its `attempts` no longer matches) or no longer exists.
    pub async fn reschedule(
        pool: &PgPool,
        entry: &RetryQueueEntry,
        delay_secs: u64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE retry_queue
            SET attempts = attempts + 1, next_retry_at = NOW() + $1 * INTERVAL '1 second'
            WHERE id = $2 AND attempts = $3
            "#,
        )
        .bind(delay_secs as i64)
        .bind(entry.id)
        .bind(entry.attempts)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an entry. The compare on `attempts` makes this the claim that
    /// guards terminal transitions: at most one caller wins per version.
    pub async fn remove(pool: &PgPool, entry: &RetryQueueEntry) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM retry_queue WHERE id = $1 AND attempts = $2")
            .bind(entry.id)
            .bind(entry.attempts)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
