//! Delivery log service — append-only audit trail of every send attempt.
//!
//! The log exposes no update or delete operation: later retries of the same
//! message append new rows (with their attempt number in `retry_count`)
//! instead of touching earlier ones, preserving audit integrity.

use sqlx::PgPool;
use uuid::Uuid;

use relay_common::error::AppError;
use relay_common::types::{Channel, DeliveryLogEntry, DeliveryOutcome};

pub struct DeliveryLog;

impl DeliveryLog {
    /// Append one attempt and return the persisted row.
    ///
    /// `retry_count` is the attempt number that produced this row: 0 for
    /// the immediate send, n for the n-th retry.
    pub async fn record(
        pool: &PgPool,
        channel: Channel,
        recipient: &str,
        body: &str,
        outcome: &DeliveryOutcome,
        retry_count: i32,
    ) -> Result<DeliveryLogEntry, AppError> {
        let entry: DeliveryLogEntry = sqlx::query_as(
            r#"
            INSERT INTO delivery_log (id, channel, recipient, body, status, details, retry_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(channel.to_string())
        .bind(recipient)
        .bind(body)
        .bind(outcome.status.to_string())
        .bind(&outcome.details)
        .bind(retry_count)
        .fetch_one(pool)
        .await?;

        tracing::debug!(
            entry_id = %entry.id,
            channel = %channel,
            status = %outcome.status,
            retry_count,
            "Delivery attempt recorded"
        );

        Ok(entry)
    }

    /// Most recent attempts, newest first.
    pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<DeliveryLogEntry>, AppError> {
        let entries: Vec<DeliveryLogEntry> =
            sqlx::query_as("SELECT * FROM delivery_log ORDER BY created_at DESC LIMIT $1")
                .bind(limit)
                .fetch_all(pool)
                .await?;

        Ok(entries)
    }
}
