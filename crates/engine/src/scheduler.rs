//! Retry scheduler — drains the retry queue on a fixed cadence.
//!
//! Each pass fetches due entries and processes them independently:
//! a delivered entry is removed, a failed one is rescheduled with a longer
//! back-off delay, and one whose attempts are exhausted is removed and
//! escalated to the operator. Every terminal transition is guarded by a
//! compare-and-claim on the entry's `attempts` version, so overlapping
//! passes cannot double-deliver a terminal transition (at most one
//! escalation per logical failure; duplicate sends remain possible, which
//! is the at-least-once posture).
//!
//! Policy values are re-read from the shared settings handle at the start
//! of every pass; a pass in progress keeps the snapshot it started with.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;

use relay_common::config::{RetryPolicy, RetrySettings};
use relay_common::error::AppError;
use relay_common::types::RetryQueueEntry;
use relay_notifier::escalation::exhaustion_summary;
use relay_notifier::{EscalateReport, NotifierRegistry};

use crate::backoff::delay_for_attempt;
use crate::delivery_log::DeliveryLog;
use crate::retry_store::RetryStore;

/// Counts of entry transitions performed in one scheduler pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub delivered: u32,
    pub rescheduled: u32,
    pub exhausted: u32,
    /// Entries left untouched this pass: infrastructure errors or claims
    /// lost to a concurrent pass.
    pub skipped: u32,
}

impl TickStats {
    pub fn is_empty(&self) -> bool {
        *self == TickStats::default()
    }
}

/// What one pass did with one due entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Delivered,
    Rescheduled,
    Exhausted,
    /// Another pass claimed the entry first; nothing left to do.
    Lost,
}

pub struct RetryScheduler {
    pool: PgPool,
    notifiers: Arc<NotifierRegistry>,
    reporter: Arc<dyn EscalateReport>,
    settings: RetrySettings,
}

impl RetryScheduler {
    pub fn new(
        pool: PgPool,
        notifiers: Arc<NotifierRegistry>,
        reporter: Arc<dyn EscalateReport>,
        settings: RetrySettings,
    ) -> Self {
        Self {
            pool,
            notifiers,
            reporter,
            settings,
        }
    }

    /// Run passes forever, sleeping the configured interval between them.
    /// The interval is re-read each iteration so it can change at runtime.
    pub async fn run(&self) {
        tracing::info!(
            interval_secs = self.settings.snapshot().tick_interval_secs,
            "Retry scheduler started"
        );

        loop {
            let interval = self.settings.snapshot().tick_interval_secs;
            tokio::time::sleep(Duration::from_secs(interval)).await;

            match self.tick().await {
                Ok(stats) if !stats.is_empty() => {
                    tracing::info!(
                        delivered = stats.delivered,
                        rescheduled = stats.rescheduled,
                        exhausted = stats.exhausted,
                        skipped = stats.skipped,
                        "Retry pass complete"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Retry pass failed");
                }
            }
        }
    }

    /// One scheduler pass over the due entries.
    ///
    /// An error while processing one entry never aborts the rest of the
    /// pass: the entry is logged and left as-is for the next pass, with no
    /// attempt increment (attempts count channel-reported failures only).
    pub async fn tick(&self) -> Result<TickStats, AppError> {
        let policy = self.settings.snapshot();
        let due = RetryStore::due(&self.pool, Utc::now(), policy.max_attempts).await?;

        let mut stats = TickStats::default();
        for entry in &due {
            match self.process_entry(entry, &policy).await {
                Ok(Transition::Delivered) => stats.delivered += 1,
                Ok(Transition::Rescheduled) => stats.rescheduled += 1,
                Ok(Transition::Exhausted) => stats.exhausted += 1,
                Ok(Transition::Lost) => stats.skipped += 1,
                Err(e) => {
                    stats.skipped += 1;
                    tracing::error!(
                        entry_id = %entry.id,
                        channel = %entry.channel,
                        error = %e,
                        "Retry attempt errored, entry left for next pass"
                    );
                }
            }
        }

        Ok(stats)
    }

    /// Process one due entry in isolation from the rest of the pass.
    ///
    /// The delivery call happens before any store mutation and outside any
    /// transaction. Terminal transitions claim the entry (compare-and-delete
    /// on its `attempts` version) before logging or escalating, so those
    /// side effects fire at most once per logical attempt.
    async fn process_entry(
        &self,
        entry: &RetryQueueEntry,
        policy: &RetryPolicy,
    ) -> Result<Transition, AppError> {
        let request = entry.to_request();
        let outcome = self.notifiers.send(&request).await?;

        // Attempt number this delivery represents: the immediate send was 0.
        let attempts_after = (entry.attempts + 1) as u32;

        if outcome.is_sent() {
            if !RetryStore::remove(&self.pool, entry).await? {
                return Ok(Transition::Lost);
            }
            DeliveryLog::record(
                &self.pool,
                entry.channel,
                &entry.recipient,
                &entry.body,
                &outcome,
                attempts_after as i32,
            )
            .await?;
            tracing::info!(
                entry_id = %entry.id,
                channel = %entry.channel,
                attempts = attempts_after,
                "Retry delivered"
            );
            return Ok(Transition::Delivered);
        }

        if !is_exhausted(attempts_after, policy) {
            let delay = delay_for_attempt(policy, attempts_after);
            if !RetryStore::reschedule(&self.pool, entry, delay).await? {
                return Ok(Transition::Lost);
            }
            DeliveryLog::record(
                &self.pool,
                entry.channel,
                &entry.recipient,
                &entry.body,
                &outcome,
                attempts_after as i32,
            )
            .await?;
            tracing::info!(
                entry_id = %entry.id,
                channel = %entry.channel,
                attempts = attempts_after,
                delay_secs = delay,
                "Retry failed, rescheduled"
            );
            return Ok(Transition::Rescheduled);
        }

        // Exhausted: the claim must precede escalation so that overlapping
        // passes produce at most one escalation for this failure.
        if !RetryStore::remove(&self.pool, entry).await? {
            return Ok(Transition::Lost);
        }

        let summary = exhaustion_summary(
            entry.channel,
            &entry.recipient,
            attempts_after,
            &entry.body,
        );
        if let Err(e) = self.reporter.escalate(&summary).await {
            // Best-effort: a failed escalation never re-enqueues the message.
            tracing::warn!(entry_id = %entry.id, error = %e, "Escalation failed");
        }

        DeliveryLog::record(
            &self.pool,
            entry.channel,
            &entry.recipient,
            &entry.body,
            &outcome,
            attempts_after as i32,
        )
        .await?;

        tracing::warn!(
            entry_id = %entry.id,
            channel = %entry.channel,
            attempts = attempts_after,
            "Retries exhausted, message escalated"
        );

        Ok(Transition::Exhausted)
    }
}

/// Whether the post-increment attempt count has used up the delivery
/// budget. Escalation fires exactly when this first becomes true.
fn is_exhausted(attempts_after: u32, policy: &RetryPolicy) -> bool {
    attempts_after >= policy.max_attempts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_boundary() {
        let policy = RetryPolicy {
            max_attempts: 4,
            ..RetryPolicy::default()
        };
        assert!(!is_exhausted(3, &policy), "attempt 3 still reschedules");
        assert!(is_exhausted(4, &policy), "attempt 4 escalates");
        assert!(is_exhausted(5, &policy));
    }

    #[test]
    fn test_tick_stats_empty() {
        assert!(TickStats::default().is_empty());
        let stats = TickStats {
            delivered: 1,
            ..TickStats::default()
        };
        assert!(!stats.is_empty());
    }
}
