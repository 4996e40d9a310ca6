//! Immediate dispatch path for submitted notifications.
//!
//! The boundary the HTTP layer calls into:
//! 1. Reject structurally invalid requests before any delivery attempt
//! 2. Attempt the send through the channel registry
//! 3. Append the outcome to the delivery log
//! 4. On failure, queue the message for retry
//!
//! The caller always gets a definite sent/failed outcome for the immediate
//! attempt; later retry outcomes are visible only through the delivery log.

use std::sync::Arc;

use sqlx::PgPool;

use relay_common::config::RetrySettings;
use relay_common::error::AppError;
use relay_common::types::{DeliveryOutcome, NotificationRequest};
use relay_notifier::NotifierRegistry;

use crate::delivery_log::DeliveryLog;
use crate::retry_store::RetryStore;

pub struct Dispatcher {
    pool: PgPool,
    notifiers: Arc<NotifierRegistry>,
    settings: RetrySettings,
}

impl Dispatcher {
    pub fn new(pool: PgPool, notifiers: Arc<NotifierRegistry>, settings: RetrySettings) -> Self {
        Self {
            pool,
            notifiers,
            settings,
        }
    }

    /// Attempt immediate delivery, record the outcome, enqueue on failure.
    ///
    /// The delivery call runs before any store operation and outside any
    /// transaction. Store failures surface as errors; a channel that cannot
    /// deliver is a failed outcome, not an error.
    pub async fn submit(
        &self,
        request: &NotificationRequest,
    ) -> Result<DeliveryOutcome, AppError> {
        validate_request(request)?;

        let outcome = self.notifiers.send(request).await?;

        DeliveryLog::record(
            &self.pool,
            request.channel,
            &request.recipient,
            &request.body,
            &outcome,
            0,
        )
        .await?;

        if outcome.is_sent() {
            tracing::info!(
                channel = %request.channel,
                recipient = %request.recipient,
                "Message delivered"
            );
        } else {
            let policy = self.settings.snapshot();
            RetryStore::enqueue(
                &self.pool,
                request.channel,
                &request.recipient,
                &request.body,
                policy.base_delay_secs,
            )
            .await?;
            tracing::warn!(
                channel = %request.channel,
                recipient = %request.recipient,
                details = %outcome.details,
                "Immediate delivery failed, queued for retry"
            );
        }

        Ok(outcome)
    }
}

/// Reject structurally invalid requests. The channel itself is already a
/// closed enum, parsed (and unknown values rejected) at the HTTP boundary.
pub fn validate_request(request: &NotificationRequest) -> Result<(), AppError> {
    if request.recipient.trim().is_empty() {
        return Err(AppError::Validation("recipient must not be empty".into()));
    }
    if request.body.trim().is_empty() {
        return Err(AppError::Validation("body must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_common::types::Channel;

    fn request(recipient: &str, body: &str) -> NotificationRequest {
        NotificationRequest {
            channel: Channel::Email,
            recipient: recipient.into(),
            body: body.into(),
        }
    }

    #[test]
    fn test_valid_request_accepted() {
        assert!(validate_request(&request("user@example.com", "hello")).is_ok());
    }

    #[test]
    fn test_empty_recipient_rejected() {
        let err = validate_request(&request("  ", "hello")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_empty_body_rejected() {
        let err = validate_request(&request("user@example.com", "")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
