//! Operator escalation — last-resort notification when retries are exhausted.
//!
//! Escalation is best-effort: a failure to reach the operator is logged and
//! never re-enqueues the original message or aborts a scheduler pass.

use std::sync::Arc;

use async_trait::async_trait;

use relay_common::error::AppError;
use relay_common::types::{Channel, NotificationRequest};

use crate::NotifierRegistry;

/// Maximum message-body characters included in an escalation summary.
const PREVIEW_CHARS: usize = 50;

/// Escalation contract consumed by the retry scheduler.
#[async_trait]
pub trait EscalateReport: Send + Sync {
    async fn escalate(&self, summary: &str) -> Result<(), AppError>;
}

/// Sends escalation summaries to the configured operator targets
/// (a Telegram chat and/or a Messenger PSID) through the channel registry.
pub struct OperatorReporter {
    registry: Arc<NotifierRegistry>,
    telegram_chat_id: Option<String>,
    facebook_psid: Option<String>,
}

impl OperatorReporter {
    pub fn new(
        registry: Arc<NotifierRegistry>,
        telegram_chat_id: Option<String>,
        facebook_psid: Option<String>,
    ) -> Self {
        Self {
            registry,
            telegram_chat_id,
            facebook_psid,
        }
    }

    fn targets(&self) -> Vec<(Channel, &str)> {
        let mut targets = Vec::new();
        if let Some(chat_id) = self.telegram_chat_id.as_deref() {
            targets.push((Channel::Telegram, chat_id));
        }
        if let Some(psid) = self.facebook_psid.as_deref() {
            targets.push((Channel::Facebook, psid));
        }
        targets
    }
}

#[async_trait]
impl EscalateReport for OperatorReporter {
    async fn escalate(&self, summary: &str) -> Result<(), AppError> {
        let targets = self.targets();
        if targets.is_empty() {
            tracing::warn!(summary, "No operator targets configured, escalation dropped");
            return Ok(());
        }

        let text = format!("⚠️ AlertRelay escalation:\n{summary}");

        for (channel, recipient) in targets {
            let request = NotificationRequest {
                channel,
                recipient: recipient.to_string(),
                body: text.clone(),
            };
            match self.registry.send(&request).await {
                Ok(outcome) if outcome.is_sent() => {
                    tracing::info!(channel = %channel, "Escalation delivered to operator");
                }
                Ok(outcome) => {
                    tracing::warn!(
                        channel = %channel,
                        details = %outcome.details,
                        "Failed to deliver escalation to operator"
                    );
                }
                Err(e) => {
                    tracing::warn!(channel = %channel, error = %e, "Escalation send errored");
                }
            }
        }

        Ok(())
    }
}

/// Build the operator-facing summary for a permanently undeliverable message.
pub fn exhaustion_summary(
    channel: Channel,
    recipient: &str,
    attempts: u32,
    body: &str,
) -> String {
    let preview: String = body.chars().take(PREVIEW_CHARS).collect();
    let ellipsis = if body.chars().count() > PREVIEW_CHARS {
        "..."
    } else {
        ""
    };
    format!(
        "Failed to send {channel} message to {recipient} after {attempts} attempts. \
         Message: {preview}{ellipsis}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_includes_channel_recipient_attempts() {
        let summary = exhaustion_summary(Channel::Email, "user@example.com", 4, "short body");
        assert!(summary.contains("email"));
        assert!(summary.contains("user@example.com"));
        assert!(summary.contains("after 4 attempts"));
        assert!(summary.contains("short body"));
        assert!(!summary.ends_with("..."));
    }

    #[test]
    fn test_summary_truncates_long_body() {
        let body = "x".repeat(200);
        let summary = exhaustion_summary(Channel::Telegram, "42", 5, &body);
        assert!(summary.ends_with("..."));
        assert!(summary.contains(&"x".repeat(50)));
        assert!(!summary.contains(&"x".repeat(51)));
    }

    #[test]
    fn test_summary_truncation_is_char_safe() {
        // Multi-byte characters must not be split
        let body = "é".repeat(80);
        let summary = exhaustion_summary(Channel::Facebook, "psid", 3, &body);
        assert!(summary.contains(&"é".repeat(50)));
        assert!(summary.ends_with("..."));
    }

    #[tokio::test]
    async fn test_no_targets_is_a_noop() {
        let registry = Arc::new(NotifierRegistry::new(vec![]));
        let reporter = OperatorReporter::new(registry, None, None);
        reporter.escalate("nothing to do").await.unwrap();
    }
}
