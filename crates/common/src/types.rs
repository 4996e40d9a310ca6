use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Delivery channels supported by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Telegram,
    Facebook,
}

impl Channel {
    /// Every channel variant, in registry order.
    pub const ALL: [Channel; 3] = [Channel::Email, Channel::Telegram, Channel::Facebook];

    /// Parse a wire-format channel name. Unknown names are a validation
    /// error surfaced to the caller before any delivery is attempted.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "email" => Ok(Channel::Email),
            "telegram" => Ok(Channel::Telegram),
            "facebook" => Ok(Channel::Facebook),
            other => Err(AppError::Validation(format!(
                "Invalid channel '{}'. Valid channels: email, telegram, facebook",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Telegram => write!(f, "telegram"),
            Channel::Facebook => write!(f, "facebook"),
        }
    }
}

/// Outcome status of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one delivery attempt. Transport failures are represented here,
/// never as errors — the retry pipeline depends on uniform outcome handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub status: DeliveryStatus,
    pub details: String,
}

impl DeliveryOutcome {
    pub fn sent(details: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Sent,
            details: details.into(),
        }
    }

    pub fn failed(details: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Failed,
            details: details.into(),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// A message submitted for delivery. Ephemeral — built per API call or per
/// retry attempt, never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub channel: Channel,
    pub recipient: String,
    pub body: String,
}

/// One row of the append-only delivery audit trail. Written on every
/// attempt (initial or retry), never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryLogEntry {
    pub id: Uuid,
    pub channel: Channel,
    pub recipient: String,
    pub body: String,
    pub status: DeliveryStatus,
    pub details: String,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
}

/// A message awaiting redelivery. `attempts` counts failed retries so far
/// and doubles as the optimistic-concurrency version for scheduler claims.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RetryQueueEntry {
    pub id: Uuid,
    pub channel: Channel,
    pub recipient: String,
    pub body: String,
    pub attempts: i32,
    pub next_retry_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RetryQueueEntry {
    /// Rebuild the ephemeral request for a retry attempt.
    pub fn to_request(&self) -> NotificationRequest {
        NotificationRequest {
            channel: self.channel,
            recipient: self.recipient.clone(),
            body: self.body.clone(),
        }
    }
}

/// An API key authorizing calls to the submission endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub key: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parse_known() {
        assert_eq!(Channel::parse("email").unwrap(), Channel::Email);
        assert_eq!(Channel::parse("telegram").unwrap(), Channel::Telegram);
        assert_eq!(Channel::parse("facebook").unwrap(), Channel::Facebook);
    }

    #[test]
    fn test_channel_parse_unknown_rejected() {
        let err = Channel::parse("discord").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("discord"));
    }

    #[test]
    fn test_channel_display_round_trips() {
        for channel in Channel::ALL {
            assert_eq!(Channel::parse(&channel.to_string()).unwrap(), channel);
        }
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(DeliveryOutcome::sent("ok").is_sent());
        assert!(!DeliveryOutcome::failed("boom").is_sent());
        assert_eq!(DeliveryOutcome::failed("boom").details, "boom");
    }
}
