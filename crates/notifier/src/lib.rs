//! AlertRelay delivery channels.
//!
//! One `Notify` implementation per channel (email, Telegram, Facebook
//! Messenger), dispatched through a registry built once at bootstrap.
//! Channel implementations report failure as a `DeliveryOutcome` value,
//! never as an error — the retry pipeline depends on uniform outcomes.

pub mod credentials;
pub mod email;
pub mod escalation;
pub mod facebook;
pub mod telegram;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use relay_common::config::AppConfig;
use relay_common::error::AppError;
use relay_common::types::{Channel, DeliveryOutcome, NotificationRequest};

pub use credentials::{CredentialResolver, EnvCredentials, StaticCredentials};
pub use email::EmailNotifier;
pub use escalation::{EscalateReport, OperatorReporter};
pub use facebook::FacebookNotifier;
pub use telegram::TelegramNotifier;

/// A delivery channel behind the uniform send contract.
///
/// `deliver` performs exactly one network call and no persistence. Channel
/// implementations map every transport failure, non-success status, and
/// missing credential into a failed `DeliveryOutcome` and always return
/// `Ok`. The `Err` arm is reserved for faults outside the send itself
/// (e.g., a credential backend that cannot be reached); the scheduler
/// treats it as an infrastructure error and leaves the entry untouched.
#[async_trait]
pub trait Notify: Send + Sync {
    /// The channel this notifier serves.
    fn channel(&self) -> Channel;

    /// Attempt delivery of `body` to `recipient`.
    async fn deliver(&self, recipient: &str, body: &str) -> Result<DeliveryOutcome, AppError>;
}

/// Channel-to-notifier mapping, built once at process bootstrap.
///
/// `Channel` is a closed enum, so unknown channels cannot reach this point:
/// they are rejected as validation errors at the boundary.
pub struct NotifierRegistry {
    notifiers: HashMap<Channel, Box<dyn Notify>>,
}

impl NotifierRegistry {
    /// Build a registry from an arbitrary set of notifiers. Tests use this
    /// to install scripted doubles.
    pub fn new(notifiers: Vec<Box<dyn Notify>>) -> Self {
        let notifiers = notifiers
            .into_iter()
            .map(|n| (n.channel(), n))
            .collect();
        Self { notifiers }
    }

    /// Build the production registry with one notifier per channel.
    pub fn from_config(config: &AppConfig, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self::new(vec![
            Box::new(EmailNotifier::new(
                credentials.clone(),
                config.email_from.clone(),
            )),
            Box::new(TelegramNotifier::new(credentials.clone())),
            Box::new(FacebookNotifier::new(credentials)),
        ])
    }

    pub fn get(&self, channel: Channel) -> Option<&dyn Notify> {
        self.notifiers.get(&channel).map(|n| n.as_ref())
    }

    /// Dispatch a request to its channel's notifier.
    pub async fn send(&self, request: &NotificationRequest) -> Result<DeliveryOutcome, AppError> {
        let notifier = self.get(request.channel).ok_or_else(|| {
            AppError::Internal(format!(
                "No notifier registered for channel {}",
                request.channel
            ))
        })?;
        notifier.deliver(&request.recipient, &request.body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_channel() {
        let config = test_config();
        let registry =
            NotifierRegistry::from_config(&config, Arc::new(StaticCredentials::empty()));
        for channel in Channel::ALL {
            assert!(registry.get(channel).is_some(), "missing {channel}");
        }
    }

    #[tokio::test]
    async fn test_send_without_notifier_is_internal_error() {
        let registry = NotifierRegistry::new(vec![]);
        let request = NotificationRequest {
            channel: Channel::Email,
            recipient: "a@b.c".into(),
            body: "hi".into(),
        };
        let err = registry.send(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: "unused".into(),
            redis_url: "redis://localhost:6379".into(),
            db_max_connections: 5,
            retry_base_delay_secs: 10,
            retry_max_delay_secs: 3600,
            retry_max_attempts: 5,
            scheduler_interval_secs: 30,
            rate_limit_per_minute: 60,
            email_from: Some("alerts@example.com".into()),
            admin_telegram_chat_id: None,
            admin_facebook_psid: None,
        }
    }
}
