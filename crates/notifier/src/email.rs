//! Email channel — delivery via the Resend HTTP API.
//!
//! Plain-text only; the recipient is the destination address and the sender
//! comes from `EMAIL_FROM` configuration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use relay_common::error::AppError;
use relay_common::types::{Channel, DeliveryOutcome};

use crate::credentials::CredentialResolver;
use crate::Notify;

/// Credential name for the Resend API key.
pub const RESEND_API_KEY: &str = "RESEND_API_KEY";

const RESEND_URL: &str = "https://api.resend.com/emails";
const SUBJECT: &str = "AlertRelay Notification";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub struct EmailNotifier {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialResolver>,
    from: Option<String>,
}

impl EmailNotifier {
    pub fn new(credentials: Arc<dyn CredentialResolver>, from: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            from,
        }
    }
}

#[async_trait]
impl Notify for EmailNotifier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn deliver(&self, recipient: &str, body: &str) -> Result<DeliveryOutcome, AppError> {
        let Some(api_key) = self.credentials.resolve(RESEND_API_KEY) else {
            return Ok(DeliveryOutcome::failed(format!("{RESEND_API_KEY} not set")));
        };
        let Some(from) = self.from.as_deref() else {
            return Ok(DeliveryOutcome::failed("EMAIL_FROM not set"));
        };

        let payload = serde_json::json!({
            "from": from,
            "to": [recipient],
            "subject": SUBJECT,
            "text": body,
        });

        match self
            .client
            .post(RESEND_URL)
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(SEND_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                Ok(DeliveryOutcome::sent("Email sent"))
            }
            Ok(response) => {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                Ok(DeliveryOutcome::failed(format!(
                    "Email API returned {status}: {detail}"
                )))
            }
            Err(e) => Ok(DeliveryOutcome::failed(format!("Email request failed: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let notifier = EmailNotifier::new(
            Arc::new(StaticCredentials::empty()),
            Some("alerts@example.com".into()),
        );
        let outcome = notifier.deliver("user@example.com", "hi").await.unwrap();
        assert!(!outcome.is_sent());
        assert!(outcome.details.contains("RESEND_API_KEY not set"));
    }

    #[tokio::test]
    async fn test_missing_sender_fails_without_network() {
        let creds = StaticCredentials::empty().with(RESEND_API_KEY, "re_123");
        let notifier = EmailNotifier::new(Arc::new(creds), None);
        let outcome = notifier.deliver("user@example.com", "hi").await.unwrap();
        assert!(!outcome.is_sent());
        assert!(outcome.details.contains("EMAIL_FROM not set"));
    }
}
