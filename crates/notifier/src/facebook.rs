//! Facebook Messenger channel — delivery via the Graph API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use relay_common::error::AppError;
use relay_common::types::{Channel, DeliveryOutcome};

use crate::credentials::CredentialResolver;
use crate::Notify;

/// Credential name for the page access token.
pub const FACEBOOK_PAGE_TOKEN: &str = "FACEBOOK_PAGE_TOKEN";

const GRAPH_URL: &str = "https://graph.facebook.com/v22.0/me/messages";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Messenger delivery. The recipient is the user's page-scoped id (PSID).
pub struct FacebookNotifier {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialResolver>,
}

impl FacebookNotifier {
    pub fn new(credentials: Arc<dyn CredentialResolver>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }
}

#[async_trait]
impl Notify for FacebookNotifier {
    fn channel(&self) -> Channel {
        Channel::Facebook
    }

    async fn deliver(&self, recipient: &str, body: &str) -> Result<DeliveryOutcome, AppError> {
        let Some(token) = self.credentials.resolve(FACEBOOK_PAGE_TOKEN) else {
            return Ok(DeliveryOutcome::failed(format!(
                "{FACEBOOK_PAGE_TOKEN} not set"
            )));
        };

        let payload = serde_json::json!({
            "recipient": { "id": recipient },
            "message": { "text": body },
        });

        match self
            .client
            .post(GRAPH_URL)
            .query(&[("access_token", token.as_str())])
            .json(&payload)
            .timeout(SEND_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                Ok(DeliveryOutcome::sent("Facebook message sent"))
            }
            Ok(response) => {
                // Surface the Graph API error text for debugging
                let detail = response.text().await.unwrap_or_default();
                Ok(DeliveryOutcome::failed(detail))
            }
            Err(e) => Ok(DeliveryOutcome::failed(format!(
                "Messenger request failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;

    #[tokio::test]
    async fn test_missing_page_token_fails_without_network() {
        let notifier = FacebookNotifier::new(Arc::new(StaticCredentials::empty()));
        let outcome = notifier.deliver("psid-1", "hello").await.unwrap();
        assert!(!outcome.is_sent());
        assert!(outcome.details.contains("FACEBOOK_PAGE_TOKEN not set"));
    }
}
