//! Telegram Bot channel — message sending via the Bot API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use relay_common::error::AppError;
use relay_common::types::{Channel, DeliveryOutcome};

use crate::credentials::CredentialResolver;
use crate::Notify;

/// Credential name for the bot token.
pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram delivery via `sendMessage`. The recipient is the chat id.
pub struct TelegramNotifier {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialResolver>,
}

impl TelegramNotifier {
    pub fn new(credentials: Arc<dyn CredentialResolver>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    fn api_url(token: &str, method: &str) -> String {
        format!("https://api.telegram.org/bot{token}/{method}")
    }
}

/// Envelope every Bot API response arrives in.
#[derive(Debug, Deserialize)]
struct TelegramApiResponse {
    ok: bool,
    description: Option<String>,
}

#[async_trait]
impl Notify for TelegramNotifier {
    fn channel(&self) -> Channel {
        Channel::Telegram
    }

    async fn deliver(&self, recipient: &str, body: &str) -> Result<DeliveryOutcome, AppError> {
        let Some(token) = self.credentials.resolve(TELEGRAM_BOT_TOKEN) else {
            return Ok(DeliveryOutcome::failed(format!(
                "{TELEGRAM_BOT_TOKEN} not set"
            )));
        };

        let payload = serde_json::json!({
            "chat_id": recipient,
            "text": body,
        });

        let response = match self
            .client
            .post(Self::api_url(&token, "sendMessage"))
            .json(&payload)
            .timeout(SEND_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Ok(DeliveryOutcome::failed(format!("sendMessage failed: {e}")));
            }
        };

        let result: TelegramApiResponse = match response.json().await {
            Ok(result) => result,
            Err(e) => {
                return Ok(DeliveryOutcome::failed(format!(
                    "Invalid Telegram response: {e}"
                )));
            }
        };

        if result.ok {
            Ok(DeliveryOutcome::sent("Telegram message sent"))
        } else {
            Ok(DeliveryOutcome::failed(format!(
                "Telegram API error: {}",
                result.description.unwrap_or_default()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;

    #[tokio::test]
    async fn test_missing_token_fails_without_network() {
        let notifier = TelegramNotifier::new(Arc::new(StaticCredentials::empty()));
        let outcome = notifier.deliver("12345", "hello").await.unwrap();
        assert!(!outcome.is_sent());
        assert!(outcome.details.contains("not set"));
    }

    #[test]
    fn test_api_url_shape() {
        assert_eq!(
            TelegramNotifier::api_url("tok", "sendMessage"),
            "https://api.telegram.org/bottok/sendMessage"
        );
    }
}
