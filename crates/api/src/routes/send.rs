//! Message submission route.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use relay_common::error::AppError;
use relay_common::types::{Channel, DeliveryOutcome, NotificationRequest};

use crate::middleware::auth::ApiKeyAuth;
use crate::middleware::rate_limit;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/send", post(send_message))
}

#[derive(Debug, Deserialize)]
pub struct SendParams {
    pub channel: String,
    pub recipient: String,
    pub body: String,
}

/// POST /api/send — attempt immediate delivery of a message.
///
/// Always answers with the outcome of the immediate attempt; a failed
/// delivery is a 200 with `status: "failed"` (the message is queued for
/// retry), while validation problems are a 400 before anything is sent.
async fn send_message(
    State(state): State<AppState>,
    auth: ApiKeyAuth,
    Json(params): Json<SendParams>,
) -> Result<Json<DeliveryOutcome>, AppError> {
    let mut redis = state.redis.clone();
    rate_limit::check(&mut redis, &auth.key, state.config.rate_limit_per_minute).await?;

    let request = NotificationRequest {
        channel: Channel::parse(&params.channel)?,
        recipient: params.recipient,
        body: params.body,
    };

    let outcome = state.dispatcher.submit(&request).await?;
    Ok(Json(outcome))
}
