//! Delivery log listing route.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use relay_common::error::AppError;
use relay_common::types::DeliveryLogEntry;
use relay_engine::delivery_log::DeliveryLog;

use crate::middleware::auth::ApiKeyAuth;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/logs", get(list_logs))
}

#[derive(Debug, Deserialize)]
pub struct LogsParams {
    pub limit: Option<i64>,
}

/// GET /api/logs — most recent delivery attempts, newest first.
///
/// Retry outcomes are only visible here; they are never returned to the
/// original submitter synchronously.
async fn list_logs(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Query(params): Query<LogsParams>,
) -> Result<Json<Vec<DeliveryLogEntry>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let entries = DeliveryLog::recent(&state.pool, limit).await?;
    Ok(Json(entries))
}
