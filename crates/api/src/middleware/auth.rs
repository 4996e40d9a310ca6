//! API-key authentication.
//!
//! Provides an `ApiKeyAuth` Axum extractor that validates the `X-API-Key`
//! header against the `api_keys` table on protected routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use relay_common::error::AppError;

use crate::state::AppState;

/// Authenticated caller extracted from the `X-API-Key` header.
///
/// Use as an Axum extractor on protected routes:
/// ```ignore
/// async fn handler(auth: ApiKeyAuth) -> impl IntoResponse {
///     // auth.key_id identifies the calling key
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    pub key_id: Uuid,
    pub key: String,
}

impl FromRequestParts<AppState> for ApiKeyAuth {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let pool = state.pool.clone();

        let api_key = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        async move {
            let Some(api_key) = api_key else {
                return Err(AppError::Auth(
                    "API key required. Set the X-API-Key header".to_string(),
                ));
            };

            let row: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM api_keys WHERE key = $1 AND is_active = true")
                    .bind(&api_key)
                    .fetch_optional(&pool)
                    .await?;

            match row {
                Some((key_id,)) => Ok(ApiKeyAuth {
                    key_id,
                    key: api_key,
                }),
                None => Err(AppError::Auth("Invalid API key".to_string())),
            }
        }
    }
}
