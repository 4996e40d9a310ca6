//! Shared application state for the Axum API server.

use std::sync::Arc;

use redis::aio::ConnectionManager;
use sqlx::PgPool;

use relay_common::config::AppConfig;
use relay_engine::dispatcher::Dispatcher;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub redis: ConnectionManager,
    pub config: AppConfig,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        redis: ConnectionManager,
        config: AppConfig,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            pool,
            redis,
            config,
            dispatcher,
        }
    }
}
