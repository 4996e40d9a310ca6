//! AlertRelay API server binary entrypoint.
//!
//! Hosts the HTTP boundary and the retry scheduler in one process: the
//! scheduler is constructed at bootstrap and spawned alongside the server,
//! and both wind down on Ctrl+C. Per-entry claims in the retry store make
//! an interrupted pass safe to abandon.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use relay_common::config::{AppConfig, RetrySettings};
use relay_common::db::create_pool;
use relay_common::redis_pool::create_redis_pool;
use relay_engine::dispatcher::Dispatcher;
use relay_engine::scheduler::RetryScheduler;
use relay_notifier::{CredentialResolver, EnvCredentials, NotifierRegistry, OperatorReporter};

use relay_api::routes::create_router;
use relay_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("relay_api=debug,relay_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting AlertRelay API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Create Redis connection
    let redis = create_redis_pool(&config.redis_url).await?;
    tracing::info!("Redis connection established");

    // Wire up the delivery pipeline
    let credentials: Arc<dyn CredentialResolver> = Arc::new(EnvCredentials);
    let notifiers = Arc::new(NotifierRegistry::from_config(&config, credentials));
    let settings = RetrySettings::new(config.retry_policy());
    let reporter = Arc::new(OperatorReporter::new(
        notifiers.clone(),
        config.admin_telegram_chat_id.clone(),
        config.admin_facebook_psid.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        pool.clone(),
        notifiers.clone(),
        settings.clone(),
    ));
    let scheduler = RetryScheduler::new(pool.clone(), notifiers, reporter, settings);

    // Build application state and router
    let state = AppState::new(pool, redis, config, dispatcher);
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("AlertRelay API server stopped.");
    Ok(())
}
