use std::sync::{Arc, RwLock};

use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string
    pub redis_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Delay before the first retry of a failed delivery, in seconds (default: 10)
    pub retry_base_delay_secs: u64,

    /// Ceiling on the exponential back-off delay, in seconds (default: 3600)
    pub retry_max_delay_secs: u64,

    /// Total delivery attempts before a message is escalated (default: 5)
    pub retry_max_attempts: u32,

    /// Seconds between retry scheduler passes (default: 30)
    pub scheduler_interval_secs: u64,

    /// Allowed /api/send calls per key per minute (default: 60)
    pub rate_limit_per_minute: u32,

    /// Email sender address
    pub email_from: Option<String>,

    /// Telegram chat that receives operator escalations
    pub admin_telegram_chat_id: Option<String>,

    /// Facebook PSID that receives operator escalations
    pub admin_facebook_psid: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            retry_base_delay_secs: std::env::var("RETRY_BASE_DELAY_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_BASE_DELAY_SECS must be a valid u64"))?,
            retry_max_delay_secs: std::env::var("RETRY_MAX_DELAY_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_MAX_DELAY_SECS must be a valid u64"))?,
            retry_max_attempts: std::env::var("RETRY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_MAX_ATTEMPTS must be a valid u32"))?,
            scheduler_interval_secs: std::env::var("SCHEDULER_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SCHEDULER_INTERVAL_SECS must be a valid u64"))?,
            rate_limit_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_PER_MINUTE must be a valid u32"))?,
            email_from: std::env::var("EMAIL_FROM").ok(),
            admin_telegram_chat_id: std::env::var("ADMIN_TELEGRAM_CHAT_ID").ok(),
            admin_facebook_psid: std::env::var("ADMIN_FACEBOOK_PSID").ok(),
        })
    }

    /// The retry/scheduler parameters as a policy snapshot.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay_secs: self.retry_base_delay_secs,
            max_delay_secs: self.retry_max_delay_secs,
            max_attempts: self.retry_max_attempts,
            tick_interval_secs: self.scheduler_interval_secs,
        }
    }
}

/// Retry scheduling parameters. The scheduler takes a fresh snapshot at the
/// start of every tick, so these may change while the process is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry, in seconds.
    pub base_delay_secs: u64,
    /// Ceiling on the back-off delay, in seconds.
    pub max_delay_secs: u64,
    /// Total delivery attempts before escalation.
    pub max_attempts: u32,
    /// Seconds between scheduler passes.
    pub tick_interval_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_secs: 10,
            max_delay_secs: 3600,
            max_attempts: 5,
            tick_interval_secs: 30,
        }
    }
}

/// Shared, runtime-mutable handle on the retry policy.
///
/// Readers take point-in-time snapshots; a tick in progress keeps the values
/// it read at its start even if the policy is updated mid-tick.
#[derive(Debug, Clone)]
pub struct RetrySettings {
    inner: Arc<RwLock<RetryPolicy>>,
}

impl RetrySettings {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(policy)),
        }
    }

    /// Current policy values. Lock poisoning is unrecoverable configuration
    /// corruption, so it falls back to the last written value.
    pub fn snapshot(&self) -> RetryPolicy {
        *self
            .inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the policy. Takes effect on the next scheduler tick.
    pub fn update(&self, policy: RetryPolicy) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = policy;
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay_secs, 10);
        assert_eq!(policy.max_delay_secs, 3600);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.tick_interval_secs, 30);
    }

    #[test]
    fn test_settings_snapshot_reflects_update() {
        let settings = RetrySettings::default();
        assert_eq!(settings.snapshot().max_attempts, 5);

        settings.update(RetryPolicy {
            base_delay_secs: 1,
            max_delay_secs: 8,
            max_attempts: 3,
            tick_interval_secs: 5,
        });

        let snapshot = settings.snapshot();
        assert_eq!(snapshot.max_attempts, 3);
        assert_eq!(snapshot.max_delay_secs, 8);
    }

    #[test]
    fn test_settings_clones_share_state() {
        let settings = RetrySettings::default();
        let clone = settings.clone();
        clone.update(RetryPolicy {
            max_attempts: 9,
            ..RetryPolicy::default()
        });
        assert_eq!(settings.snapshot().max_attempts, 9);
    }
}
