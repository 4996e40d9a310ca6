//! Fixed-window rate limiting backed by Redis.
//!
//! Uses `INCR` + `EXPIRE` per API key: the first request in a window
//! creates the counter with a TTL, later requests bump it, and the window
//! resets itself when the TTL lapses.

use redis::aio::ConnectionManager;

use relay_common::error::AppError;

const WINDOW_SECS: u64 = 60;

/// Count one request against `api_key`'s window. Errors with
/// `AppError::RateLimited` once the per-minute budget is exceeded.
pub async fn check(
    redis: &mut ConnectionManager,
    api_key: &str,
    limit_per_minute: u32,
) -> Result<(), AppError> {
    let key = format!("rate:send:{api_key}");

    let count: u32 = redis::cmd("INCR").arg(&key).query_async(redis).await?;
    if count == 1 {
        let _: () = redis::cmd("EXPIRE")
            .arg(&key)
            .arg(WINDOW_SECS)
            .query_async(redis)
            .await?;
    }

    if count > limit_per_minute {
        tracing::debug!(api_key_suffix = suffix(api_key), count, "Rate limit hit");
        return Err(AppError::RateLimited(format!(
            "More than {limit_per_minute} requests per minute"
        )));
    }

    Ok(())
}

/// Last four characters of the key, for logging without echoing the secret.
fn suffix(api_key: &str) -> &str {
    match api_key.char_indices().rev().nth(3) {
        Some((idx, _)) => &api_key[idx..],
        None => api_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_keeps_only_the_tail() {
        assert_eq!(suffix("abcdef12"), "ef12");
        assert_eq!(suffix("ab"), "ab");
        assert_eq!(suffix(""), "");
    }
}
