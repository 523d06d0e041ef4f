//! Sliding-window rate limiting for inbound HTTP requests, keyed on
//! client IP rather than the forge-side key the teacher's remediation
//! loop guards.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst_capacity: u32,
    pub cleanup_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 100,
            burst_capacity: 20,
            cleanup_interval_seconds: 300,
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    request_count: u32,
    window_start: DateTime<Utc>,
    last_request: DateTime<Utc>,
}

/// Returned when a request is over limit, carrying the number of
/// seconds a client should wait before retrying.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    pub retry_after_secs: i64,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    limits: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
    last_cleanup: Arc<RwLock<DateTime<Utc>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            limits: Arc::new(RwLock::new(HashMap::new())),
            last_cleanup: Arc::new(RwLock::new(Utc::now())),
        }
    }

    /// `checkLimit(key)`: returns `Ok(())` when the request is allowed,
    /// `Err(status)` with a retry-after hint when it isn't.
    pub async fn check(&self, key: &str) -> Result<(), RateLimitStatus> {
        let mut limits = self.limits.write().await;
        let now = Utc::now();

        self.perform_cleanup(&mut limits, now).await;

        let entry = limits.entry(key.to_string()).or_insert_with(|| RateLimitEntry {
            request_count: 0,
            window_start: now,
            last_request: now - Duration::minutes(1),
        });

        if (now - entry.window_start).num_minutes() >= 1 {
            entry.request_count = 0;
            entry.window_start = now;
        }

        if entry.request_count >= self.config.requests_per_minute {
            let reset_time = entry.window_start + Duration::minutes(1);
            return Err(RateLimitStatus {
                retry_after_secs: (reset_time - now).num_seconds().max(1),
            });
        }

        let time_since_last_request = (now - entry.last_request).num_seconds();
        if time_since_last_request < 60
            && entry.request_count >= self.config.requests_per_minute.saturating_sub(self.config.burst_capacity)
        {
            return Err(RateLimitStatus { retry_after_secs: 1 });
        }

        entry.request_count += 1;
        entry.last_request = now;
        debug!(key, count = entry.request_count, "rate limit check passed");
        Ok(())
    }

    async fn perform_cleanup(&self, limits: &mut HashMap<String, RateLimitEntry>, now: DateTime<Utc>) {
        let mut last_cleanup = self.last_cleanup.write().await;

        if (now - *last_cleanup).num_seconds() < self.config.cleanup_interval_seconds as i64 {
            return;
        }

        let before = limits.len();
        limits.retain(|_, entry| (now - entry.last_request).num_hours() < 1);
        let removed = before - limits.len();
        if removed > 0 {
            debug!(removed, "cleaned up stale rate limit entries");
        }
        *last_cleanup = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(requests_per_minute: u32, burst_capacity: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            requests_per_minute,
            burst_capacity,
            cleanup_interval_seconds: 300,
        })
    }

    #[tokio::test]
    async fn allows_requests_under_the_limit() {
        let limiter = limiter(10, 2);
        for _ in 0..5 {
            assert!(limiter.check("1.2.3.4").await.is_ok());
        }
    }

    #[tokio::test]
    async fn rejects_once_the_per_minute_limit_is_reached() {
        let limiter = limiter(3, 0);
        for _ in 0..3 {
            limiter.check("1.2.3.4").await.unwrap();
        }
        assert!(limiter.check("1.2.3.4").await.is_err());
    }

    #[tokio::test]
    async fn tracks_distinct_keys_independently() {
        let limiter = limiter(1, 0);
        assert!(limiter.check("a").await.is_ok());
        assert!(limiter.check("b").await.is_ok());
        assert!(limiter.check("a").await.is_err());
    }
}
