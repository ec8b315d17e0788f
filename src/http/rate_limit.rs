//! Client-side request throttling
//!
//! Dataverse service protection allows 6000 requests per user in a sliding
//! five minute window. Spreading requests evenly over that window keeps the
//! extractor from burning retries on 429 responses.

use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Requests allowed per service protection window
pub const SERVICE_PROTECTION_REQUESTS: u32 = 6000;

/// Length of the service protection window
pub const SERVICE_PROTECTION_WINDOW: Duration = Duration::from_secs(300);

/// Throttle settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed back to back before throttling starts
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::from_window(SERVICE_PROTECTION_REQUESTS, SERVICE_PROTECTION_WINDOW)
    }
}

impl RateLimiterConfig {
    /// Throttle to `requests_per_second` with bursts of `burst_size`
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Spread `requests` evenly over `window`, bursting up to one second's share
    pub fn from_window(requests: u32, window: Duration) -> Self {
        let seconds = window.as_secs().max(1);
        let per_second = (u64::from(requests) / seconds).max(1) as u32;
        Self::new(per_second, per_second)
    }

    fn quota(&self) -> Quota {
        let rate = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(NonZeroU32::MIN);
        Quota::per_second(rate).allow_burst(burst)
    }
}

/// Shared token bucket; clones draw from the same bucket
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<DefaultDirectRateLimiter>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Build a limiter. Zero rates or bursts are treated as one.
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            bucket: Arc::new(DefaultDirectRateLimiter::direct(config.quota())),
            config: config.clone(),
        }
    }

    /// Wait for a permit
    pub async fn wait(&self) {
        self.bucket.until_ready().await;
    }

    /// Take a permit if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.bucket.check().is_ok()
    }

    /// Settings this limiter was built from
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("requests_per_second", &self.config.requests_per_second)
            .field("burst_size", &self.config.burst_size)
            .finish()
    }
}
