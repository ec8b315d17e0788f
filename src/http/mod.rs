//! HTTP module
//!
//! Provides the resilient API session used by every remote call.
//!
//! # Features
//!
//! - **Automatic Retries**: Connection errors, timeouts and retryable statuses
//! - **Token Renewal**: A 401 triggers one token refresh and one replay
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff

mod policy;
mod rate_limit;
mod session;

pub use policy::{is_transient_error, RetryPolicy};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use session::{ApiResponse, ApiSession, RequestConfig, SessionConfig};
