//! Retry policy
//!
//! Pure decision logic for transport-level retries. The session consults
//! the policy after every attempt; nothing here performs I/O.

use crate::types::BackoffType;
use reqwest::{Method, StatusCode};
use std::time::Duration;

/// Retry policy injected into the API session
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Statuses that are retried
    pub retryable_statuses: Vec<u16>,
    /// Methods that may be retried
    pub retryable_methods: Vec<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 7,
            backoff_type: BackoffType::Exponential,
            initial_backoff: Duration::from_millis(300),
            max_backoff: Duration::from_secs(120),
            retryable_statuses: vec![429, 500, 502, 503, 504],
            retryable_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ],
        }
    }
}

impl RetryPolicy {
    /// Create the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set max retries
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn with_backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.backoff_type = backoff_type;
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Replace the retryable status set
    #[must_use]
    pub fn with_retryable_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_statuses = statuses.into_iter().collect();
        self
    }

    /// Replace the retryable method set
    #[must_use]
    pub fn with_retryable_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.retryable_methods = methods.into_iter().collect();
        self
    }

    /// Check whether a method is eligible for retries at all
    pub fn allows_method(&self, method: &Method) -> bool {
        self.retryable_methods.contains(method)
    }

    /// Decide whether a response with `status` should be retried.
    ///
    /// `attempt` is zero-based: the first request is attempt 0.
    pub fn should_retry_status(&self, method: &Method, status: StatusCode, attempt: u32) -> bool {
        attempt < self.max_retries
            && self.allows_method(method)
            && self.retryable_statuses.contains(&status.as_u16())
    }

    /// Decide whether a transient transport failure should be retried
    pub fn should_retry_transport(&self, method: &Method, attempt: u32) -> bool {
        attempt < self.max_retries && self.allows_method(method)
    }

    /// Calculate backoff delay for a given attempt
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }

    /// Delay before the next attempt, honoring a server-provided `Retry-After`
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(delay) => std::cmp::min(delay, self.max_backoff),
            None => self.backoff_for(attempt),
        }
    }
}

/// Connection failures and timeouts are transient; everything else is not
pub fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
