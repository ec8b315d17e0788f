//! Shared fixtures for unit tests

use crate::auth::TokenProvider;
use crate::error::Result;
use crate::http::{ApiSession, RetryPolicy, SessionConfig};
use crate::types::BackoffType;
use async_trait::async_trait;
use std::time::Duration;

/// Always returns the same token
pub(crate) struct StaticToken(pub &'static str);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn fetch_token(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Session against `base_url` with fast retries and no rate limit
pub(crate) fn test_session(base_url: &str) -> ApiSession {
    let policy = RetryPolicy::default().with_max_retries(1).with_backoff(
        BackoffType::Constant,
        Duration::from_millis(5),
        Duration::from_millis(20),
    );
    let config = SessionConfig::builder()
        .base_url(base_url)
        .retry(policy)
        .no_rate_limit()
        .build();

    ApiSession::new(config, Box::new(StaticToken("test-token"))).unwrap()
}
