//! Resilient API session
//!
//! Wraps every outbound request with:
//! - the current bearer token
//! - transport-level retries per the injected `RetryPolicy`
//! - one token renewal and replay when the API answers 401
//!
//! Statuses other than 401 are handed back to the caller untouched; the
//! session owns transport and auth, not request semantics.

use super::policy::{is_transient_error, RetryPolicy};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::TokenProvider;
use crate::error::{Error, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Configuration for the API session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL for relative request paths
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Transport retry policy
    pub retry: RetryPolicy,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        default_headers.insert("OData-MaxVersion".to_string(), "4.0".to_string());
        default_headers.insert("OData-Version".to_string(), "4.0".to_string());

        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers,
            user_agent: format!("dynamics-extractor/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SessionConfig {
    /// Create a new config builder
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for session config
#[derive(Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A fully-read API response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    /// Create a response from parts
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Response status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Raw response body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the status is exactly 200
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// HTTP session with retry, rate limiting and bearer-token renewal
pub struct ApiSession {
    client: Client,
    config: SessionConfig,
    token_provider: Box<dyn TokenProvider>,
    /// Current bearer token; replaced in place on renewal
    token: RwLock<Option<String>>,
    rate_limiter: Option<RateLimiter>,
}

impl ApiSession {
    /// Create a new session. No token is fetched until first use.
    pub fn new(config: SessionConfig, token_provider: Box<dyn TokenProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            token_provider,
            token: RwLock::new(None),
            rate_limiter,
        })
    }

    /// Base URL of the API
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Fetch a token up front so bad credentials fail before any API call
    pub async fn authenticate(&self) -> Result<()> {
        let token = self.token_provider.fetch_token().await?;
        *self.token.write().await = Some(token);
        Ok(())
    }

    /// The token currently installed, if any
    pub async fn current_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Make a GET request.
    ///
    /// A 401 triggers one token renewal and one replay of the original
    /// request; a 401 on the replay is fatal.
    pub async fn get(&self, path: &str, request: &RequestConfig) -> Result<ApiResponse> {
        let url = self.build_url(path);
        let token = self.bearer_token().await?;

        let response = self
            .send_with_retry(Method::GET, &url, request, &token)
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("Received 401 from the API, refreshing access token and replaying request");
        let renewed = self.renew_token(&token).await?;

        let replay = self
            .send_with_retry(Method::GET, &url, request, &renewed)
            .await?;

        if replay.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::authentication(
                StatusCode::UNAUTHORIZED.as_u16(),
                format!("request still unauthorized after token renewal: {}", replay.body()),
            ));
        }

        Ok(replay)
    }

    /// Get the installed token, fetching one on first use
    async fn bearer_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        let token = self.token_provider.fetch_token().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Replace the token that was rejected.
    ///
    /// If another request already swapped in a different token, that one is
    /// reused instead of refreshing twice.
    async fn renew_token(&self, rejected: &str) -> Result<String> {
        let mut slot = self.token.write().await;

        if let Some(current) = slot.as_ref() {
            if current != rejected {
                return Ok(current.clone());
            }
        }

        let token = self.token_provider.fetch_token().await?;
        *slot = Some(token.clone());
        debug!("Installed renewed access token");
        Ok(token)
    }

    /// Send one logical request, retrying transient failures
    async fn send_with_retry(
        &self,
        method: Method,
        url: &str,
        request: &RequestConfig,
        token: &str,
    ) -> Result<ApiResponse> {
        let policy = &self.config.retry;
        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let mut attempt = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self
                .client
                .request(method.clone(), url)
                .bearer_auth(token)
                .timeout(timeout);

            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }

            for (key, value) in &request.headers {
                req = req.header(key.as_str(), value.as_str());
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if policy.should_retry_status(&method, status, attempt) {
                        // Retry-After is only honoured on throttling responses
                        let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
                            extract_retry_after(&response)
                        } else {
                            None
                        };
                        let delay = policy.delay_for(attempt, retry_after);
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {:?}",
                            status.as_u16(),
                            attempt + 1,
                            policy.max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let body = response.text().await?;
                    debug!("{} {} -> {}", method, url, status.as_u16());
                    return Ok(ApiResponse::new(status, body));
                }
                Err(e) => {
                    if is_transient_error(&e) && policy.should_retry_transport(&method, attempt) {
                        let delay = policy.backoff_for(attempt);
                        warn!(
                            "Transport error ({}), attempt {}/{}, retrying in {:?}",
                            e,
                            attempt + 1,
                            policy.max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(Error::Transport(e));
                }
            }
        }
    }

    /// Build full URL from path; absolute URLs pass through untouched
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.base_url())
    }
}

impl std::fmt::Debug for ApiSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSession")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Extract retry-after header value (seconds form only)
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
