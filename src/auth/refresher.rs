//! Refresh-token exchange
//!
//! Issues a form-encoded POST against the token endpoint and returns the
//! new access token. Failures here are fatal; retrying is the session's job.

use super::types::{OAuthCredentials, TokenResponse, DEFAULT_TOKEN_URL};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Source of bearer tokens for the API session
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a fresh bearer token
    async fn fetch_token(&self) -> Result<String>;
}

/// Exchanges a refresh token for a bearer token
pub struct TokenRefresher {
    /// Client credentials and refresh token
    credentials: OAuthCredentials,
    /// Resource the token is requested for (organization URL)
    resource_url: String,
    /// Token endpoint
    token_url: String,
    /// HTTP client for token requests
    http_client: Client,
}

impl TokenRefresher {
    /// Create a refresher against the default token endpoint
    pub fn new(credentials: OAuthCredentials, resource_url: impl Into<String>) -> Self {
        Self::with_client(credentials, resource_url, Client::new())
    }

    /// Create a refresher with a custom HTTP client
    pub fn with_client(
        credentials: OAuthCredentials,
        resource_url: impl Into<String>,
        http_client: Client,
    ) -> Self {
        Self {
            credentials,
            resource_url: resource_url.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            http_client,
        }
    }

    /// Override the token endpoint
    #[must_use]
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Get the token endpoint in use
    pub fn endpoint(&self) -> &str {
        &self.token_url
    }

    /// Exchange the refresh token for a new access token
    pub async fn refresh(&self) -> Result<String> {
        let resource = resource_param(&self.resource_url);
        let form = [
            ("client_id", self.credentials.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("resource", resource.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(Error::authentication(status.as_u16(), body));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|_| Error::authentication(status.as_u16(), &body))?;

        match token.access_token {
            Some(access_token) if !access_token.is_empty() => {
                debug!("Access token refreshed successfully.");
                Ok(access_token)
            }
            _ => Err(Error::authentication(status.as_u16(), body)),
        }
    }
}

#[async_trait]
impl TokenProvider for TokenRefresher {
    async fn fetch_token(&self) -> Result<String> {
        self.refresh().await
    }
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("credentials", &self.credentials)
            .field("resource_url", &self.resource_url)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

/// The token endpoint expects the resource with exactly one trailing slash
pub(crate) fn resource_param(resource_url: &str) -> String {
    format!("{}/", resource_url.trim_end_matches('/'))
}
