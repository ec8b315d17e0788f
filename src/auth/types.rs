//! Auth configuration types

use serde::Deserialize;

/// Fixed token-issuance endpoint for Dynamics 365 refresh-token grants
pub const DEFAULT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/token";

/// OAuth2 client credentials plus the refresh token issued to the user
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// Application (client) id
    pub client_id: String,
    /// Application secret
    pub client_secret: String,
    /// Long-lived refresh token
    pub refresh_token: String,
}

impl OAuthCredentials {
    /// Create a new set of credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub token_type: Option<String>,
}
