//! Authentication module
//!
//! Exchanges a long-lived OAuth2 refresh token for short-lived bearer tokens.
//!
//! The `TokenRefresher` is stateless aside from its inputs; the session that
//! owns it decides when a new token is needed (on a 401 from the API).

mod refresher;
mod types;

pub use refresher::{TokenProvider, TokenRefresher};
pub use types::{OAuthCredentials, DEFAULT_TOKEN_URL};
