//! Error types for the Dynamics extractor
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Every variant except `Transport` is fatal for a run; transport failures
//! are retried by the session and escalated by the caller once the retry
//! budget is spent.

use thiserror::Error;

/// The main error type for the extractor
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed. Received {status} - {body}.")]
    Authentication { status: u16, body: String },

    // ============================================================================
    // API Errors
    // ============================================================================
    #[error("Could not obtain entity metadata for resource. {message}")]
    Catalog { message: String },

    #[error(
        "Endpoint \"{endpoint}\" is not supported by your Dynamics instance. Please, refer to \
         documentation at https://docs.microsoft.com/en-us/dynamics365/customer-engagement/web-api/entitytypes \
         for the list of default available resources; or visit {catalog_url} for a complete list \
         of all objects supported by your Dynamics instance."
    )]
    UnsupportedEndpoint {
        endpoint: String,
        catalog_url: String,
    },

    #[error("Could not query endpoint \"{endpoint}\". {message}")]
    Query { endpoint: String, message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    // ============================================================================
    // Output Errors
    // ============================================================================
    #[error("Output error: {message}")]
    Output { message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(status: u16, body: impl Into<String>) -> Self {
        Self::Authentication {
            status,
            body: body.into(),
        }
    }

    /// Create a catalog error
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a query error
    pub fn query(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Check if this error came from the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Result type alias for the extractor
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("missing organization_url");
        assert_eq!(
            err.to_string(),
            "Configuration error: missing organization_url"
        );

        let err = Error::authentication(400, "{\"error\":\"invalid_grant\"}");
        assert_eq!(
            err.to_string(),
            "Authentication failed. Received 400 - {\"error\":\"invalid_grant\"}."
        );

        let err = Error::query("contacts", "Received: 400 - Bad request");
        assert_eq!(
            err.to_string(),
            "Could not query endpoint \"contacts\". Received: 400 - Bad request"
        );
    }

    #[test]
    fn test_unsupported_endpoint_points_to_catalog() {
        let err = Error::UnsupportedEndpoint {
            endpoint: "widgets".to_string(),
            catalog_url: "https://org.crm.dynamics.com/api/data/v9.2/EntityDefinitions".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("\"widgets\""));
        assert!(message.contains("https://org.crm.dynamics.com/api/data/v9.2/EntityDefinitions"));
    }

    #[test]
    fn test_is_transport() {
        assert!(!Error::config("x").is_transport());
        assert!(!Error::catalog("x").is_transport());
        assert!(!Error::output("x").is_transport());
    }
}
