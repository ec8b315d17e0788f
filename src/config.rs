//! Configuration loading
//!
//! Reads the platform configuration file: run parameters under
//! `parameters`, OAuth credentials under `authorization.oauth_api.credentials`.
//! JSON by default, YAML when the file extension says so.

use crate::auth::{OAuthCredentials, TokenRefresher};
use crate::engine::ExtractionConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Config file name inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Output tables location relative to the data directory
pub const TABLES_OUTPUT_DIR: &str = "out/tables";

/// Parameters that must be present and non-empty
pub const MANDATORY_PARAMETERS: [&str; 3] = ["organization_url", "endpoint", "api_version"];

// ============================================================================
// Raw File Layout
// ============================================================================

/// Configuration file as stored on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Run parameters
    #[serde(default)]
    pub parameters: Parameters,

    /// Authorization block
    #[serde(default)]
    pub authorization: Option<Authorization>,
}

/// Run parameters
#[derive(Debug, Clone, Deserialize)]
pub struct Parameters {
    /// Organization URL, e.g. `https://org.crm.dynamics.com`
    #[serde(default)]
    pub organization_url: Option<String>,

    /// Collection to extract
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API version, e.g. `v9.2`
    #[serde(default)]
    pub api_version: Option<String>,

    /// Query clauses, one per line
    #[serde(default)]
    pub query: Option<String>,

    /// Upsert into the destination table
    #[serde(default = "default_true", deserialize_with = "deserialize_flag")]
    pub incremental: bool,

    /// Request formatted-value annotations
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub download_formatted_values: bool,

    /// Verbose logging
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub debug: bool,

    /// Token endpoint override
    #[serde(default)]
    pub token_url: Option<String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            organization_url: None,
            endpoint: None,
            api_version: None,
            query: None,
            incremental: true,
            download_formatted_values: false,
            debug: false,
            token_url: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Flag values as platform configs write them
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Accept `true`/`false`, `0`/`1` and their string forms; null is false
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<FlagValue>::deserialize(deserializer)?;
    match value {
        None => Ok(false),
        Some(FlagValue::Bool(flag)) => Ok(flag),
        Some(FlagValue::Integer(n)) => Ok(n != 0),
        Some(FlagValue::Float(n)) => Ok(n != 0.0),
        Some(FlagValue::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean flag, got \"{other}\""
            ))),
        },
    }
}

/// Authorization block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub oauth_api: Option<OAuthApi>,
}

/// OAuth authorization
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthApi {
    #[serde(default)]
    pub credentials: Option<StoredCredentials>,
}

/// Credentials as stored by the platform
#[derive(Clone, Default, Deserialize)]
pub struct StoredCredentials {
    /// Application (client) id
    #[serde(rename = "appKey", default)]
    pub app_key: Option<String>,

    /// Application secret
    #[serde(rename = "#appSecret", default)]
    pub app_secret: Option<String>,

    /// JSON document holding the refresh token
    #[serde(rename = "#data", default)]
    pub data: Option<String>,
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("app_key", &self.app_key)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "***"))
            .field("data", &self.data.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Deserialize)]
struct StoredTokenData {
    #[serde(default)]
    refresh_token: Option<String>,
}

// ============================================================================
// Validated Config
// ============================================================================

/// Validated extractor configuration
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Organization URL without trailing slashes
    pub organization_url: String,
    /// Requested collection, lowercased
    pub endpoint: String,
    /// API version
    pub api_version: String,
    /// `&`-joined query string
    pub query: String,
    /// Upsert into the destination table
    pub incremental: bool,
    /// Request formatted-value annotations
    pub download_formatted_values: bool,
    /// Verbose logging
    pub debug: bool,
    /// Token endpoint override
    pub token_url: Option<String>,
    /// OAuth credentials
    pub credentials: OAuthCredentials,
}

impl ExtractorConfig {
    /// Load and validate a config file.
    ///
    /// `.yaml`/`.yml` files are read as YAML, anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let file: ConfigFile = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        Self::from_file(file)
    }

    /// Parse and validate a JSON config document
    pub fn from_json(content: &str) -> Result<Self> {
        Self::from_file(serde_json::from_str(content)?)
    }

    /// Validate a parsed config file
    pub fn from_file(file: ConfigFile) -> Result<Self> {
        let ConfigFile {
            parameters,
            authorization,
        } = file;

        let missing: Vec<&str> = MANDATORY_PARAMETERS
            .iter()
            .zip([
                &parameters.organization_url,
                &parameters.endpoint,
                &parameters.api_version,
            ])
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(Error::config(format!(
                "Missing mandatory parameters: {}",
                missing.join(", ")
            )));
        }

        let organization_url = normalize_organization_url(
            parameters.organization_url.as_deref().unwrap_or_default(),
        )?;
        let credentials = parse_credentials(authorization)?;

        Ok(Self {
            organization_url,
            endpoint: parameters
                .endpoint
                .unwrap_or_default()
                .trim()
                .to_lowercase(),
            api_version: parameters.api_version.unwrap_or_default().trim().to_string(),
            query: join_query(parameters.query.as_deref().unwrap_or_default()),
            incremental: parameters.incremental,
            download_formatted_values: parameters.download_formatted_values,
            debug: parameters.debug,
            token_url: parameters.token_url.filter(|url| !url.is_empty()),
            credentials,
        })
    }

    /// API root: `{organization_url}/api/data/{api_version}`
    pub fn base_url(&self) -> String {
        format!("{}/api/data/{}", self.organization_url, self.api_version)
    }

    /// Token refresher for these credentials
    pub fn token_refresher(&self) -> TokenRefresher {
        let refresher = TokenRefresher::new(self.credentials.clone(), &self.organization_url);
        match &self.token_url {
            Some(url) => refresher.token_url(url),
            None => refresher,
        }
    }

    /// Extraction settings writing into `output_dir`
    pub fn extraction(&self, output_dir: impl Into<PathBuf>) -> ExtractionConfig {
        ExtractionConfig::new(&self.endpoint, output_dir)
            .with_query(&self.query)
            .with_incremental(self.incremental)
            .with_formatted_values(self.download_formatted_values)
    }
}

/// Join newline-separated query clauses with `&`, dropping empty lines
pub fn join_query(raw: &str) -> String {
    raw.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("&")
}

/// Default config file location for a data directory
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

/// Output tables directory for a data directory
pub fn tables_output_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(TABLES_OUTPUT_DIR)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

fn normalize_organization_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "Organization URL must use http or https, got \"{trimmed}\""
        )));
    }
    Ok(trimmed.to_string())
}

fn parse_credentials(authorization: Option<Authorization>) -> Result<OAuthCredentials> {
    let stored = authorization
        .and_then(|auth| auth.oauth_api)
        .and_then(|oauth| oauth.credentials)
        .ok_or_else(|| Error::config("Authorization missing. Please authorize the configuration."))?;

    let client_id = non_empty(stored.app_key)
        .ok_or_else(|| Error::config("Authorization is missing the application key (appKey)"))?;
    let client_secret = non_empty(stored.app_secret).ok_or_else(|| {
        Error::config("Authorization is missing the application secret (#appSecret)")
    })?;
    let data = non_empty(stored.data)
        .ok_or_else(|| Error::config("Authorization is missing token data (#data)"))?;

    let token_data: StoredTokenData = serde_json::from_str(&data)
        .map_err(|e| Error::config(format!("Authorization token data is not valid JSON: {e}")))?;
    let refresh_token = non_empty(token_data.refresh_token)
        .ok_or_else(|| Error::config("Authorization token data has no refresh_token"))?;

    Ok(OAuthCredentials::new(client_id, client_secret, refresh_token))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    fn full_config() -> serde_json::Value {
        json!({
            "parameters": {
                "organization_url": "https://contoso.crm.dynamics.com/",
                "endpoint": "Contacts",
                "api_version": "v9.2",
                "query": "$select=fullname,emailaddress1\n\n$filter=statecode eq 0\n",
                "incremental": false,
                "download_formatted_values": true
            },
            "authorization": {
                "oauth_api": {
                    "credentials": {
                        "appKey": "client-id",
                        "#appSecret": "client-secret",
                        "#data": "{\"refresh_token\": \"refresh-me\", \"token_type\": \"Bearer\"}"
                    }
                }
            }
        })
    }

    #[test]
    fn test_join_query() {
        assert_eq!(join_query("$select=a\n\n$top=5\n"), "$select=a&$top=5");
        assert_eq!(join_query("$select=a\r\n$top=5"), "$select=a&$top=5");
        assert_eq!(join_query(""), "");
        assert_eq!(join_query("\n\n"), "");
    }

    #[test]
    fn test_full_config() {
        let config = ExtractorConfig::from_json(&full_config().to_string()).unwrap();

        assert_eq!(config.organization_url, "https://contoso.crm.dynamics.com");
        assert_eq!(config.endpoint, "contacts");
        assert_eq!(config.api_version, "v9.2");
        assert_eq!(
            config.query,
            "$select=fullname,emailaddress1&$filter=statecode eq 0"
        );
        assert!(!config.incremental);
        assert!(config.download_formatted_values);
        assert!(!config.debug);
        assert_eq!(
            config.credentials,
            OAuthCredentials::new("client-id", "client-secret", "refresh-me")
        );
        assert_eq!(
            config.base_url(),
            "https://contoso.crm.dynamics.com/api/data/v9.2"
        );
    }

    #[test]
    fn test_defaults() {
        let mut value = full_config();
        let params = value["parameters"].as_object_mut().unwrap();
        params.remove("query");
        params.remove("incremental");
        params.remove("download_formatted_values");

        let config = ExtractorConfig::from_json(&value.to_string()).unwrap();
        assert_eq!(config.query, "");
        assert!(config.incremental);
        assert!(!config.download_formatted_values);
        assert!(config.token_url.is_none());
    }

    #[test]
    fn test_integer_flags() {
        let mut value = full_config();
        value["parameters"]["incremental"] = json!(0);
        value["parameters"]["download_formatted_values"] = json!(1);
        value["parameters"]["debug"] = json!(1);

        let config = ExtractorConfig::from_json(&value.to_string()).unwrap();
        assert!(!config.incremental);
        assert!(config.download_formatted_values);
        assert!(config.debug);

        value["parameters"]["incremental"] = json!(1);
        let config = ExtractorConfig::from_json(&value.to_string()).unwrap();
        assert!(config.incremental);
    }

    #[test]
    fn test_string_flags() {
        let mut value = full_config();
        value["parameters"]["incremental"] = json!("false");
        value["parameters"]["download_formatted_values"] = json!("True");

        let config = ExtractorConfig::from_json(&value.to_string()).unwrap();
        assert!(!config.incremental);
        assert!(config.download_formatted_values);

        value["parameters"]["incremental"] = json!("sometimes");
        assert!(matches!(
            ExtractorConfig::from_json(&value.to_string()).unwrap_err(),
            Error::JsonParse(_)
        ));
    }

    #[test]
    fn test_null_flag_is_false() {
        let mut value = full_config();
        value["parameters"]["incremental"] = json!(null);

        let config = ExtractorConfig::from_json(&value.to_string()).unwrap();
        assert!(!config.incremental);
    }

    #[test]
    fn test_missing_parameters_reported_together() {
        let mut value = full_config();
        let params = value["parameters"].as_object_mut().unwrap();
        params.remove("organization_url");
        params.insert("api_version".to_string(), json!(""));

        let err = ExtractorConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing mandatory parameters: organization_url, api_version"
        );
    }

    #[test]
    fn test_missing_authorization() {
        let mut value = full_config();
        value.as_object_mut().unwrap().remove("authorization");

        let err = ExtractorConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("Authorization missing"));
    }

    #[test]
    fn test_token_data_without_refresh_token() {
        let mut value = full_config();
        value["authorization"]["oauth_api"]["credentials"]["#data"] = json!("{\"access_token\": \"x\"}");

        let err = ExtractorConfig::from_json(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("refresh_token"));
    }

    #[test]
    fn test_token_data_not_json() {
        let mut value = full_config();
        value["authorization"]["oauth_api"]["credentials"]["#data"] = json!("not json");

        let err = ExtractorConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_invalid_organization_url() {
        let mut value = full_config();
        value["parameters"]["organization_url"] = json!("contoso.crm.dynamics.com");
        assert!(matches!(
            ExtractorConfig::from_json(&value.to_string()).unwrap_err(),
            Error::InvalidUrl(_)
        ));

        value["parameters"]["organization_url"] = json!("ftp://contoso.crm.dynamics.com");
        assert!(matches!(
            ExtractorConfig::from_json(&value.to_string()).unwrap_err(),
            Error::Configuration { .. }
        ));
    }

    #[test]
    fn test_extraction_settings() {
        let config = ExtractorConfig::from_json(&full_config().to_string()).unwrap();
        let extraction = config.extraction("/data/out/tables");

        assert_eq!(extraction.endpoint, "contacts");
        assert_eq!(extraction.query, config.query);
        assert!(!extraction.incremental);
        assert!(extraction.fetch.formatted_values);
        assert_eq!(extraction.output_dir, PathBuf::from("/data/out/tables"));
    }

    #[test]
    fn test_token_url_override() {
        let mut value = full_config();
        value["parameters"]["token_url"] = json!("http://localhost:9999/token");

        let config = ExtractorConfig::from_json(&value.to_string()).unwrap();
        assert_eq!(
            config.token_refresher().endpoint(),
            "http://localhost:9999/token"
        );

        let default = ExtractorConfig::from_json(&full_config().to_string()).unwrap();
        assert_eq!(
            default.token_refresher().endpoint(),
            crate::auth::DEFAULT_TOKEN_URL
        );
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(full_config().to_string().as_bytes()).unwrap();

        let config = ExtractorConfig::load(file.path()).unwrap();
        assert_eq!(config.endpoint, "contacts");
    }

    #[test]
    fn test_load_yaml_file() {
        let yaml = r##"
parameters:
  organization_url: https://contoso.crm.dynamics.com
  endpoint: accounts
  api_version: v9.1
  query: |
    $select=name
    $top=10
authorization:
  oauth_api:
    credentials:
      appKey: client-id
      "#appSecret": client-secret
      "#data": '{"refresh_token": "refresh-me"}'
"##;
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = ExtractorConfig::load(file.path()).unwrap();
        assert_eq!(config.endpoint, "accounts");
        assert_eq!(config.query, "$select=name&$top=10");
        assert_eq!(config.credentials.refresh_token, "refresh-me");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ExtractorConfig::load("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_data_dir_paths() {
        let data_dir = Path::new("/data");
        assert_eq!(default_config_path(data_dir), PathBuf::from("/data/config.json"));
        assert_eq!(tables_output_dir(data_dir), PathBuf::from("/data/out/tables"));
    }

    #[test]
    fn test_stored_credentials_debug_redacts() {
        let stored = StoredCredentials {
            app_key: Some("client-id".to_string()),
            app_secret: Some("client-secret".to_string()),
            data: Some("{\"refresh_token\": \"refresh-me\"}".to_string()),
        };
        let debug = format!("{stored:?}");
        assert!(debug.contains("client-id"));
        assert!(!debug.contains("client-secret"));
        assert!(!debug.contains("refresh-me"));
    }
}
