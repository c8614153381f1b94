//! Configuration types for konversi-data

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Upload and download size limit: 500 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Sheet name used when the caller does not provide one
pub const DEFAULT_SHEET_NAME: &str = "Data";

/// Language used for user-facing error messages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English messages
    #[serde(alias = "en")]
    English,
    /// Indonesian messages (default)
    #[default]
    #[serde(alias = "id")]
    Indonesian,
}

impl std::str::FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "id" | "indonesian" => Ok(Locale::Indonesian),
            other => Err(Error::Config {
                message: format!("unknown locale '{}', expected 'en' or 'id'", other),
                key: Some("locale".to_string()),
            }),
        }
    }
}

/// Main configuration for the conversion service
///
/// Fields are organized into logical sub-configs:
/// - [`api`](ApiConfig) - bind address, CORS, upload limit, Swagger UI
/// - [`storage`](StorageConfig) - temp directories and the stats database
/// - [`fetch`](FetchConfig) - remote URL fetching behaviour
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Filesystem locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Language for error messages returned to clients
    #[serde(default)]
    pub locale: Locale,
}

impl Config {
    /// Check settings that serde defaults cannot guarantee
    pub fn validate(&self) -> Result<()> {
        if self.api.max_upload_bytes == 0 {
            return Err(Error::Config {
                message: "max_upload_bytes must be greater than zero".to_string(),
                key: Some("max_upload_bytes".to_string()),
            });
        }
        if self.fetch.timeout.is_zero() {
            return Err(Error::Config {
                message: "fetch timeout must be greater than zero".to_string(),
                key: Some("fetch.timeout".to_string()),
            });
        }
        if self.storage.upload_dir == self.storage.output_dir {
            return Err(Error::Config {
                message: "upload_dir and output_dir must be different directories".to_string(),
                key: Some("output_dir".to_string()),
            });
        }
        Ok(())
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: the bundled frontend origins)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: false)
    #[serde(default)]
    pub swagger_ui: bool,

    /// Largest accepted request body in bytes (default: 500 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: false,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Filesystem locations for temporary files and persistent state
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Where uploaded/downloaded inputs are staged (default: "temp_uploads")
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Where generated workbooks are written (default: "temp_outputs")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// SQLite database for usage statistics (default: "data/conversion_stats.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
            database_path: default_database_path(),
        }
    }
}

/// Remote URL fetching configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetchConfig {
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 10)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Largest accepted response body in bytes (default: 500 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_body_bytes: u64,

    /// User-Agent sent with every request (a desktop browser string)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language sent with every request
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_fetch_timeout(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_upload_bytes(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3030".to_string(),
        "http://konversi-data-frontend:3030".to_string(),
    ]
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("temp_uploads")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("temp_outputs")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data").join("conversion_stats.db")
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7".to_string()
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.bind_address.port(), 8000);
        assert_eq!(config.api.max_upload_bytes, 500 * 1024 * 1024);
        assert_eq!(config.fetch.timeout, Duration::from_secs(60));
        assert_eq!(config.locale, Locale::Indonesian);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let json = r#"{
            "api": { "cors_origins": ["http://example.com"] },
            "fetch": { "timeout": 5 },
            "locale": "en"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.api.cors_origins, vec!["http://example.com"]);
        assert!(config.api.cors_enabled);
        assert_eq!(config.fetch.timeout, Duration::from_secs(5));
        assert_eq!(config.fetch.max_redirects, 10);
        assert_eq!(config.locale, Locale::English);
        assert_eq!(config.storage.output_dir, PathBuf::from("temp_outputs"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.api.max_upload_bytes = 0;
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let mut config = Config::default();
        config.storage.output_dir = config.storage.upload_dir.clone();
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_parse_origin_list() {
        assert_eq!(
            parse_origin_list("http://a.com, http://b.com,,"),
            vec!["http://a.com", "http://b.com"]
        );
        assert!(parse_origin_list(" , ").is_empty());
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::English);
        assert_eq!("id".parse::<Locale>().unwrap(), Locale::Indonesian);
        assert!("fr".parse::<Locale>().is_err());
    }
}
