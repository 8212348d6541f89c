//! Configuration management for the campus admin dashboard

use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};
use validator::{Validate, ValidationError};

/// Environment variable prefix, e.g. `CAMPUS_ADMIN_BACKEND__BASE_URL`
pub const ENV_PREFIX: &str = "CAMPUS_ADMIN";

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "campus-admin";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    /// REST backend configuration
    #[serde(default)]
    #[validate(nested)]
    pub backend: BackendConfig,

    /// Dashboard HTTP server configuration
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,

    /// Browser session configuration
    #[serde(default)]
    #[validate(nested)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
}

/// REST backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BackendConfig {
    /// Base URL of the backend, without a trailing `/api`
    #[serde(default = "default_base_url")]
    #[validate(custom(function = "validate_http_url"))]
    pub base_url: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    #[validate(range(min = 1))]
    pub connect_timeout_secs: u64,
}

/// Dashboard HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    #[validate(length(min = 1))]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,
}

/// Browser session configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    /// Seconds between token verifications
    #[serde(default = "default_verify_interval")]
    #[validate(range(min = 1))]
    pub verify_interval_secs: u64,

    /// Seconds without a request after which a browser session is dropped
    #[serde(default = "default_idle_timeout")]
    #[validate(range(min = 1))]
    pub idle_timeout_secs: u64,

    /// Name of the cookie carrying the dashboard session id
    #[serde(default = "default_cookie_name")]
    #[validate(length(min = 1))]
    pub cookie_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Multi-line human readable output
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Pretty => write!(f, "pretty"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(crate::Error::Validation {
                field: "logging.format".to_string(),
                message: format!("unknown log format '{other}', expected json or pretty"),
            }),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_connect_timeout() -> u64 {
    5
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_verify_interval() -> u64 {
    300
}

const fn default_idle_timeout() -> u64 {
    8 * 60 * 60
}

fn default_cookie_name() -> String {
    "campus_admin_session".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));

    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => {
            let mut err = ValidationError::new("http_url");
            err.message = Some("must be an http:// or https:// URL".into());
            Err(err)
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verify_interval_secs: default_verify_interval(),
            idle_timeout_secs: default_idle_timeout(),
            cookie_name: default_cookie_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file and the environment
    ///
    /// Without an explicit path, `campus-admin.{toml,yaml,json}` in the
    /// working directory is used if present. Environment variables override
    /// file values.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or malformed, or if
    /// the merged values fail to deserialize.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check field constraints
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` naming the first offending field.
    pub fn validate_all(&self) -> crate::Result<()> {
        self.validate().map_err(crate::Error::from)
    }

    /// Address the dashboard server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.backend.connect_timeout_secs, 5);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);

        assert_eq!(config.session.verify_interval_secs, 300);
        assert_eq!(config.session.idle_timeout_secs, 28_800);
        assert_eq!(config.session.cookie_name, "campus_admin_session");

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);

        assert!(config.validate_all().is_ok());
    }

    #[test]
    fn test_bind_address() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 8088;

        assert_eq!(config.bind_address(), "127.0.0.1:8088");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
[backend]
base_url = "https://api.campus.example"

[server]
port = 4100

[logging]
format = "pretty"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.backend.base_url, "https://api.campus.example");
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.session.verify_interval_secs, 300);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, crate::Error::Configuration { .. }));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = Config::default();
        config.backend.base_url = "ftp://files.example".to_string();

        match config.validate_all().unwrap_err() {
            crate::Error::Validation { field, message } => {
                assert_eq!(field, "base_url");
                assert!(message.contains("http"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.session.verify_interval_secs = 0;

        assert!(config.validate_all().is_err());

        let mut config = Config::default();
        config.session.idle_timeout_secs = 0;
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;

        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Pretty.to_string(), "pretty");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_like = serde_json::to_value(&config).unwrap();

        assert_eq!(toml_like["session"]["cookie_name"], "campus_admin_session");
        assert_eq!(toml_like["logging"]["format"], "json");
    }
}
