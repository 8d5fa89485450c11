//! Centralized configuration management for mechdesk

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Result, Context};
use tracing::warn;

/// Base URL used when `MECHDESK_API_URL` is not set. Local development only.
pub const FALLBACK_API_URL: &str = "http://localhost:8000";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the marketplace REST API
    pub api_url: String,
    /// Whether `api_url` came from the hardcoded fallback
    pub api_url_is_fallback: bool,
    /// File holding the persisted access token
    pub token_path: PathBuf,
    /// HTTP client configuration
    pub http: HttpConfig,
    /// Console behaviour
    pub ui: UiConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds, none by default
    pub timeout_seconds: Option<u64>,
    /// User agent string
    pub user_agent: String,
}

/// Console configuration
#[derive(Debug, Clone)]
pub struct UiConfig {
    /// How long a toast stays visible (milliseconds)
    pub toast_timeout_ms: u64,
    /// Rows per table page
    pub page_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            user_agent: "mechdesk/0.1.0".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_timeout_ms: 3000,
            page_size: 20,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let (api_url, api_url_is_fallback) = match std::env::var("MECHDESK_API_URL") {
            Ok(url) if !url.trim().is_empty() => (url.trim_end_matches('/').to_string(), false),
            _ => {
                warn!("MECHDESK_API_URL not set, falling back to {}", FALLBACK_API_URL);
                (FALLBACK_API_URL.to_string(), true)
            }
        };

        let token_path = match std::env::var("MECHDESK_TOKEN_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_token_path(),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("MECHDESK_HTTP_TIMEOUT_SECONDS")?,
            user_agent: std::env::var("MECHDESK_USER_AGENT")
                .unwrap_or_else(|_| "mechdesk/0.1.0".to_string()),
        };

        let ui = UiConfig {
            toast_timeout_ms: parse_env_var("MECHDESK_TOAST_TIMEOUT_MS")?.unwrap_or(3000),
            page_size: parse_env_var("MECHDESK_PAGE_SIZE")?.unwrap_or(20),
        };

        Ok(Config {
            api_url,
            api_url_is_fallback,
            token_path,
            http,
            ui,
        })
    }

    /// Get HTTP timeout as Duration, if one is configured
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http.timeout_seconds.map(Duration::from_secs)
    }

    /// Get toast lifetime as Duration
    pub fn toast_timeout(&self) -> Duration {
        Duration::from_millis(self.ui.toast_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(anyhow::anyhow!(
                "API base URL must be http or https: {}",
                self.api_url
            ));
        }

        if self.ui.page_size == 0 {
            return Err(anyhow::anyhow!("MECHDESK_PAGE_SIZE must be at least 1"));
        }

        // Make sure the token can be written later
        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Cannot create token directory: {}", parent.display())
                })?;
            }
        }

        Ok(())
    }
}

/// Token file location inside the platform config directory
fn default_token_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "mechdesk")
        .map(|dirs| dirs.config_dir().join("session.json"))
        .unwrap_or_else(|| PathBuf::from("./mechdesk-session.json"))
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config(api_url: &str, dir: &tempfile::TempDir) -> Config {
        Config {
            api_url: api_url.to_string(),
            api_url_is_fallback: false,
            token_path: dir.path().join("nested").join("session.json"),
            http: HttpConfig::default(),
            ui: UiConfig::default(),
        }
    }

    #[test]
    fn test_config_defaults() {
        let http = HttpConfig::default();
        let ui = UiConfig::default();
        assert_eq!(http.timeout_seconds, None);
        assert_eq!(ui.toast_timeout_ms, 3000);
        assert_eq!(ui.page_size, 20);
    }

    #[test]
    fn test_config_validation() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config("http://localhost:8000", &dir);
        config.validate().unwrap();
        assert!(config.token_path.parent().unwrap().exists());

        assert!(sample_config("not a url", &dir).validate().is_err());
        assert!(sample_config("ftp://example.com", &dir).validate().is_err());
    }

    #[test]
    fn test_parse_env_var_reports_variable() {
        std::env::set_var("MECHDESK_TEST_BAD_NUMBER", "abc");
        let err = parse_env_var::<u64>("MECHDESK_TEST_BAD_NUMBER").unwrap_err();
        assert!(err.to_string().contains("MECHDESK_TEST_BAD_NUMBER"));
        assert_eq!(parse_env_var::<u64>("MECHDESK_TEST_UNSET_VARIABLE").unwrap(), None);
    }
}
