//! # Configuration Management
//!
//! This module handles loading and saving client configuration and resolving
//! the API base URL.
//!
//! ## Configuration File Location
//!
//! All platforms: `$HOME/.config/portal/config.json`
//!
//! `$XDG_CONFIG_HOME` is honoured when set. On Windows, uses
//! `%USERPROFILE%\.config\portal\config.json` if `$HOME` is not set.
//!
//! ## Base URL Resolution
//!
//! The base URL is resolved once, when a client is built, in this order:
//!
//! 1. Proxy path (`PORTAL_PROXY_PATH`, else `proxy_path`): requests go through
//!    the application's own origin. Relative paths are joined onto
//!    `PORTAL_APP_ORIGIN` / `app_origin` (default `http://localhost:3000`).
//! 2. External URL (`PORTAL_API_URL`, else `api_url`).
//! 3. The production fallback URL.
//!
//! Environment variables take precedence over values stored in the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Fallback API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.portal.app/api/v1";

/// Origin that relative proxy paths are joined onto
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:3000";

/// Request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable for the external API URL
pub const API_URL_ENV_VAR: &str = "PORTAL_API_URL";

/// Environment variable for the same-origin proxy path
pub const PROXY_PATH_ENV_VAR: &str = "PORTAL_PROXY_PATH";

/// Environment variable for the application origin
pub const APP_ORIGIN_ENV_VAR: &str = "PORTAL_APP_ORIGIN";

/// Where the resolved base URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseUrlSource {
    /// Same-origin proxy path
    Proxy,
    /// Externally configured API URL
    External,
    /// Built-in production URL
    Fallback,
}

impl fmt::Display for BaseUrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BaseUrlSource::Proxy => "proxy",
            BaseUrlSource::External => "external",
            BaseUrlSource::Fallback => "fallback",
        };
        f.write_str(label)
    }
}

/// A base URL together with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedBaseUrl {
    /// Base URL without a trailing slash
    pub url: String,
    /// Which setting produced it
    pub source: BaseUrlSource,
}

/// Client configuration
///
/// # Example
///
/// ```rust
/// use portal::config::{BaseUrlSource, Config};
///
/// let config = Config::with_api_url("https://api.example.com/");
/// let resolved = config.resolve_stored();
/// assert_eq!(resolved.url, "https://api.example.com");
/// assert_eq!(resolved.source, BaseUrlSource::External);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// External API URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Same-origin proxy path (e.g. `/api/proxy`) or absolute proxy URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_path: Option<String>,
    /// Origin that a relative proxy path is served from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_origin: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            proxy_path: None,
            app_origin: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Configuration pointing at an external API URL.
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            api_url: Some(api_url.to_string()),
            ..Self::default()
        }
    }

    /// Resolve the effective base URL, letting environment variables override
    /// stored values.
    pub fn resolve_base_url(&self) -> ResolvedBaseUrl {
        let proxy_path = env_or(PROXY_PATH_ENV_VAR, self.proxy_path.as_deref());
        let app_origin = env_or(APP_ORIGIN_ENV_VAR, self.app_origin.as_deref());
        let api_url = env_or(API_URL_ENV_VAR, self.api_url.as_deref());
        resolve_base_url(
            proxy_path.as_deref(),
            app_origin.as_deref(),
            api_url.as_deref(),
        )
    }

    /// Resolve the base URL from stored values only.
    pub fn resolve_stored(&self) -> ResolvedBaseUrl {
        resolve_base_url(
            self.proxy_path.as_deref(),
            self.app_origin.as_deref(),
            self.api_url.as_deref(),
        )
    }

    /// Effective base URL string.
    pub fn base_url(&self) -> String {
        self.resolve_base_url().url
    }

    /// Request timeout. Zero falls back to the default.
    pub fn timeout(&self) -> Duration {
        let secs = if self.timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            self.timeout_secs
        };
        Duration::from_secs(secs)
    }

    /// Load configuration from the default config file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(_)` - Configuration file not found or invalid
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration, or defaults when no file exists yet.
    ///
    /// A file that exists but cannot be parsed is still an error.
    pub fn load_or_default() -> Result<Self> {
        if Self::exists() {
            Self::load()
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default config file
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Check if a configuration file exists
    pub fn exists() -> bool {
        config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Delete the configuration file
    ///
    /// Succeeds when the file didn't exist.
    pub fn delete() -> Result<()> {
        let path = config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete config file: {}", path.display()))?;
        }
        Ok(())
    }
}

/// Resolve a base URL from explicit values.
///
/// Blank values are ignored. A relative proxy path is joined onto
/// `app_origin` (or [`DEFAULT_APP_ORIGIN`]).
pub fn resolve_base_url(
    proxy_path: Option<&str>,
    app_origin: Option<&str>,
    api_url: Option<&str>,
) -> ResolvedBaseUrl {
    if let Some(proxy) = non_blank(proxy_path) {
        let url = if is_absolute(proxy) {
            proxy.to_string()
        } else {
            let origin = non_blank(app_origin).unwrap_or(DEFAULT_APP_ORIGIN);
            format!(
                "{}/{}",
                origin.trim_end_matches('/'),
                proxy.trim_start_matches('/')
            )
        };
        return ResolvedBaseUrl {
            url: trim_url(&url),
            source: BaseUrlSource::Proxy,
        };
    }

    if let Some(url) = non_blank(api_url) {
        return ResolvedBaseUrl {
            url: trim_url(url),
            source: BaseUrlSource::External,
        };
    }

    ResolvedBaseUrl {
        url: DEFAULT_BASE_URL.to_string(),
        source: BaseUrlSource::Fallback,
    }
}

fn env_or(var: &str, stored: Option<&str>) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| stored.map(str::to_string))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Directory holding the configuration and session files.
pub fn portal_dir() -> Result<PathBuf> {
    let config_dir = dirs_config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("portal"))
}

/// Path of the persisted session store.
pub fn session_path() -> Result<PathBuf> {
    Ok(portal_dir()?.join("session.json"))
}

/// Get the path to the configuration file
fn config_path() -> Result<PathBuf> {
    Ok(portal_dir()?.join("config.json"))
}

/// Get the config directory
///
/// Uses `$HOME/.config` on all platforms for consistency.
fn dirs_config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .or_else(|| std::env::var("USERPROFILE").ok())
                .map(|h| PathBuf::from(h).join(".config"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    fn clear_env() {
        // SAFETY: Tests touching the environment are marked #[serial]
        unsafe {
            env::remove_var(API_URL_ENV_VAR);
            env::remove_var(PROXY_PATH_ENV_VAR);
            env::remove_var(APP_ORIGIN_ENV_VAR);
        }
    }

    #[test]
    fn test_proxy_path_wins_over_external_url() {
        let resolved = resolve_base_url(
            Some("/api/proxy"),
            Some("https://portal.app/"),
            Some("https://api.example.com"),
        );
        assert_eq!(resolved.url, "https://portal.app/api/proxy");
        assert_eq!(resolved.source, BaseUrlSource::Proxy);
    }

    #[test]
    fn test_relative_proxy_uses_default_origin() {
        let resolved = resolve_base_url(Some("api/proxy/"), None, None);
        assert_eq!(resolved.url, "http://localhost:3000/api/proxy");
    }

    #[test]
    fn test_absolute_proxy_is_used_verbatim() {
        let resolved = resolve_base_url(Some("https://edge.portal.app/proxy/"), None, None);
        assert_eq!(resolved.url, "https://edge.portal.app/proxy");
        assert_eq!(resolved.source, BaseUrlSource::Proxy);
    }

    #[test]
    fn test_external_url_when_no_proxy() {
        let resolved = resolve_base_url(Some("  "), None, Some("http://localhost:8000/"));
        assert_eq!(resolved.url, "http://localhost:8000");
        assert_eq!(resolved.source, BaseUrlSource::External);
    }

    #[test]
    fn test_fallback_when_nothing_configured() {
        let resolved = resolve_base_url(None, None, Some(""));
        assert_eq!(resolved.url, DEFAULT_BASE_URL);
        assert_eq!(resolved.source, BaseUrlSource::Fallback);
    }

    #[test]
    fn test_config_default_timeout() {
        let config = Config::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));

        let zero = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(zero.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_serialization_skips_unset() {
        let json = serde_json::to_string(&Config::with_api_url("https://api.example.com")).unwrap();
        assert!(json.contains("https://api.example.com"));
        assert!(!json.contains("proxy_path"));
    }

    #[test]
    #[serial]
    fn test_env_var_takes_precedence() {
        clear_env();
        let config = Config::with_api_url("http://stored.example.com");

        // SAFETY: Tests touching the environment are marked #[serial]
        unsafe { env::set_var(API_URL_ENV_VAR, "http://env.example.com") };
        assert_eq!(config.base_url(), "http://env.example.com");

        clear_env();
        assert_eq!(config.base_url(), "http://stored.example.com");
    }

    #[test]
    #[serial]
    fn test_env_proxy_overrides_stored_api_url() {
        clear_env();
        let config = Config::with_api_url("http://stored.example.com");

        // SAFETY: Tests touching the environment are marked #[serial]
        unsafe {
            env::set_var(PROXY_PATH_ENV_VAR, "/api/proxy");
            env::set_var(APP_ORIGIN_ENV_VAR, "https://portal.app");
        }
        let resolved = config.resolve_base_url();
        assert_eq!(resolved.url, "https://portal.app/api/proxy");
        assert_eq!(resolved.source, BaseUrlSource::Proxy);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_env_var_is_ignored() {
        clear_env();
        // SAFETY: Tests touching the environment are marked #[serial]
        unsafe { env::set_var(API_URL_ENV_VAR, "  ") };
        let config = Config::with_api_url("http://stored.example.com");
        assert_eq!(config.base_url(), "http://stored.example.com");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        // SAFETY: Tests touching the environment are marked #[serial]
        unsafe { env::set_var("XDG_CONFIG_HOME", temp_dir.path()) };

        assert!(!Config::exists());
        assert_eq!(Config::load_or_default().unwrap(), Config::default());

        let config = Config {
            proxy_path: Some("/api/proxy".to_string()),
            ..Config::with_api_url("http://test.example.com")
        };
        config.save().unwrap();

        assert!(Config::exists());
        assert_eq!(Config::load().unwrap(), config);
        assert_eq!(
            session_path().unwrap(),
            temp_dir.path().join("portal").join("session.json")
        );

        Config::delete().unwrap();
        Config::delete().unwrap();
        assert!(!Config::exists());

        // SAFETY: Tests touching the environment are marked #[serial]
        unsafe { env::remove_var("XDG_CONFIG_HOME") };
    }
}
