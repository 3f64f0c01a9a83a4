//! # Config Command
//!
//! Manages where the CLI sends its requests.
//!
//! ## Usage
//!
//! ```bash
//! # Show stored values and the effective base URL
//! portal config show
//!
//! # Talk to an external API
//! portal config set-api-url https://staging.portal.app/api/v1
//!
//! # Go through the application's same-origin proxy
//! portal config set-proxy-path /api/proxy --origin https://portal.app
//!
//! # Back to defaults
//! portal config reset
//! ```

use anyhow::Result;
use colored::Colorize;

use crate::config::{
    API_URL_ENV_VAR, APP_ORIGIN_ENV_VAR, Config, PROXY_PATH_ENV_VAR, session_path,
};
use crate::errors::{display_success, display_validation_error, display_warning};
use crate::exit_codes::*;

/// Config subcommands
#[derive(Debug, Clone)]
pub enum ConfigAction {
    /// Show configuration
    Show,
    /// Store an external API URL
    SetApiUrl { url: String },
    /// Store a proxy path and optionally the origin it is served from
    SetProxyPath { path: String, origin: Option<String> },
    /// Delete the configuration file
    Reset,
}

/// Execute a config subcommand
///
/// # Returns
///
/// * `Ok(EXIT_SUCCESS)` - Done
/// * `Ok(EXIT_INVALID_INPUT)` - The given URL is not usable
/// * `Err(_)` - Configuration file could not be read or written
pub fn execute(action: ConfigAction) -> Result<i32> {
    match action {
        ConfigAction::Show => show(),
        ConfigAction::SetApiUrl { url } => {
            if !is_http_url(&url) {
                display_validation_error("The API URL must start with http:// or https://");
                return Ok(EXIT_INVALID_INPUT);
            }
            let mut config = Config::load_or_default()?;
            config.api_url = Some(url.trim().trim_end_matches('/').to_string());
            config.save()?;
            display_success(&format!("API URL set; requests now go to {}", config.base_url()));
            warn_if_overridden(&config);
            Ok(EXIT_SUCCESS)
        }
        ConfigAction::SetProxyPath { path, origin } => {
            if path.trim().is_empty() {
                display_validation_error("The proxy path cannot be empty");
                return Ok(EXIT_INVALID_INPUT);
            }
            if let Some(origin) = origin.as_deref().filter(|o| !is_http_url(o)) {
                display_validation_error(&format!(
                    "The origin must start with http:// or https:// (got {})",
                    origin
                ));
                return Ok(EXIT_INVALID_INPUT);
            }
            let mut config = Config::load_or_default()?;
            config.proxy_path = Some(path.trim().to_string());
            if origin.is_some() {
                config.app_origin = origin;
            }
            config.save()?;
            display_success(&format!("Proxy set; requests now go to {}", config.base_url()));
            warn_if_overridden(&config);
            Ok(EXIT_SUCCESS)
        }
        ConfigAction::Reset => {
            Config::delete()?;
            display_success("Configuration reset to defaults");
            Ok(EXIT_SUCCESS)
        }
    }
}

fn show() -> Result<i32> {
    let config = Config::load_or_default()?;
    let stored = config.resolve_stored();
    let effective = config.resolve_base_url();

    println!();
    println!("{}", "Portal Configuration".bold().underline());
    println!();

    println!("{}", "Stored".cyan().bold());
    println!("  {} {}", "API URL:".dimmed(), show_opt(&config.api_url));
    println!("  {} {}", "Proxy path:".dimmed(), show_opt(&config.proxy_path));
    println!("  {} {}", "App origin:".dimmed(), show_opt(&config.app_origin));
    println!("  {} {}s", "Timeout:".dimmed(), config.timeout().as_secs());
    println!();

    println!("{}", "Environment".cyan().bold());
    for var in [PROXY_PATH_ENV_VAR, API_URL_ENV_VAR, APP_ORIGIN_ENV_VAR] {
        let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        println!("  {} {}", format!("{}:", var).dimmed(), show_opt(&value));
    }
    println!();

    println!("{}", "Effective".cyan().bold());
    println!(
        "  {} {} ({})",
        "Base URL:".dimmed(),
        effective.url.green(),
        effective.source
    );
    if effective != stored {
        println!(
            "  {} environment overrides stored {}",
            "→".cyan(),
            stored.url
        );
    }
    if let Ok(path) = session_path() {
        println!("  {} {}", "Session file:".dimmed(), path.display());
    }
    println!();

    Ok(EXIT_SUCCESS)
}

fn warn_if_overridden(config: &Config) {
    if config.resolve_base_url() != config.resolve_stored() {
        display_warning("An environment variable overrides the stored value");
    }
}

fn show_opt(value: &Option<String>) -> String {
    match value {
        Some(v) => v.clone(),
        None => "(not set)".dimmed().to_string(),
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    (value.starts_with("http://") && value.len() > "http://".len())
        || (value.starts_with("https://") && value.len() > "https://".len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    fn with_config_home<F: FnOnce()>(f: F) {
        let temp_dir = TempDir::new().unwrap();
        let original = env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", temp_dir.path());
            env::remove_var(API_URL_ENV_VAR);
            env::remove_var(PROXY_PATH_ENV_VAR);
            env::remove_var(APP_ORIGIN_ENV_VAR);
        }
        f();
        unsafe {
            match original {
                Some(value) => env::set_var("XDG_CONFIG_HOME", value),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://api.portal.app"));
        assert!(is_http_url(" http://localhost:4000 "));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("api.portal.app"));
    }

    #[test]
    #[serial]
    fn test_set_api_url_persists() {
        with_config_home(|| {
            let code = execute(ConfigAction::SetApiUrl {
                url: "https://staging.portal.app/api/v1/".to_string(),
            })
            .unwrap();
            assert_eq!(code, EXIT_SUCCESS);

            let config = Config::load().unwrap();
            assert_eq!(
                config.api_url.as_deref(),
                Some("https://staging.portal.app/api/v1")
            );
        });
    }

    #[test]
    #[serial]
    fn test_set_proxy_path_rejects_bad_origin() {
        with_config_home(|| {
            let code = execute(ConfigAction::SetProxyPath {
                path: "/api/proxy".to_string(),
                origin: Some("portal.app".to_string()),
            })
            .unwrap();
            assert_eq!(code, EXIT_INVALID_INPUT);
            assert!(!Config::exists());
        });
    }

    #[test]
    #[serial]
    fn test_reset_then_show() {
        with_config_home(|| {
            execute(ConfigAction::SetProxyPath {
                path: "/api/proxy".to_string(),
                origin: None,
            })
            .unwrap();
            assert!(Config::exists());

            assert_eq!(execute(ConfigAction::Reset).unwrap(), EXIT_SUCCESS);
            assert!(!Config::exists());
            assert_eq!(execute(ConfigAction::Show).unwrap(), EXIT_SUCCESS);
        });
    }
}
