//! # Status Command
//!
//! Implements `status` (where requests go, who is logged in, whether the
//! API answers) and `whoami`.
//!
//! ## Usage
//!
//! ```bash
//! portal status
//! portal whoami --json
//! ```

use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;
use crate::config::{Config, ResolvedBaseUrl};
use crate::exit_codes::*;

use super::{build_client, print_json, report};

/// Execute the status command
///
/// # Returns
///
/// * `Ok(EXIT_SUCCESS)` - API reachable and a session is stored
/// * `Ok(EXIT_AUTH_ERROR)` - API reachable but not logged in
/// * `Ok(EXIT_NETWORK_ERROR)` - Cannot reach the API
/// * `Ok(EXIT_SERVICE_UNAVAILABLE)` - API answered with a failure status
pub async fn execute() -> Result<i32> {
    let config = Config::load_or_default()?;
    let client = build_client()?;
    Ok(run(&client, &config.resolve_base_url()).await)
}

pub(crate) async fn run(client: &ApiClient, resolved: &ResolvedBaseUrl) -> i32 {
    println!("{}", "Portal Status".bold());
    println!("{}", "─".repeat(40).dimmed());
    println!();

    println!(
        "{} API Endpoint: {} ({})",
        "ℹ".blue(),
        resolved.url.cyan(),
        resolved.source.to_string().dimmed()
    );
    println!("{} Timeout: {}s", "ℹ".blue(), client.timeout().as_secs());

    let healthy = match client.health_check().await {
        Ok(true) => {
            println!(
                "{} API Status: {}",
                "✓".bright_green().bold(),
                "Healthy".green()
            );
            true
        }
        Ok(false) => {
            println!(
                "{} API Status: {}",
                "⚠".yellow().bold(),
                "Unhealthy".yellow()
            );
            println!("  {} The API returned a non-success status", "→".cyan());
            false
        }
        Err(e) => {
            println!("{} API Status: {}", "✗".red().bold(), "Unreachable".red());
            println!("  {} {}", "Error:".dimmed(), e.to_string().dimmed());
            return EXIT_NETWORK_ERROR;
        }
    };

    println!();
    let session = match client.session().snapshot() {
        Ok(session) => session,
        Err(e) => {
            println!("{} Session: {}", "✗".red().bold(), e.to_string().red());
            return EXIT_SESSION_ERROR;
        }
    };

    let Some(token) = session.access_token.as_deref() else {
        println!("{} Session: {}", "✗".red().bold(), "Not logged in".red());
        println!("  {} Run `portal login` to get started", "→".cyan());
        return EXIT_AUTH_ERROR;
    };

    println!(
        "{} Session: {}",
        "✓".bright_green().bold(),
        "Logged in".green()
    );
    println!("  {} {}", "Token:".dimmed(), mask_token(token).dimmed());
    if let Some(user) = &session.user {
        println!("  {} {}", "User:".dimmed(), user.display_name());
    }
    match client.session().selected_business() {
        Ok(Some(business)) => {
            println!("  {} {} ({})", "Business:".dimmed(), business.name, business.id)
        }
        Ok(None) => println!("  {} {}", "Business:".dimmed(), "none selected".dimmed()),
        Err(e) => println!("  {} {}", "Business:".dimmed(), e.to_string().red()),
    }

    if healthy {
        EXIT_SUCCESS
    } else {
        EXIT_SERVICE_UNAVAILABLE
    }
}

/// Execute the whoami command
///
/// Fetches the profile from the server, which also refreshes the cached
/// copy.
pub async fn execute_whoami(json: bool) -> Result<i32> {
    let client = build_client()?;
    run_whoami(&client, json).await
}

pub(crate) async fn run_whoami(client: &ApiClient, json: bool) -> Result<i32> {
    if !client.session().is_authenticated() {
        crate::errors::display_auth_error("Not logged in");
        return Ok(EXIT_AUTH_ERROR);
    }

    let profile = match client.fetch_profile().await {
        Ok(profile) => profile,
        Err(e) => return Ok(report(&e)),
    };

    if json {
        print_json(&profile)?;
        return Ok(EXIT_SUCCESS);
    }

    println!("{}", profile.display_name().bold());
    if let Some(email) = &profile.email {
        println!("  {} {}", "Email:".dimmed(), email);
    }
    if let Some(id) = &profile.id {
        println!("  {} {}", "ID:".dimmed(), id);
    }
    Ok(EXIT_SUCCESS)
}

/// Mask a bearer token for display
///
/// Shows the first 6 characters and masks the rest.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }

    let visible: String = chars[..6].iter().collect();
    format!("{}...{}", visible, "*".repeat((chars.len() - 6).min(8)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{MockServer, reply};
    use crate::config::BaseUrlSource;
    use crate::session::SessionContext;
    use axum::http::StatusCode;

    fn resolved(url: String) -> ResolvedBaseUrl {
        ResolvedBaseUrl {
            url,
            source: BaseUrlSource::External,
        }
    }

    #[test]
    fn test_mask_token_short() {
        assert_eq!(mask_token("abc123"), "******");
    }

    #[test]
    fn test_mask_token_long() {
        let masked = mask_token("eyJhbGciOiJIUzI1NiJ9.payload");
        assert!(masked.starts_with("eyJhbG"));
        assert!(masked.ends_with("********"));
        assert!(!masked.contains("payload"));
    }

    #[tokio::test]
    async fn test_status_logged_out() {
        let server = MockServer::start(reply(StatusCode::OK, "{}")).await;
        let client = ApiClient::new(server.url(), SessionContext::in_memory());

        assert_eq!(run(&client, &resolved(server.url())).await, EXIT_AUTH_ERROR);
    }

    #[tokio::test]
    async fn test_status_logged_in() {
        let server = MockServer::start(reply(StatusCode::OK, "{}")).await;
        let session = SessionContext::in_memory();
        session.establish("abc123", None).unwrap();
        let client = ApiClient::new(server.url(), session);

        assert_eq!(run(&client, &resolved(server.url())).await, EXIT_SUCCESS);
        assert_eq!(server.requests()[0].path, "/health");
    }

    #[tokio::test]
    async fn test_status_unreachable() {
        let client = ApiClient::new("http://127.0.0.1:1", SessionContext::in_memory());

        assert_eq!(
            run(&client, &resolved("http://127.0.0.1:1".to_string())).await,
            EXIT_NETWORK_ERROR
        );
    }

    #[tokio::test]
    async fn test_whoami_requires_session() {
        let client = ApiClient::new("http://127.0.0.1:1", SessionContext::in_memory());

        assert_eq!(run_whoami(&client, false).await.unwrap(), EXIT_AUTH_ERROR);
    }

    #[tokio::test]
    async fn test_whoami_expired_session() {
        let server = MockServer::start(reply(StatusCode::UNAUTHORIZED, "")).await;
        let session = SessionContext::in_memory();
        session.establish("abc123", None).unwrap();
        let client = ApiClient::new(server.url(), session.clone());

        assert_eq!(run_whoami(&client, true).await.unwrap(), EXIT_AUTH_ERROR);
        assert!(!session.is_authenticated());
    }
}
