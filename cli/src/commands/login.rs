//! # Login Command
//!
//! Starts and ends the local session.
//!
//! ## Usage
//!
//! ```bash
//! portal login --email ada@example.com        # password from PORTAL_PASSWORD
//! portal register --name Ada --email ada@example.com --password ...
//! portal logout
//! ```

use anyhow::Result;
use colored::Colorize;

use crate::api::{ApiClient, LoginRequest, RegisterRequest, login_error, register_error};
use crate::errors::{display_info, display_success, display_validation_error};
use crate::exit_codes::*;
use crate::session::Profile;

use super::{build_client, report_normalized};

/// Arguments for the login command
#[derive(Debug, Clone)]
pub struct LoginArgs {
    /// Account email
    pub email: String,
    /// Account password
    pub password: Option<String>,
}

/// Arguments for the register command
#[derive(Debug, Clone)]
pub struct RegisterArgs {
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Account password
    pub password: Option<String>,
    /// Optional phone number
    pub phone: Option<String>,
}

/// Execute the login command
///
/// # Returns
///
/// * `Ok(EXIT_SUCCESS)` - Logged in and session stored
/// * `Ok(EXIT_AUTH_ERROR)` - Wrong email or password
/// * `Ok(EXIT_NETWORK_ERROR)` - Server unreachable
/// * `Ok(EXIT_INVALID_INPUT)` - No password given
/// * `Err(_)` - Configuration or session store could not be opened
pub async fn execute(args: LoginArgs) -> Result<i32> {
    let client = build_client()?;
    Ok(run_login(&client, args).await)
}

pub(crate) async fn run_login(client: &ApiClient, args: LoginArgs) -> i32 {
    let Some(password) = args.password.filter(|p| !p.is_empty()) else {
        display_validation_error("A password is required (--password or PORTAL_PASSWORD)");
        return EXIT_INVALID_INPUT;
    };

    let credentials = LoginRequest {
        email: args.email.trim().to_string(),
        password,
    };

    match client.login(&credentials).await {
        Ok(session) => {
            let who = session
                .user
                .as_ref()
                .map(Profile::display_name)
                .unwrap_or(credentials.email);
            display_success(&format!("Logged in as {}", who.bold()));
            EXIT_SUCCESS
        }
        Err(e) => report_normalized(&login_error(&e)),
    }
}

/// Execute the register command
///
/// Creates the account only; run `portal login` afterwards.
pub async fn execute_register(args: RegisterArgs) -> Result<i32> {
    let client = build_client()?;
    Ok(run_register(&client, args).await)
}

pub(crate) async fn run_register(client: &ApiClient, args: RegisterArgs) -> i32 {
    let Some(password) = args.password.filter(|p| !p.is_empty()) else {
        display_validation_error("A password is required (--password or PORTAL_PASSWORD)");
        return EXIT_INVALID_INPUT;
    };

    let request = RegisterRequest {
        name: args.name,
        email: args.email.trim().to_string(),
        password,
        phone: args.phone,
    };

    match client.register(&request).await {
        Ok(profile) => {
            display_success(&format!("Account created for {}", profile.display_name()));
            println!("  {} Run `portal login` to sign in", "→".cyan());
            EXIT_SUCCESS
        }
        Err(e) => report_normalized(&register_error(&e)),
    }
}

/// Execute the logout command
///
/// Clears the token, cached profile and business selection. Succeeds when
/// already logged out.
pub fn execute_logout() -> Result<i32> {
    let client = build_client()?;
    Ok(run_logout(&client))
}

pub(crate) fn run_logout(client: &ApiClient) -> i32 {
    let was_authenticated = client.session().is_authenticated();
    match client.logout() {
        Ok(()) if was_authenticated => {
            display_success("Logged out");
            EXIT_SUCCESS
        }
        Ok(()) => {
            display_info("Already logged out");
            EXIT_SUCCESS
        }
        Err(e) => {
            crate::errors::display_session_error(&e.to_string());
            EXIT_SESSION_ERROR
        }
    }
}
