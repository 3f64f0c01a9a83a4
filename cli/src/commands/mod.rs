//! # CLI Command Implementations
//!
//! This module contains the implementation of all CLI commands.
//! Each submodule represents a top-level command or command group.
//!
//! ## Available Commands
//!
//! - [`login`] - Log in, register and log out
//! - [`status`] - Connection and session status, current user
//! - [`wallet`] - Wallet balance and transactions
//! - [`jobs`] - Job listings and counts
//! - [`business`] - Business listing and selection
//! - [`config`] - Manage the API base URL
//! - [`request`] - Raw authenticated request

pub mod business;
pub mod config;
pub mod jobs;
pub mod login;
pub mod request;
pub mod status;
pub mod wallet;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::api::{ApiClient, ApiError, AuthExpired, NormalizedError, normalize};
use crate::config::Config;
use crate::errors::{display_api_error, display_session_expired};
use crate::exit_codes::exit_code_for;
use crate::session::SessionContext;

/// Build the client every command uses: stored configuration, the
/// persisted session, and a notice on stderr when the server ends the
/// session.
pub fn build_client() -> Result<ApiClient> {
    let config = Config::load_or_default()?;
    let session = SessionContext::persistent().context("Failed to open the session store")?;
    Ok(ApiClient::from_config(&config, session).on_auth_expired(notify_expired))
}

fn notify_expired(event: &AuthExpired) {
    // A 401 without a token is a failed login, not an expiry.
    if event.had_token {
        display_session_expired();
    }
}

/// Show an API failure and return the matching exit code.
pub fn report(err: &ApiError) -> i32 {
    report_normalized(&normalize(err))
}

/// Show an already normalized failure and return the matching exit code.
pub fn report_normalized(err: &NormalizedError) -> i32 {
    display_api_error(err);
    exit_code_for(err.kind)
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
