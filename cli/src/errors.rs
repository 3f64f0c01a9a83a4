//! # Error Handling
//!
//! User-facing error display for the Portal CLI. Every command funnels API
//! failures through [`display_api_error`], which picks the hint to show
//! from the failure kind.

use colored::Colorize;

use crate::api::{ErrorKind, NormalizedError};

/// Display a network error with helpful suggestions
///
/// # Arguments
///
/// * `message` - The error message to display
pub fn display_network_error(message: &str) {
    eprintln!("{} Network error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!("{}", "Possible causes:".yellow());
    eprintln!("  • No internet connection");
    eprintln!("  • API server is unreachable or too slow to answer");
    eprintln!("  • Wrong API URL (see `portal config show`)");
    eprintln!();
    eprintln!(
        "{} Check your connection and try again.",
        "Tip:".cyan().bold()
    );
}

/// Display an authentication error with helpful suggestions
///
/// # Arguments
///
/// * `message` - The error message to display
pub fn display_auth_error(message: &str) {
    eprintln!("{} Authentication error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!("{}", "Possible causes:".yellow());
    eprintln!("  • Your session has expired");
    eprintln!("  • You haven't logged in yet");
    eprintln!();
    eprintln!(
        "{} Run `portal login` to authenticate.",
        "Tip:".cyan().bold()
    );
}

/// Display a configuration error with helpful suggestions
pub fn display_config_error(message: &str) {
    eprintln!("{} Configuration error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!(
        "{} Run `portal config reset` to restore the defaults.",
        "Tip:".cyan().bold()
    );
}

/// Display a local session storage error
pub fn display_session_error(message: &str) {
    eprintln!("{} Session error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!(
        "{} Run `portal logout` to reset the local session.",
        "Tip:".cyan().bold()
    );
}

/// Display a service unavailable error with helpful suggestions
pub fn display_service_error(message: &str) {
    eprintln!("{} Service unavailable: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!(
        "{} The server failed to handle the request. Try again later.",
        "Tip:".cyan().bold()
    );
}

/// Display a rejected request
pub fn display_validation_error(message: &str) {
    eprintln!("{} Request rejected: {}", "✗".red().bold(), message);
}

/// Display a normalized API failure with the hint matching its kind.
pub fn display_api_error(err: &NormalizedError) {
    match err.kind {
        ErrorKind::Transport => display_network_error(&err.message),
        ErrorKind::Authentication => display_auth_error(&err.message),
        ErrorKind::Client => display_validation_error(&err.message),
        ErrorKind::Server => display_service_error(&err.message),
        ErrorKind::Session => display_session_error(&err.message),
        ErrorKind::Decode => display_error(&err.message),
    }
}

/// Notice printed when the server ends the session mid-command.
pub fn display_session_expired() {
    eprintln!(
        "{} Your session has expired. Run `portal login` to sign in again.",
        "⚠".yellow().bold()
    );
}

/// Display a generic error
///
/// # Arguments
///
/// * `message` - The error message to display
pub fn display_error(message: &str) {
    eprintln!("{} Error: {}", "✗".red().bold(), message);
}

/// Display a warning
pub fn display_warning(message: &str) {
    eprintln!("{} Warning: {}", "⚠".yellow().bold(), message);
}

/// Display a success message
pub fn display_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Display an info message
pub fn display_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
