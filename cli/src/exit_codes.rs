//! # Exit Codes
//!
//! Standard exit codes for the Portal CLI.
//!
//! These codes follow common Unix conventions so scripts can tell a
//! rejected session from an unreachable server without parsing output.

use crate::api::ErrorKind;

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// General error (unspecified)
pub const EXIT_ERROR: i32 = 1;

/// Configuration error (missing or invalid config)
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Authentication error (not logged in, or the session expired)
pub const EXIT_AUTH_ERROR: i32 = 3;

/// Network error (connection failed, timeout, etc.)
pub const EXIT_NETWORK_ERROR: i32 = 4;

/// Invalid input (bad arguments, rejected request, etc.)
pub const EXIT_INVALID_INPUT: i32 = 6;

/// Service unavailable (server error, maintenance, etc.)
pub const EXIT_SERVICE_UNAVAILABLE: i32 = 7;

/// Session error (local session storage unreadable or unwritable)
pub const EXIT_SESSION_ERROR: i32 = 8;

/// Exit code for a failure of the given kind.
pub fn exit_code_for(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Transport => EXIT_NETWORK_ERROR,
        ErrorKind::Authentication => EXIT_AUTH_ERROR,
        ErrorKind::Client => EXIT_INVALID_INPUT,
        ErrorKind::Server => EXIT_SERVICE_UNAVAILABLE,
        ErrorKind::Decode => EXIT_ERROR,
        ErrorKind::Session => EXIT_SESSION_ERROR,
    }
}
