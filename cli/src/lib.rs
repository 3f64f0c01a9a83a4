//! # Portal Client Library
//!
//! Authenticated access to the Portal marketplace API, plus the command
//! implementations of the `portal` CLI built on top of it.
//!
//! ## Modules
//!
//! - [`api`] - HTTP client, error normalization and typed endpoints
//! - [`commands`] - CLI command implementations
//! - [`config`] - Base URL resolution and persisted configuration
//! - [`errors`] - Error display
//! - [`exit_codes`] - Standard exit codes
//! - [`session`] - Persisted session state (token, profile, business)

pub mod api;
pub mod commands;
pub mod config;
pub mod errors;
pub mod exit_codes;
pub mod session;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, NormalizedError};
pub use config::Config;
pub use session::SessionContext;
