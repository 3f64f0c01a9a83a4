//! # Portal API
//!
//! - `client` - [`ApiClient`], bearer injection and session expiry
//! - `normalize` - [`NormalizedError`], the user-facing error shape
//! - `pagination` - list envelopes and page requests
//! - `auth`, `wallet`, `jobs`, `business` - typed endpoints on [`ApiClient`]

pub mod auth;
pub mod business;
pub mod client;
pub mod jobs;
mod lenient;
pub mod normalize;
pub mod pagination;
pub mod wallet;

#[cfg(test)]
pub(crate) mod test_server;

pub use auth::{
    IDENTIFIER_IN_USE_MESSAGE, INVALID_CREDENTIALS_MESSAGE, LoginRequest, RegisterRequest,
    TokenResponse, login_error, register_error,
};
pub use business::Business;
pub use client::{ApiClient, ApiError, AuthExpired, AuthExpiryObserver, RequestConfig};
pub use jobs::{Job, JobQuery, JobSummary};
pub use normalize::{
    ErrorKind, GENERIC_ERROR_MESSAGE, MESSAGE_SEPARATOR, NormalizedError, normalize,
    server_message,
};
pub use pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest};
pub use wallet::{Transaction, Wallet, format_amount};
