//! # Error Normalization
//!
//! Turns every [`ApiError`] into a [`NormalizedError`]: a stable
//! `{ kind, message, http_status }` shape that callers can show to users
//! without inspecting transport details.
//!
//! ## Server error bodies
//!
//! The backend reports failures as JSON with an optional `message` that is
//! either a string or an array of strings (one per validation failure):
//!
//! ```json
//! {"statusCode": 400, "message": ["email must be an email", "password is too short"]}
//! ```
//!
//! Arrays are joined with [`MESSAGE_SEPARATOR`]. Other fields such as
//! `statusCode` are ignored; the HTTP status of the response is
//! authoritative.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::client::ApiError;

/// Message shown when no server-provided message is available.
pub const GENERIC_ERROR_MESSAGE: &str =
    "Something went wrong. Please check your connection and try again.";

/// Separator used when the server returns several messages.
pub const MESSAGE_SEPARATOR: &str = ", ";

/// Broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No response reached the client (offline, DNS, timeout)
    Transport,
    /// HTTP 401; the session has been cleared
    Authentication,
    /// Any other 4xx, or a request that could not be built
    Client,
    /// HTTP 5xx
    Server,
    /// A successful response whose body could not be decoded
    Decode,
    /// The local session store could not be read or written
    Session,
}

/// A failure in the shape user-facing code consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct NormalizedError {
    /// Failure category
    pub kind: ErrorKind,
    /// Human-readable message, safe to display
    pub message: String,
    /// HTTP status when a response was received
    pub http_status: Option<u16>,
}

impl NormalizedError {
    /// Replace the message when the failure carried the given HTTP status.
    ///
    /// Used by call sites that know what a status means for their endpoint,
    /// e.g. 409 on registration.
    ///
    /// ```rust
    /// use portal::api::{ApiError, NormalizedError};
    ///
    /// let err = ApiError::ClientError { status: 409, message: None };
    /// let normalized = NormalizedError::from(&err)
    ///     .with_status_message(409, "That email is already registered");
    /// assert_eq!(normalized.message, "That email is already registered");
    /// ```
    pub fn with_status_message(mut self, status: u16, message: &str) -> Self {
        if self.http_status == Some(status) {
            self.message = message.to_string();
        }
        self
    }

    /// Whether the failure ended the session.
    pub fn is_session_expired(&self) -> bool {
        self.kind == ErrorKind::Authentication
    }
}

impl From<&ApiError> for NormalizedError {
    fn from(err: &ApiError) -> Self {
        normalize(err)
    }
}

impl From<ApiError> for NormalizedError {
    fn from(err: ApiError) -> Self {
        normalize(&err)
    }
}

/// Normalize an [`ApiError`].
///
/// Server-provided messages are surfaced verbatim; everything else falls
/// back to [`GENERIC_ERROR_MESSAGE`].
pub fn normalize(err: &ApiError) -> NormalizedError {
    let kind = err.kind();
    let message = match err {
        ApiError::Unauthorized { message }
        | ApiError::Forbidden { message }
        | ApiError::ValidationError { message, .. }
        | ApiError::ClientError { message, .. }
        | ApiError::Server { message, .. } => message.clone(),
        ApiError::InvalidRequest { message } => Some(format!("Invalid request: {}", message)),
        ApiError::Session(e) => Some(format!("Could not access the local session: {}", e)),
        ApiError::Network { .. } | ApiError::Timeout { .. } | ApiError::ParseError { .. } => {
            None
        }
    };

    NormalizedError {
        kind,
        message: message.unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
        http_status: err.status(),
    }
}

/// A `message` field holding one or several messages.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageField {
    Single(String),
    Many(Vec<serde_json::Value>),
}

/// Structured error body returned by the backend.
#[derive(Debug, Default, Deserialize)]
pub struct ServerErrorBody {
    #[serde(default)]
    message: Option<MessageField>,
}

impl ServerErrorBody {
    /// Parse a response body. Non-JSON bodies yield `None`.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// The message to show, with arrays joined into one string.
    pub fn message(&self) -> Option<String> {
        let message = match self.message.as_ref()? {
            MessageField::Single(text) => text.trim().to_string(),
            MessageField::Many(items) => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(text) => text.trim().to_string(),
                    other => other.to_string(),
                })
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(MESSAGE_SEPARATOR),
        };

        if message.is_empty() {
            None
        } else {
            Some(message)
        }
    }
}

/// Extract the user-facing message from a raw error body, if any.
pub fn server_message(body: &str) -> Option<String> {
    ServerErrorBody::parse(body)?.message()
}
