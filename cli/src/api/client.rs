//! # API Client Core
//!
//! This module contains the [`ApiClient`] through which every call to the
//! backend passes, so authentication and error handling are applied in one
//! place:
//!
//! - **Outbound**: the current access token is read from the
//!   [`SessionContext`] and attached as `Authorization: Bearer <token>`.
//!   No token, or an unreadable store, sends the request unauthenticated.
//! - **Inbound**: success passes through. A 401 clears the session (token,
//!   profile and business selection) and notifies every registered
//!   [`AuthExpiryObserver`] before the error is returned. Other failures are
//!   returned untouched.
//!
//! The client never retries and never redirects; callers decide what a
//! failure means for them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::api::normalize::{ErrorKind, server_message};
use crate::config::{Config, DEFAULT_TIMEOUT_SECS};
use crate::session::{SessionContext, StoreError};

/// Error types for API operations.
///
/// HTTP variants carry the server-provided message when the response body
/// had one. Use [`NormalizedError`](crate::api::NormalizedError) to obtain a
/// message that is always safe to display.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication error (401 Unauthorized)
    ///
    /// The token is invalid or expired. The session has already been cleared.
    #[error("Authentication failed: {}", .message.as_deref().unwrap_or("session expired or invalid"))]
    Unauthorized {
        /// Server-provided message
        message: Option<String>,
    },

    /// Authorization error (403 Forbidden)
    #[error("Access denied: {}", .message.as_deref().unwrap_or("insufficient permissions"))]
    Forbidden {
        /// Server-provided message
        message: Option<String>,
    },

    /// Validation error (400 Bad Request, 422 Unprocessable Entity)
    #[error("Validation error ({status}): {}", .message.as_deref().unwrap_or("invalid request data"))]
    ValidationError {
        /// HTTP status code
        status: u16,
        /// Server-provided message
        message: Option<String>,
    },

    /// Client error (4xx status codes other than 400/401/403/422)
    #[error("Request error ({status}): {}", .message.as_deref().unwrap_or("request failed"))]
    ClientError {
        /// HTTP status code
        status: u16,
        /// Server-provided message
        message: Option<String>,
    },

    /// Server error (5xx status codes)
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("the server could not complete the request"))]
    Server {
        /// HTTP status code
        status: u16,
        /// Server-provided message
        message: Option<String>,
    },

    /// Network error (connection failed, DNS error, etc.)
    ///
    /// No response was received.
    #[error("Network error: {message}")]
    Network {
        /// Transport error detail
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed
        seconds: u64,
    },

    /// Response parsing error
    #[error("Failed to parse response: {message}")]
    ParseError {
        /// Human-readable error message
        message: String,
    },

    /// The request could not be built (bad URL, unserializable body).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Human-readable error message
        message: String,
    },

    /// The local session store failed while recording a successful call.
    #[error(transparent)]
    Session(#[from] StoreError),
}

impl ApiError {
    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::ValidationError { status, .. }
            | ApiError::ClientError { status, .. }
            | ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized { .. } => ErrorKind::Authentication,
            ApiError::Forbidden { .. }
            | ApiError::ValidationError { .. }
            | ApiError::ClientError { .. }
            | ApiError::InvalidRequest { .. } => ErrorKind::Client,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Network { .. } | ApiError::Timeout { .. } => ErrorKind::Transport,
            ApiError::ParseError { .. } => ErrorKind::Decode,
            ApiError::Session(_) => ErrorKind::Session,
        }
    }

    /// Check if this is an authentication error (401 or 403).
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized { .. } | ApiError::Forbidden { .. }
        )
    }

    /// Check if no response was received.
    pub fn is_network_error(&self) -> bool {
        matches!(self, ApiError::Network { .. } | ApiError::Timeout { .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ApiError::Server { .. })
    }
}

/// Notification sent to observers when the server rejects the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthExpired {
    /// Path of the request that was rejected
    pub path: String,
    /// Server-provided message, if any
    pub message: Option<String>,
    /// Whether a token was attached to the rejected request
    ///
    /// `false` for e.g. a failed login, where nothing actually expired.
    pub had_token: bool,
}

/// Hook invoked after the client has cleared the session on a 401.
///
/// Registered by the application shell to react to expiry (prompt for
/// login, drop in-memory state). Closures implement it directly.
pub trait AuthExpiryObserver: Send + Sync {
    /// Called once per 401 response, after the session was cleared.
    fn on_auth_expired(&self, event: &AuthExpired);
}

impl<F> AuthExpiryObserver for F
where
    F: Fn(&AuthExpired) + Send + Sync,
{
    fn on_auth_expired(&self, event: &AuthExpired) {
        self(event)
    }
}

/// One outbound call: method, path, query parameters, body and headers.
///
/// # Example
///
/// ```rust
/// use portal::api::RequestConfig;
///
/// let request = RequestConfig::get("/jobs")
///     .param("category", "design")
///     .param("page", 2);
/// assert_eq!(request.params.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL
    pub path: String,
    /// Query parameters
    pub params: Vec<(String, String)>,
    /// JSON body
    pub body: Option<serde_json::Value>,
    /// Extra headers for this call
    pub headers: HeaderMap,
}

impl RequestConfig {
    /// Create a request with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH` request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter when a value is present.
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Set a raw JSON body.
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize a value as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest {
            message: format!("Failed to serialize request body: {}", e),
        })?;
        Ok(self.body(value))
    }

    /// Add a header for this call only.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Version of the crate, used in the User-Agent header
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header carrying the per-client trace ID
const TRACE_HEADER: &str = "X-Trace-Id";

/// HTTP client for the Portal API
///
/// One instance per application. It is `Send + Sync`; share it behind an
/// `Arc` when several tasks issue calls concurrently.
///
/// # Example
///
/// ```rust
/// use portal::api::ApiClient;
/// use portal::session::SessionContext;
///
/// let client = ApiClient::new("https://api.example.com", SessionContext::in_memory())
///     .on_auth_expired(|event: &portal::api::AuthExpired| {
///         eprintln!("session ended by {}", event.path);
///     });
/// assert_eq!(client.url("/wallet"), "https://api.example.com/wallet");
/// ```
pub struct ApiClient {
    /// Base URL for the API, without a trailing slash
    pub base_url: String,
    client: Client,
    headers: HeaderMap,
    session: SessionContext,
    observers: Vec<Arc<dyn AuthExpiryObserver>>,
    timeout: Duration,
    trace_id: String,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("observers", &self.observers.len())
            .field("trace_id", &self.trace_id)
            .finish()
    }
}

impl ApiClient {
    /// Create a client with the default 30 second timeout.
    ///
    /// The client sends:
    /// - User-Agent: `portal/<version>`
    /// - Accept and Content-Type: `application/json`
    /// - X-Trace-Id: a random ID shared by every call of this client
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        Self::with_timeout(base_url, session, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        session: SessionContext,
        timeout: Duration,
    ) -> Self {
        let trace_id = generate_trace_id();

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("portal/{VERSION}"))
                .unwrap_or_else(|_| HeaderValue::from_static("portal")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            headers.insert(TRACE_HEADER, value);
        }

        // Default headers are attached per request in `send` and `health_check`
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to a default HTTP client: {}", e);
                Client::new()
            });

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            headers,
            session,
            observers: Vec::new(),
            timeout,
            trace_id,
        }
    }

    /// Create a client from configuration, resolving the base URL once.
    pub fn from_config(config: &Config, session: SessionContext) -> Self {
        let resolved = config.resolve_base_url();
        debug!("Using {} base URL {}", resolved.source, resolved.url);
        Self::with_timeout(resolved.url, session, config.timeout())
    }

    /// Register an observer for session expiry.
    pub fn on_auth_expired(mut self, observer: impl AuthExpiryObserver + 'static) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    /// The session this client reads tokens from.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Get the trace ID sent with every call of this client.
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL for a path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and return the raw successful response.
    ///
    /// # Returns
    ///
    /// * `Ok(Response)` - 2xx response, unchanged
    /// * `Err(ApiError)` - transport failure or non-2xx status
    pub async fn send(&self, request: RequestConfig) -> Result<Response, ApiError> {
        let url = self.url(&request.path);
        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .timeout(self.timeout)
            .headers(self.headers.clone())
            .headers(request.headers);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let (builder, had_token) = self.authorize(builder);
        debug!(
            "{} {} ({})",
            request.method,
            url,
            if had_token { "authenticated" } else { "anonymous" }
        );

        let response = builder
            .send()
            .await
            .map_err(|e| self.to_transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = to_http_error(status, &body);
        debug!("{} {} failed: {}", request.method, url, error);

        if status == StatusCode::UNAUTHORIZED {
            self.expire_session(&request.path, &error, had_token);
        }

        Err(error)
    }

    /// Send a request and decode the JSON response body.
    pub async fn request<T: DeserializeOwned>(&self, request: RequestConfig) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.send(request).await?;
        let text = response
            .text()
            .await
            .map_err(|e| self.to_transport_error(e))?;

        serde_json::from_str(&text).map_err(|e| ApiError::ParseError {
            message: format!("Failed to parse response from {}: {}", path, e),
        })
    }

    /// Send a request whose response body is irrelevant.
    pub async fn request_empty(&self, request: RequestConfig) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    /// `GET` a path and decode the response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(RequestConfig::get(path)).await
    }

    /// `POST` a JSON body and decode the response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(RequestConfig::post(path).json(body)?).await
    }

    /// Check API health
    ///
    /// Bypasses authentication and session handling.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - API is healthy
    /// * `Ok(false)` - API returned non-success status
    /// * `Err(ApiError)` - Request failed (network error)
    pub async fn health_check(&self) -> Result<bool, ApiError> {
        let response = self
            .client
            .get(self.url("/health"))
            .timeout(self.timeout)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| self.to_transport_error(e))?;

        Ok(response.status().is_success())
    }

    /// Attach the bearer token when one is stored.
    fn authorize(&self, builder: RequestBuilder) -> (RequestBuilder, bool) {
        match self.session.access_token() {
            Ok(Some(token)) => (builder.bearer_auth(token), true),
            Ok(None) => (builder, false),
            Err(e) => {
                debug!("Session store unreadable, sending anonymously: {}", e);
                (builder, false)
            }
        }
    }

    /// Clear the session after a 401 and notify observers.
    fn expire_session(&self, path: &str, error: &ApiError, had_token: bool) {
        if had_token {
            warn!("Session rejected by server on {}; clearing local session", path);
        }
        if let Err(e) = self.session.clear() {
            warn!("Failed to clear session after 401: {}", e);
        }

        let message = match error {
            ApiError::Unauthorized { message } => message.clone(),
            _ => None,
        };
        let event = AuthExpired {
            path: path.to_string(),
            message,
            had_token,
        };
        for observer in &self.observers {
            observer.on_auth_expired(&event);
        }
    }

    fn to_transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if err.is_builder() {
            ApiError::InvalidRequest {
                message: err.to_string(),
            }
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }
}

/// Convert an HTTP response with error status to an ApiError.
fn to_http_error(status: StatusCode, body: &str) -> ApiError {
    let message = server_message(body);
    match status.as_u16() {
        401 => ApiError::Unauthorized { message },
        403 => ApiError::Forbidden { message },
        400 | 422 => ApiError::ValidationError {
            status: status.as_u16(),
            message,
        },
        500..=599 => ApiError::Server {
            status: status.as_u16(),
            message,
        },
        code => ApiError::ClientError {
            status: code,
            message,
        },
    }
}

/// Generate a 128-bit trace ID as a 32-character hex string.
fn generate_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}
