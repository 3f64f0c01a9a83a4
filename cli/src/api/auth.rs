//! # Authentication API
//!
//! This module contains the endpoints that create, refresh and end the
//! session, plus the endpoint-specific error messages callers show for them.
//!
//! The generic client only knows that a 401 ends the session. What a status
//! means for a given endpoint (401 on login is a wrong password, 409 on
//! registration is a taken email) is decided here.

use log::info;
use serde::{Deserialize, Serialize};

use crate::api::client::{ApiClient, ApiError, RequestConfig};
use crate::api::normalize::{NormalizedError, normalize};
use crate::session::{Profile, Session, StoreError};

/// Message for a rejected login.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Message for a registration with an email that is already taken.
pub const IDENTIFIER_IN_USE_MESSAGE: &str = "An account with this email already exists";

/// Request body for logging in
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Request body for creating an account
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
    /// Optional phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Response from login and token refresh
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// New bearer token
    #[serde(rename = "accessToken", alias = "access_token", alias = "token")]
    pub access_token: String,
    /// Profile of the authenticated user, when the server includes it
    #[serde(default)]
    pub user: Option<Profile>,
}

/// A profile, either bare or wrapped as `{"user": {...}}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileBody {
    Wrapped { user: Profile },
    Plain(Profile),
}

impl ProfileBody {
    fn into_profile(self) -> Profile {
        match self {
            ProfileBody::Wrapped { user } => user,
            ProfileBody::Plain(user) => user,
        }
    }
}

impl ApiClient {
    /// Log in and start a new session.
    ///
    /// On success the token and profile are stored and any business
    /// selection from an earlier session is dropped.
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - The newly stored session
    /// * `Err(ApiError)` - Request failed; see [`login_error`] for the message to show
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Session, ApiError> {
        let tokens: TokenResponse = self.post("/auth/login", credentials).await?;
        self.session()
            .establish(&tokens.access_token, tokens.user.as_ref())?;

        let session = self.session().snapshot()?;
        info!(
            "Logged in as {}",
            session
                .user
                .as_ref()
                .map(Profile::display_name)
                .unwrap_or_else(|| credentials.email.clone())
        );
        Ok(session)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Profile, ApiError> {
        let body: ProfileBody = self.post("/auth/register", request).await?;
        Ok(body.into_profile())
    }

    /// Exchange the current token for a fresh one.
    ///
    /// The cached profile and business selection are kept unless the server
    /// sends a new profile along with the token.
    pub async fn refresh_token(&self) -> Result<String, ApiError> {
        let tokens: TokenResponse = self
            .request(RequestConfig::post("/auth/refresh").body(serde_json::json!({})))
            .await?;

        self.session().replace_token(&tokens.access_token)?;
        if let Some(user) = &tokens.user {
            self.session().update_profile(user)?;
        }
        Ok(tokens.access_token)
    }

    /// Fetch the current user's profile and refresh the cached copy.
    pub async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        let body: ProfileBody = self.get("/auth/profile").await?;
        let profile = body.into_profile();
        self.session().update_profile(&profile)?;
        Ok(profile)
    }

    /// End the session locally.
    ///
    /// Safe to call when already logged out.
    pub fn logout(&self) -> Result<(), StoreError> {
        let was_authenticated = self.session().is_authenticated();
        self.session().clear()?;
        if was_authenticated {
            info!("Logged out");
        }
        Ok(())
    }
}

/// Message to show for a failed login.
pub fn login_error(err: &ApiError) -> NormalizedError {
    normalize(err).with_status_message(401, INVALID_CREDENTIALS_MESSAGE)
}

/// Message to show for a failed registration.
pub fn register_error(err: &ApiError) -> NormalizedError {
    normalize(err).with_status_message(409, IDENTIFIER_IN_USE_MESSAGE)
}
