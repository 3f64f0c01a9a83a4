//! # Session Context
//!
//! The client-held view of "who is currently logged in".
//!
//! A [`SessionContext`] wraps a [`SessionStore`] and owns three keys:
//!
//! | Key                | Contents                                   |
//! |--------------------|--------------------------------------------|
//! | `accessToken`      | Bearer token sent with every request       |
//! | `user`             | Cached [`Profile`] JSON                    |
//! | `selectedBusiness` | Cached [`BusinessContext`] JSON            |
//!
//! The profile and business selection only make sense alongside the token
//! they were fetched with, so [`SessionContext::clear`] and
//! [`SessionContext::establish`] always rewrite all three together.

use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::store::{FileStore, MemoryStore, SessionStore, StoreError};

/// Store key for the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Store key for the cached user profile.
pub const USER_KEY: &str = "user";

/// Store key for the currently selected business.
pub const SELECTED_BUSINESS_KEY: &str = "selectedBusiness";

/// Identifier as returned by the server, which uses both numeric and string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Numeric identifier
    Number(i64),
    /// String identifier (UUIDs, slugs)
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        value
            .parse::<i64>()
            .map(EntityId::Number)
            .unwrap_or_else(|_| EntityId::Text(value.to_string()))
    }
}

/// User profile as returned by the server.
///
/// Only the identifying fields are typed; everything else is retained
/// verbatim so the cache round-trips whatever the server sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// User identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Login email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Remaining server fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Profile {
    /// Best label for the user: name, then email, then id.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        if let Some(email) = &self.email {
            return email.clone();
        }
        self.id
            .as_ref()
            .map(|id| format!("user #{}", id))
            .unwrap_or_else(|| "unknown user".to_string())
    }
}

/// The business the current user is acting on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessContext {
    /// Business identifier
    pub id: EntityId,
    /// Business display name
    pub name: String,
}

/// Snapshot of the persisted session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    /// Current bearer token
    pub access_token: Option<String>,
    /// Cached profile of the logged-in user
    pub user: Option<Profile>,
}

/// Handle on the persisted session, shared by the API client and its callers.
///
/// Cloning is cheap; all clones see the same store.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Wrap an existing store.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Session kept in memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Session persisted at the default location on disk.
    pub fn persistent() -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(FileStore::default_location()?)))
    }

    /// Current bearer token. Blank values count as absent.
    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get(ACCESS_TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty()))
    }

    /// Whether a token is currently stored.
    ///
    /// A store that cannot be read counts as logged out.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.access_token(), Ok(Some(_)))
    }

    /// Cached user profile.
    pub fn profile(&self) -> Result<Option<Profile>, StoreError> {
        self.read_json(USER_KEY)
    }

    /// Currently selected business.
    pub fn selected_business(&self) -> Result<Option<BusinessContext>, StoreError> {
        self.read_json(SELECTED_BUSINESS_KEY)
    }

    /// Token and profile together.
    pub fn snapshot(&self) -> Result<Session, StoreError> {
        Ok(Session {
            access_token: self.access_token()?,
            user: self.profile()?,
        })
    }

    /// Start a new session after login.
    ///
    /// Any business selection left over from a previous session is dropped.
    pub fn establish(&self, access_token: &str, user: Option<&Profile>) -> Result<(), StoreError> {
        let user_json = user.map(to_json).transpose()?;
        self.store.apply(&[
            (ACCESS_TOKEN_KEY, Some(access_token)),
            (USER_KEY, user_json.as_deref()),
            (SELECTED_BUSINESS_KEY, None),
        ])
    }

    /// Swap the token after a refresh, keeping the cached profile and selection.
    pub fn replace_token(&self, access_token: &str) -> Result<(), StoreError> {
        self.store.set(ACCESS_TOKEN_KEY, access_token)
    }

    /// Replace the cached profile.
    pub fn update_profile(&self, user: &Profile) -> Result<(), StoreError> {
        self.store.set(USER_KEY, &to_json(user)?)
    }

    /// Remember which business the user is acting for.
    pub fn select_business(&self, business: &BusinessContext) -> Result<(), StoreError> {
        self.store.set(SELECTED_BUSINESS_KEY, &to_json(business)?)
    }

    /// Forget the business selection without ending the session.
    pub fn clear_business(&self) -> Result<(), StoreError> {
        self.store.remove(SELECTED_BUSINESS_KEY)
    }

    /// End the session: token, profile and business selection go in one write.
    ///
    /// Clearing an already-empty session is a no-op.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.apply(&[
            (ACCESS_TOKEN_KEY, None),
            (USER_KEY, None),
            (SELECTED_BUSINESS_KEY, None),
        ])
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // A stale cache entry is treated as missing rather than fatal
                debug!("Ignoring unreadable session entry '{}': {}", key, e);
                Ok(None)
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Unavailable {
        message: format!("Failed to serialize session entry: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        serde_json::from_value(serde_json::json!({
            "id": 42,
            "email": "ada@example.com",
            "name": "Ada",
            "role": "owner"
        }))
        .unwrap()
    }

    fn business() -> BusinessContext {
        BusinessContext {
            id: EntityId::Number(7),
            name: "Acme Bakery".to_string(),
        }
    }

    #[test]
    fn test_entity_id_from_str() {
        assert_eq!(EntityId::from("12"), EntityId::Number(12));
        assert_eq!(
            EntityId::from("biz_12"),
            EntityId::Text("biz_12".to_string())
        );
    }

    #[test]
    fn test_entity_id_deserializes_both_shapes() {
        let numeric: EntityId = serde_json::from_str("5").unwrap();
        let text: EntityId = serde_json::from_str("\"a-b\"").unwrap();
        assert_eq!(numeric.to_string(), "5");
        assert_eq!(text.to_string(), "a-b");
    }

    #[test]
    fn test_profile_keeps_unknown_fields() {
        let user = profile();
        assert_eq!(user.extra.get("role"), Some(&serde_json::json!("owner")));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "owner");
        assert_eq!(json["id"], 42);
    }

    #[test]
    fn test_profile_display_name_fallbacks() {
        let mut user = profile();
        assert_eq!(user.display_name(), "Ada");
        user.name = Some("  ".to_string());
        assert_eq!(user.display_name(), "ada@example.com");
        user.email = None;
        assert_eq!(user.display_name(), "user #42");
    }

    #[test]
    fn test_establish_stores_token_and_profile() {
        let session = SessionContext::in_memory();
        session.establish("abc123", Some(&profile())).unwrap();

        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.access_token.as_deref(), Some("abc123"));
        assert_eq!(snapshot.user, Some(profile()));
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_establish_drops_previous_business_selection() {
        let session = SessionContext::in_memory();
        session.establish("first", None).unwrap();
        session.select_business(&business()).unwrap();

        session.establish("second", None).unwrap();

        assert_eq!(session.selected_business().unwrap(), None);
    }

    #[test]
    fn test_replace_token_keeps_profile_and_business() {
        let session = SessionContext::in_memory();
        session.establish("old", Some(&profile())).unwrap();
        session.select_business(&business()).unwrap();

        session.replace_token("new").unwrap();

        assert_eq!(session.access_token().unwrap().as_deref(), Some("new"));
        assert_eq!(session.profile().unwrap(), Some(profile()));
        assert_eq!(session.selected_business().unwrap(), Some(business()));
    }

    #[test]
    fn test_clear_removes_everything() {
        let session = SessionContext::in_memory();
        session.establish("abc123", Some(&profile())).unwrap();
        session.select_business(&business()).unwrap();

        session.clear().unwrap();

        assert_eq!(session.snapshot().unwrap(), Session::default());
        assert_eq!(session.selected_business().unwrap(), None);
    }

    #[test]
    fn test_clear_twice_is_idempotent() {
        let session = SessionContext::in_memory();
        session.establish("abc123", None).unwrap();

        session.clear().unwrap();
        let once = session.snapshot().unwrap();
        session.clear().unwrap();
        let twice = session.snapshot().unwrap();

        assert_eq!(once, twice);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_blank_token_counts_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "   ").unwrap();
        let session = SessionContext::new(store);
        assert_eq!(session.access_token().unwrap(), None);
    }

    #[test]
    fn test_unreadable_profile_is_treated_as_missing() {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_KEY, "{broken").unwrap();
        let session = SessionContext::new(store);
        assert_eq!(session.profile().unwrap(), None);
    }

    #[test]
    fn test_clear_business_keeps_session() {
        let session = SessionContext::in_memory();
        session.establish("abc123", None).unwrap();
        session.select_business(&business()).unwrap();

        session.clear_business().unwrap();

        assert_eq!(session.selected_business().unwrap(), None);
        assert!(session.is_authenticated());
    }
}
