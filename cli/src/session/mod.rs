//! # Session Management
//!
//! Persisted session state shared by every request the client makes:
//!
//! - `store` - string key/value storage (on disk or in memory)
//! - `context` - typed session operations on top of a store
//!
//! ## Usage
//!
//! ```rust
//! use portal::session::{BusinessContext, EntityId, SessionContext};
//!
//! let session = SessionContext::in_memory();
//! session.establish("abc123", None).unwrap();
//! session
//!     .select_business(&BusinessContext {
//!         id: EntityId::Number(7),
//!         name: "Acme".to_string(),
//!     })
//!     .unwrap();
//!
//! // Logging out drops the token and everything scoped to it
//! session.clear().unwrap();
//! assert!(session.selected_business().unwrap().is_none());
//! ```

pub mod context;
pub mod store;

pub use context::{
    ACCESS_TOKEN_KEY, BusinessContext, EntityId, Profile, SELECTED_BUSINESS_KEY, Session,
    SessionContext, USER_KEY,
};
pub use store::{FileStore, MemoryStore, SessionStore, StoreError};
