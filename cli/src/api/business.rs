//! # Business API
//!
//! Businesses the logged-in user can act for. The list comes from the
//! server; which one is selected is session state and never leaves the
//! client.

use serde::{Deserialize, Serialize};

use crate::api::client::{ApiClient, ApiError};
use crate::api::lenient::null_as_default;
use crate::api::pagination::ListBody;
use crate::session::{BusinessContext, EntityId, StoreError};

/// A business owned or managed by the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    /// Business identifier
    pub id: EntityId,
    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// URL slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Remaining server fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl From<&Business> for BusinessContext {
    fn from(business: &Business) -> Self {
        BusinessContext {
            id: business.id.clone(),
            name: business.name.clone(),
        }
    }
}

impl ApiClient {
    /// List the current user's businesses.
    pub async fn list_businesses(&self) -> Result<Vec<Business>, ApiError> {
        let body: ListBody<Business> = self.get("/businesses").await?;
        Ok(body.into_items())
    }

    /// Fetch a single business.
    pub async fn business(&self, id: &EntityId) -> Result<Business, ApiError> {
        self.get(&format!("/businesses/{}", id)).await
    }

    /// Make `business` the current business context.
    pub fn select_business(&self, business: &Business) -> Result<BusinessContext, StoreError> {
        let context = BusinessContext::from(business);
        self.session().select_business(&context)?;
        Ok(context)
    }

    /// The current business context, if any.
    pub fn selected_business(&self) -> Result<Option<BusinessContext>, StoreError> {
        self.session().selected_business()
    }

    /// Forget the current business context.
    pub fn clear_business(&self) -> Result<(), StoreError> {
        self.session().clear_business()
    }
}
