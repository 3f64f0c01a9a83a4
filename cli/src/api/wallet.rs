//! # Wallet API
//!
//! Balance and transaction history of the logged-in user.

use serde::{Deserialize, Serialize};

use crate::api::client::{ApiClient, ApiError, RequestConfig};
use crate::api::lenient::{amount, optional_amount};
use crate::api::pagination::{ListBody, Page, PageRequest};
use crate::session::EntityId;

/// Wallet of the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Available balance
    #[serde(default, deserialize_with = "amount")]
    pub balance: f64,
    /// ISO currency code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Funds not yet available
    #[serde(
        default,
        deserialize_with = "optional_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub pending_balance: Option<f64>,
    /// Remaining server fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Wallet {
    /// Balance with two decimals and the currency code, if known.
    pub fn formatted_balance(&self) -> String {
        format_amount(self.balance, self.currency.as_deref())
    }
}

/// A wallet movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction identifier
    pub id: EntityId,
    /// Signed amount
    #[serde(default, deserialize_with = "amount")]
    pub amount: f64,
    /// Transaction type (credit, debit, payout, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Processing status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp as sent by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Remaining server fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Format an amount with two decimals and an optional currency code.
pub fn format_amount(amount: f64, currency: Option<&str>) -> String {
    match currency {
        Some(code) if !code.is_empty() => format!("{:.2} {}", amount, code),
        _ => format!("{:.2}", amount),
    }
}

impl ApiClient {
    /// Fetch the wallet of the logged-in user.
    pub async fn wallet(&self) -> Result<Wallet, ApiError> {
        self.get("/wallet").await
    }

    /// Fetch one page of wallet transactions.
    pub async fn wallet_transactions(
        &self,
        page: PageRequest,
    ) -> Result<Page<Transaction>, ApiError> {
        let body: ListBody<Transaction> = self
            .request(page.apply(RequestConfig::get("/wallet/transactions")))
            .await?;
        Ok(body.into_page(page))
    }
}
