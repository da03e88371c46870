//! Bank account operations.

use std::sync::Arc;

use ajo_domain::{ApiResult, BankAccount, LinkAccountRequest};

use crate::api::ApiClient;

/// Linked bank accounts.
pub struct BankingService {
    client: Arc<ApiClient>,
}

impl BankingService {
    /// Create the service.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Accounts linked to the user.
    pub async fn accounts(&self) -> ApiResult<Vec<BankAccount>> {
        self.client.get("/banking/accounts").await
    }

    /// Link a new account. Queued for replay when offline.
    pub async fn link(&self, request: &LinkAccountRequest) -> ApiResult<BankAccount> {
        self.client.post("/banking/accounts", request).await
    }

    /// Unlink an account. Queued for replay when offline.
    pub async fn unlink(&self, account_id: &str) -> ApiResult<serde_json::Value> {
        self.client.delete(&format!("/banking/accounts/{account_id}")).await
    }
}
