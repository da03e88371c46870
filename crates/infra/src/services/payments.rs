//! Payment operations.

use std::sync::Arc;

use ajo_domain::{ApiResult, Payment, PaymentRequest};

use crate::api::ApiClient;

/// Payment creation and history.
pub struct PaymentsService {
    client: Arc<ApiClient>,
}

impl PaymentsService {
    /// Create the service.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Initiate a payment. Queued for replay when offline.
    pub async fn create(&self, request: &PaymentRequest) -> ApiResult<Payment> {
        self.client.post("/payments", request).await
    }

    /// Payment history, newest first.
    pub async fn history(&self) -> ApiResult<Vec<Payment>> {
        self.client.get("/payments/history").await
    }
}
