//! Notification operations.

use std::sync::Arc;

use ajo_domain::{ApiResult, Notification};

use crate::api::ApiClient;

/// In-app notifications.
pub struct NotificationsService {
    client: Arc<ApiClient>,
}

impl NotificationsService {
    /// Create the service.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// The user's notifications, newest first.
    pub async fn notifications(&self) -> ApiResult<Vec<Notification>> {
        self.client.get("/notifications").await
    }

    /// Mark one notification as read. Queued for replay when offline.
    pub async fn mark_read(&self, notification_id: &str) -> ApiResult<Notification> {
        self.client
            .put(&format!("/notifications/{notification_id}/read"), &serde_json::json!({}))
            .await
    }
}
