//! Notification DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad category a notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Payment,
    Group,
    System,
}

/// An in-app notification, as returned by `GET /notifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
