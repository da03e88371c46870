//! Payment DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a payment is funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    Wallet,
}

/// Settlement state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Payload for `POST /payments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub group_id: String,
    pub amount: i64,
    pub method: PaymentMethod,
}

/// A payment record, as returned by `GET /payments/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub group_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}
