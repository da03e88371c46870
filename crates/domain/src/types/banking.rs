//! Banking DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A linked bank account. The backend only ever returns a masked account
/// number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: String,
    pub bank_name: String,
    pub account_number_masked: String,
    pub account_name: String,
    pub is_default: bool,
    pub linked_at: DateTime<Utc>,
}

/// Payload for `POST /banking/accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkAccountRequest {
    pub bank_code: String,
    pub account_number: String,
}
