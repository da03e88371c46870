use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// HTTP verb of a queued mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// A mutating request awaiting replay.
///
/// `retries` is the only field mutated after creation; everything else is
/// frozen at enqueue time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedAction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    pub queued_at_ms: u64,
    pub retries: u32,
}

impl QueuedAction {
    /// Create a new action with a generated id, stamped with the current
    /// wall-clock time.
    pub fn new(kind: ActionKind, endpoint: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        let now_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64;

        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            endpoint: endpoint.into(),
            body,
            queued_at_ms: now_ms,
            retries: 0,
        }
    }

    /// Whether the action is still under the retry ceiling.
    #[must_use]
    pub fn can_retry(&self, max_retries: u32) -> bool {
        self.retries < max_retries
    }
}

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Recorded failures after which an action is dropped.
    pub max_retries: u32,
    /// Key-value store key holding the persisted array.
    pub storage_key: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_retries: 3, storage_key: "@offline_queue".to_string() }
    }
}

/// Point-in-time view of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub count: usize,
    pub oldest_queued_at_ms: Option<u64>,
}

/// Outcome of recording a replay failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Action stays queued for the next replay pass.
    Retained { retries: u32 },
    /// Retry ceiling reached; the action was removed.
    Dropped,
}

/// Events emitted by the queue for host consumption.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// An action exhausted its retries and was removed without replaying.
    Dropped(QueuedAction),
}
