use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, Notify, RwLock};
use tracing::{debug, info, warn};

use super::types::{
    ActionKind, FailureOutcome, QueueConfig, QueueEvent, QueueStatus, QueuedAction,
};
use crate::error::{ErrorClassification, ErrorSeverity};
use crate::storage::{KeyValueStore, StorageError};

/// Queue operation errors.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Queued action not found: {0}")]
    ActionNotFound(String),
}

impl ErrorClassification for QueueError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_retryable(),
            Self::ActionNotFound(_) => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Storage(e) => e.severity(),
            Self::ActionNotFound(_) => ErrorSeverity::Info,
        }
    }
}

/// Queue operation result type.
pub type QueueResult<T> = Result<T, QueueError>;

/// Durable FIFO of pending mutations.
///
/// Every mutation of the in-memory list is persisted before the call
/// returns, so the queue survives process restarts. Ordering is strictly
/// enqueue order; there is no dependency tracking between actions that
/// touch the same resource.
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
    config: QueueConfig,
    items: RwLock<Vec<QueuedAction>>,
    notify: Arc<Notify>,
    events: broadcast::Sender<QueueEvent>,
}

impl OfflineQueue {
    /// Create a queue with the default configuration.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, QueueConfig::default())
    }

    /// Create a queue with a custom configuration.
    pub fn with_config(store: Arc<dyn KeyValueStore>, config: QueueConfig) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { store, config, items: RwLock::new(Vec::new()), notify: Arc::new(Notify::new()), events }
    }

    /// Load the persisted queue.
    ///
    /// Should be called once on startup, before any enqueue. A corrupt
    /// persisted payload starts the queue empty rather than failing.
    pub async fn load(&self) -> QueueResult<usize> {
        let Some(json) = self.store.get(&self.config.storage_key).await? else {
            debug!("no persisted offline queue found");
            return Ok(0);
        };

        let actions: Vec<QueuedAction> = match serde_json::from_str(&json) {
            Ok(actions) => actions,
            Err(e) => {
                warn!(error = %e, "corrupt offline queue payload, starting empty");
                Vec::new()
            }
        };

        let count = actions.len();
        *self.items.write().await = actions;
        if count > 0 {
            info!(count, "restored persisted offline queue");
        }
        Ok(count)
    }

    /// Append an action and persist. Returns the generated action id.
    ///
    /// Wakes the replay processor so an opportunistic pass can run
    /// immediately if the device happens to be online.
    pub async fn enqueue(
        &self,
        kind: ActionKind,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> QueueResult<String> {
        let action = QueuedAction::new(kind, endpoint, body);
        let id = action.id.clone();

        let mut items = self.items.write().await;
        items.push(action);
        self.persist(&items).await?;
        drop(items);

        info!(action_id = %id, verb = %kind, endpoint = %endpoint, "mutation queued for replay");
        self.notify.notify_one();
        Ok(id)
    }

    /// Enqueue-order copy of the queue, for one replay pass.
    pub async fn snapshot(&self) -> Vec<QueuedAction> {
        self.items.read().await.clone()
    }

    /// Remove a successfully replayed action and persist.
    pub async fn remove(&self, action_id: &str) -> QueueResult<()> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|a| a.id != action_id);

        if items.len() == before {
            return Err(QueueError::ActionNotFound(action_id.to_string()));
        }

        self.persist(&items).await?;
        debug!(action_id = %action_id, "queued action replayed and removed");
        Ok(())
    }

    /// Record a failed replay attempt.
    ///
    /// Increments the action's retry counter and keeps it queued for the
    /// *next* pass. Once the counter reaches the ceiling the action is
    /// removed and a [`QueueEvent::Dropped`] is broadcast — the original
    /// caller already received its `Queued` response and gets no further
    /// callback.
    pub async fn record_failure(&self, action_id: &str) -> QueueResult<FailureOutcome> {
        let mut items = self.items.write().await;

        let Some(index) = items.iter().position(|a| a.id == action_id) else {
            return Err(QueueError::ActionNotFound(action_id.to_string()));
        };

        items[index].retries += 1;
        let retries = items[index].retries;

        let outcome = if retries >= self.config.max_retries {
            let dropped = items.remove(index);
            warn!(
                action_id = %dropped.id,
                endpoint = %dropped.endpoint,
                retries,
                "queued action dropped after exhausting retries"
            );
            let _ = self.events.send(QueueEvent::Dropped(dropped));
            FailureOutcome::Dropped
        } else {
            debug!(action_id = %action_id, retries, "queued action retained for next pass");
            FailureOutcome::Retained { retries }
        };

        self.persist(&items).await?;
        Ok(outcome)
    }

    /// Number of pending actions.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the queue is empty.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Point-in-time queue status.
    pub async fn status(&self) -> QueueStatus {
        let items = self.items.read().await;
        QueueStatus {
            count: items.len(),
            oldest_queued_at_ms: items.first().map(|a| a.queued_at_ms),
        }
    }

    /// Drop every pending action and persist the empty queue.
    pub async fn clear(&self) -> QueueResult<usize> {
        let mut items = self.items.write().await;
        let count = items.len();
        items.clear();
        self.persist(&items).await?;
        info!(count, "offline queue cleared");
        Ok(count)
    }

    /// Subscribe to queue events (drops).
    pub fn subscribe_events(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Handle the replay processor waits on for enqueue wakeups.
    pub fn replay_notify(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    async fn persist(&self, items: &[QueuedAction]) -> QueueResult<()> {
        let json = serde_json::to_string(items).map_err(StorageError::from)?;
        self.store.set(&self.config.storage_key, &json).await?;
        Ok(())
    }
}
