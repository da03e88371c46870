//! Replays the offline queue through the live API client.
//!
//! A pass walks a snapshot of the queue in enqueue order and attempts
//! each action exactly once; failures are recorded against the action and
//! retried on the *next* pass. Passes are serialized by a real mutex —
//! overlapping triggers (a connectivity event landing while a manual
//! replay runs) coalesce into one pass instead of double-processing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use ajo_common::net::ConnectivityMonitor;
use ajo_common::sync::{FailureOutcome, OfflineQueue};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::ApiClient;

/// Outcome of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub replayed: usize,
    pub retained: usize,
    pub dropped: usize,
}

/// Drives queue replay on connectivity restore and enqueue wakeups.
pub struct QueueProcessor {
    client: Arc<ApiClient>,
    queue: Arc<OfflineQueue>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    pass_lock: Arc<Mutex<()>>,
    shutdown: Arc<AtomicBool>,
    handle: StdMutex<Option<JoinHandle<()>>>,
}

impl QueueProcessor {
    /// Create a processor. Call [`start`](Self::start) to react to
    /// connectivity events; [`process_queue`](Self::process_queue) can
    /// also be invoked manually.
    pub fn new(
        client: Arc<ApiClient>,
        queue: Arc<OfflineQueue>,
        connectivity: Arc<dyn ConnectivityMonitor>,
    ) -> Self {
        Self {
            client,
            queue,
            connectivity,
            pass_lock: Arc::new(Mutex::new(())),
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: StdMutex::new(None),
        }
    }

    /// Spawn the background task replaying on offline→online transitions
    /// and on enqueue notifications while online.
    pub fn start(&self) {
        let client = self.client.clone();
        let queue = self.queue.clone();
        let connectivity = self.connectivity.clone();
        let pass_lock = self.pass_lock.clone();
        let shutdown = self.shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut rx = connectivity.subscribe();
            let notify = queue.replay_notify();

            loop {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }

                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let online = *rx.borrow_and_update();
                        if online {
                            info!("connectivity restored, replaying offline queue");
                            Self::run_pass(&client, &queue, &pass_lock).await;
                        }
                    }
                    _ = notify.notified() => {
                        if connectivity.is_online() {
                            Self::run_pass(&client, &queue, &pass_lock).await;
                        }
                    }
                }
            }
        });

        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(handle);
        }
    }

    /// Stop the background task.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Ok(mut slot) = self.handle.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    /// Run one replay pass now.
    pub async fn process_queue(&self) -> ReplaySummary {
        Self::run_pass(&self.client, &self.queue, &self.pass_lock).await
    }

    async fn run_pass(
        client: &ApiClient,
        queue: &OfflineQueue,
        pass_lock: &Mutex<()>,
    ) -> ReplaySummary {
        // A pass already in flight will pick up anything we would have;
        // skip instead of queueing a redundant pass behind it.
        let Ok(_guard) = pass_lock.try_lock() else {
            debug!("replay pass already in flight, skipping");
            return ReplaySummary::default();
        };

        let snapshot = queue.snapshot().await;
        if snapshot.is_empty() {
            return ReplaySummary::default();
        }

        info!(count = snapshot.len(), "replaying offline queue");
        let mut summary = ReplaySummary::default();

        for action in snapshot {
            match client.execute_queued(&action).await {
                Ok(()) => match queue.remove(&action.id).await {
                    Ok(()) => {
                        summary.replayed += 1;
                        debug!(action_id = %action.id, "queued action replayed");
                    }
                    Err(e) => warn!(action_id = %action.id, error = %e, "replayed action vanished"),
                },
                Err(err) => {
                    warn!(action_id = %action.id, error = %err, "queued action failed to replay");
                    match queue.record_failure(&action.id).await {
                        Ok(FailureOutcome::Retained { .. }) => summary.retained += 1,
                        Ok(FailureOutcome::Dropped) => summary.dropped += 1,
                        Err(e) => {
                            warn!(action_id = %action.id, error = %e, "failed to record replay failure");
                        }
                    }
                }
            }
        }

        info!(
            replayed = summary.replayed,
            retained = summary.retained,
            dropped = summary.dropped,
            "replay pass complete"
        );
        summary
    }
}

impl Drop for QueueProcessor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
