//! Backend connectivity probe.
//!
//! Wraps a [`ManualConnectivity`] watch channel with a background task
//! that probes `{base_url}/health` on an interval. The probe uses its own
//! short-timeout transport: a reachability check that hangs for the full
//! request timeout is worse than no check. Hosts with a platform
//! reachability signal can skip `start` and drive [`set_online`]
//! (`ProbeConnectivity::set_online`) directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ajo_common::net::{ConnectivityMonitor, ManualConnectivity};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Probe timeout. Deliberately much shorter than the request timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Connectivity monitor fed by an HTTP health probe.
pub struct ProbeConnectivity {
    inner: Arc<ManualConnectivity>,
    base_url: String,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProbeConnectivity {
    /// Create a probe for the given backend. Starts optimistic (online)
    /// until the first probe says otherwise.
    pub fn new(base_url: impl Into<String>, interval: Duration) -> Self {
        Self {
            inner: Arc::new(ManualConnectivity::new(true)),
            base_url: base_url.into(),
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Start the background probe loop.
    pub fn start(&self) {
        let inner = self.inner.clone();
        let shutdown = self.shutdown.clone();
        let url = format!("{}/health", self.base_url);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
                Ok(client) => client,
                Err(e) => {
                    warn!(error = %e, "failed to build probe client, probing disabled");
                    return;
                }
            };

            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;

                if shutdown.load(Ordering::Relaxed) {
                    break;
                }

                // Any HTTP response at all means the backend is reachable
                let online = client.get(&url).send().await.is_ok();
                debug!(online, "connectivity probe completed");
                inner.set_online(online);
            }
        });

        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(handle);
        }
    }

    /// Stop the background probe loop.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Ok(mut slot) = self.handle.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    /// Record a host-supplied connectivity change (overrides the probe
    /// until its next tick).
    pub fn set_online(&self, online: bool) {
        self.inner.set_online(online);
    }
}

impl ConnectivityMonitor for ProbeConnectivity {
    fn is_online(&self) -> bool {
        self.inner.is_online()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.subscribe()
    }
}

impl Drop for ProbeConnectivity {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_override_without_probe() {
        let probe = ProbeConnectivity::new("http://127.0.0.1:1", Duration::from_secs(60));
        assert!(probe.is_online());

        probe.set_online(false);
        assert!(!probe.is_online());
    }

    #[tokio::test]
    async fn test_probe_marks_unreachable_backend_offline() {
        // Nothing listens on port 1; the first probe must flip us offline
        let probe = ProbeConnectivity::new("http://127.0.0.1:1", Duration::from_millis(50));
        let mut rx = probe.subscribe();
        probe.start();

        tokio::time::timeout(Duration::from_secs(10), async {
            while *rx.borrow() {
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("probe never reported offline");

        assert!(!probe.is_online());
        probe.stop();
    }
}
