//! Connectivity seam.
//!
//! The API client consults connectivity before every call and the replay
//! processor reacts to offline→online transitions. Hosts feed whatever
//! reachability signal their platform provides into a monitor; tests use
//! [`ManualConnectivity`] and flip it explicitly.

use tokio::sync::watch;

/// Point-in-time and event-based connectivity information.
pub trait ConnectivityMonitor: Send + Sync {
    /// Whether the device currently appears to be online.
    fn is_online(&self) -> bool;

    /// Subscribe to connectivity changes. The receiver yields the new
    /// online state on every transition.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Host- or test-driven connectivity monitor over a watch channel.
#[derive(Debug)]
pub struct ManualConnectivity {
    tx: watch::Sender<bool>,
}

impl ManualConnectivity {
    /// Create a monitor with the given initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx }
    }

    /// Record a connectivity change. Subscribers are only woken when the
    /// state actually flips.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|state| {
            let changed = *state != online;
            *state = online;
            changed
        });
    }
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityMonitor for ManualConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
