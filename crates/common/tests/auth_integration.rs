//! Integration tests for session management.
//!
//! Runs the single-flight refresh under the multi-threaded runtime, where
//! callers genuinely race, and checks the persisted mirror end-to-end.

use std::sync::Arc;

use ajo_common::auth::{CredentialStore, SessionTokens, TokenManager};
use ajo_common::storage::MemoryStore;
use ajo_common::testing::{CountingRefresher, MockSecretStore};

fn manager(refresher: Arc<CountingRefresher>) -> TokenManager {
    let credentials = CredentialStore::new(
        Arc::new(MockSecretStore::new()),
        Arc::new(MemoryStore::new()),
        "main",
    );
    TokenManager::new(refresher, credentials)
}

/// Racing refreshes from several OS threads still collapse into one
/// network call, and every racer sees the same token.
#[tokio::test(flavor = "multi_thread")]
async fn test_single_flight_under_parallelism() {
    let refresher = Arc::new(CountingRefresher::new().with_delay_ms(80));
    let manager = Arc::new(manager(refresher.clone()));
    manager
        .install_session(SessionTokens::new("stale", "ref-0"), None)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move { manager.refresh().await.unwrap() }));
    }

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }

    assert_eq!(refresher.calls(), 1, "expected one refresh call, got {}", refresher.calls());
    assert!(tokens.iter().all(|t| t == "access-1"));
    assert_eq!(manager.access_token().await.as_deref(), Some("access-1"));
}

/// A refresh that completes before a later call arrives does not absorb
/// that call: the later 401 triggers its own refresh.
#[tokio::test]
async fn test_sequential_refreshes_are_not_coalesced() {
    let refresher = Arc::new(CountingRefresher::new());
    let manager = manager(refresher.clone());
    manager
        .install_session(SessionTokens::new("stale", "ref-0"), None)
        .await
        .unwrap();

    assert_eq!(manager.refresh().await.unwrap(), "access-1");
    assert_eq!(manager.refresh().await.unwrap(), "access-2");
    assert_eq!(refresher.calls(), 2);
}
