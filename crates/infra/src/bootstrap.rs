//! Client assembly.
//!
//! Wires the stores, token manager, connectivity probe, API client, and
//! replay processor into one [`AjoClient`] a host shell owns for the
//! process lifetime. Everything is plain constructor injection — there is
//! no global state to reset between tests.

use std::sync::Arc;

use ajo_common::auth::{CredentialStore, KeyringSecretStore, TokenManager};
use ajo_common::cache::CacheStore;
use ajo_common::storage::{FileStore, KeyValueStore, MemoryStore};
use ajo_common::sync::{OfflineQueue, QueueStatus};
use ajo_domain::{ApiError, ApiResult};
use tracing::info;

use crate::api::{ApiClient, AuthApi, ClientConfig, ErrorLog};
use crate::connectivity::ProbeConnectivity;
use crate::http::HttpClient;
use crate::services::{
    AuthService, BankingService, GroupsService, NotificationsService, PaymentsService,
};
use crate::sync::{QueueProcessor, ReplaySummary};

/// Keychain service name for token storage.
const KEYCHAIN_SERVICE: &str = "Ajo";

/// Credential account scope; one session per install.
const CREDENTIAL_ACCOUNT: &str = "main";

/// Store document name under the configured data directory.
const STORE_FILE: &str = "ajo-store.json";

/// The assembled client core.
pub struct AjoClient {
    pub api: Arc<ApiClient>,
    pub auth: AuthService,
    pub groups: GroupsService,
    pub payments: PaymentsService,
    pub banking: BankingService,
    pub notifications: NotificationsService,
    pub queue: Arc<OfflineQueue>,
    pub error_log: Arc<ErrorLog>,
    connectivity: Arc<ProbeConnectivity>,
    processor: QueueProcessor,
}

impl AjoClient {
    /// Assemble and start the client core.
    ///
    /// Restores any persisted session and queue, then starts the
    /// connectivity probe and replay processor.
    ///
    /// # Errors
    /// Returns `ApiError::Config` for invalid configuration and
    /// `ApiError::Storage` when durable state cannot be opened.
    pub async fn bootstrap(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let store: Arc<dyn KeyValueStore> = match &config.data_dir {
            Some(dir) => Arc::new(
                FileStore::open(dir.join(STORE_FILE))
                    .await
                    .map_err(|e| ApiError::storage(e.to_string()))?,
            ),
            None => Arc::new(MemoryStore::new()),
        };

        let http = HttpClient::builder().timeout(config.request_timeout).build()?;

        let refresher = Arc::new(AuthApi::new(http.clone(), config.base_url.clone()));
        let credentials = CredentialStore::new(
            Arc::new(KeyringSecretStore::new(KEYCHAIN_SERVICE)),
            store.clone(),
            CREDENTIAL_ACCOUNT,
        );
        let tokens = Arc::new(TokenManager::new(refresher, credentials));
        tokens.initialize().await.map_err(|e| ApiError::storage(e.to_string()))?;

        let cache = Arc::new(CacheStore::new(store.clone()).with_default_ttl(config.cache_ttl));

        let queue = Arc::new(OfflineQueue::new(store));
        queue.load().await.map_err(|e| ApiError::storage(e.to_string()))?;

        let connectivity =
            Arc::new(ProbeConnectivity::new(config.base_url.clone(), config.probe_interval));
        connectivity.start();

        let api = Arc::new(ApiClient::new(
            config,
            http,
            cache,
            queue.clone(),
            tokens.clone(),
            connectivity.clone(),
        ));

        let processor = QueueProcessor::new(api.clone(), queue.clone(), connectivity.clone());
        processor.start();

        info!("client core assembled");
        Ok(Self {
            auth: AuthService::new(api.clone(), tokens),
            groups: GroupsService::new(api.clone()),
            payments: PaymentsService::new(api.clone()),
            banking: BankingService::new(api.clone()),
            notifications: NotificationsService::new(api.clone()),
            api,
            queue,
            error_log: Arc::new(ErrorLog::new()),
            connectivity,
            processor,
        })
    }

    /// Assemble from environment configuration.
    pub async fn from_env() -> ApiResult<Self> {
        Self::bootstrap(ClientConfig::from_env()?).await
    }

    /// Record a host-supplied connectivity change.
    pub fn set_online(&self, online: bool) {
        self.connectivity.set_online(online);
    }

    /// Run a replay pass immediately.
    pub async fn replay_now(&self) -> ReplaySummary {
        self.processor.process_queue().await
    }

    /// Pending offline work.
    pub async fn queue_status(&self) -> QueueStatus {
        self.queue.status().await
    }

    /// Stop background tasks. Safe to call more than once.
    pub fn shutdown(&self) {
        self.connectivity.stop();
        self.processor.shutdown();
        info!("client core shut down");
    }
}
