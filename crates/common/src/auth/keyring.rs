//! Platform keychain implementation of [`SecretStore`].
//!
//! Backed by the `keyring` crate (macOS Keychain, Windows Credential
//! Manager, Linux Secret Service). Entries are scoped by a service name
//! so multiple builds of the app do not collide.

use async_trait::async_trait;
use keyring::Entry;
use tracing::debug;

use super::traits::{SecretStore, SecretStoreError};

/// Secret store backed by the OS keychain.
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    /// Create a store scoped to the given keychain service name.
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    fn entry(&self, name: &str) -> Result<Entry, SecretStoreError> {
        Entry::new(&self.service, name).map_err(|e| SecretStoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl SecretStore for KeyringSecretStore {
    async fn set_secret(&self, name: &str, value: &str) -> Result<(), SecretStoreError> {
        debug!(service = %self.service, name = %name, "storing keychain secret");
        self.entry(name)?
            .set_password(value)
            .map_err(|e| SecretStoreError::Backend(e.to_string()))
    }

    async fn get_secret(&self, name: &str) -> Result<String, SecretStoreError> {
        match self.entry(name)?.get_password() {
            Ok(value) => Ok(value),
            Err(keyring::Error::NoEntry) => Err(SecretStoreError::NotFound),
            Err(e) => Err(SecretStoreError::Backend(e.to_string())),
        }
    }

    async fn delete_secret(&self, name: &str) -> Result<(), SecretStoreError> {
        match self.entry(name)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretStoreError::Backend(e.to_string())),
        }
    }

    async fn secret_exists(&self, name: &str) -> bool {
        matches!(self.entry(name).map(|e| e.get_password()), Ok(Ok(_)))
    }
}
