//! Session and token management.
//!
//! # Module Layering
//!
//! - [`SecretStore`] is the generic platform secret seam (keychain,
//!   credential manager, secret service), with [`KeyringSecretStore`] as
//!   the default implementation.
//! - [`CredentialStore`] layers the session shape on top: tokens go to
//!   the secret store, the non-secret `user_id` flag goes to the plain
//!   key-value store.
//! - [`TokenManager`] owns the in-memory [`AuthSession`] and the
//!   single-flight refresh: concurrent 401s coalesce on one call to the
//!   injected [`TokenRefresher`], and an unrecoverable refresh is a hard
//!   logout.
//!
//! Nothing here issues HTTP requests; `ajo-infra` provides the
//! [`TokenRefresher`] implementation.

mod credentials;
mod keyring;
mod token_manager;
mod traits;
mod types;

pub use credentials::{CredentialError, CredentialStore};
pub use keyring::KeyringSecretStore;
pub use token_manager::{TokenManager, TokenManagerError};
pub use traits::{RefreshError, SecretStore, SecretStoreError, TokenRefresher};
pub use types::{AuthSession, SessionTokens};
