//! OS keychain credential store
//!
//! Implements [`CredentialStore`] over the platform keychain (macOS
//! Keychain, Windows Credential Manager, Linux Secret Service) via the
//! `keyring` crate.
//!
//! The port contract is infallible: every keychain failure is logged and
//! degrades to `None`/no-op, so a locked or missing keychain can never
//! break the auth lifecycle.

use std::collections::HashSet;

use async_trait::async_trait;
use hikayat_core::CredentialStore;
use hikayat_domain::constants::KEYCHAIN_SERVICE;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Credential store backed by the OS keychain.
///
/// Keychain APIs cannot enumerate entries, so the store tracks the keys it
/// has written; `clear` removes exactly those.
pub struct KeyringCredentialStore {
    service: String,
    known_keys: Mutex<HashSet<String>>,
}

impl KeyringCredentialStore {
    /// Create a store namespaced under a keychain service name.
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into(), known_keys: Mutex::new(HashSet::new()) }
    }

    /// Create a store under the product's default keychain service.
    #[must_use]
    pub fn with_default_service() -> Self {
        Self::new(KEYCHAIN_SERVICE)
    }

    /// Keychain operations block; run them off the async runtime.
    async fn run_blocking<T, F>(&self, key: &str, operation: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(keyring::Entry) -> Result<T, keyring::Error> + Send + 'static,
    {
        let service = self.service.clone();
        let key_owned = key.to_string();

        let joined = tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &key_owned)?;
            operation(entry)
        })
        .await;

        match joined {
            Ok(Ok(value)) => Some(value),
            Ok(Err(keyring::Error::NoEntry)) => None,
            Ok(Err(err)) => {
                warn!(error = %err, key, "keychain operation failed, degrading");
                None
            }
            Err(err) => {
                warn!(error = %err, key, "keychain task failed, degrading");
                None
            }
        }
    }
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn get_item(&self, key: &str) -> Option<String> {
        self.run_blocking(key, |entry| entry.get_password()).await
    }

    async fn set_item(&self, key: &str, value: &str) {
        let value = value.to_string();
        if self
            .run_blocking(key, move |entry| entry.set_password(&value))
            .await
            .is_some()
        {
            self.known_keys.lock().insert(key.to_string());
            debug!(key, "credential stored");
        }
    }

    async fn remove_item(&self, key: &str) {
        self.run_blocking(key, |entry| entry.delete_credential()).await;
        self.known_keys.lock().remove(key);
    }

    async fn clear(&self) {
        let keys: Vec<String> = self.known_keys.lock().drain().collect();
        for key in keys {
            self.run_blocking(&key, |entry| entry.delete_credential()).await;
        }
    }
}

impl std::fmt::Debug for KeyringCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringCredentialStore").field("service", &self.service).finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for storage::secure. Real keychain round trips are not
    //! exercised here; CI machines have no unlockable keychain.
    use super::*;

    /// Validates the default service name.
    #[test]
    fn default_service_is_product_namespace() {
        let store = KeyringCredentialStore::with_default_service();
        assert_eq!(store.service, "com.hikayat.ledger");
    }

    /// Validates that clearing an untouched store never reaches the OS.
    #[tokio::test]
    async fn clear_with_no_known_keys_is_a_noop() {
        let store = KeyringCredentialStore::new("com.hikayat.test");
        store.clear().await;
        assert!(store.known_keys.lock().is_empty());
    }
}
