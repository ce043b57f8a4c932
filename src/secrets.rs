use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::error::{Error, Result};

/// Secret storage addressed by a service name and an account.
#[allow(async_fn_in_trait)]
pub trait CredentialStore {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>>;
    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<()>;
    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, service: &str, account: &str) -> Result<bool>;
}

/// The desktop Secret Service keyring (GNOME Keyring, KWallet, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    async fn with_entry<T, F>(service: &str, account: &str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(keyring::Entry) -> keyring::Result<T> + Send + 'static,
    {
        let service = service.to_string();
        let account = account.to_string();
        // Secret Service talks blocking D-Bus.
        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &account)?;
            op(entry)
        })
        .await
        .map_err(|err| Error::Io(std::io::Error::other(err)))?
        .map_err(Error::from)
    }
}

impl CredentialStore for KeyringStore {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        let found = Self::with_entry(service, account, |entry| match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err),
        })
        .await?;
        debug!(service, account, hit = found.is_some(), "keyring lookup");
        Ok(found.filter(|secret| !secret.is_empty()))
    }

    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        let secret = secret.to_string();
        Self::with_entry(service, account, move |entry| entry.set_password(&secret)).await?;
        debug!(service, account, "stored secret in keyring");
        Ok(())
    }

    async fn delete(&self, service: &str, account: &str) -> Result<bool> {
        Self::with_entry(service, account, |entry| match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err),
        })
        .await
    }
}

/// Process-local store, used with `--no-keyring` and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, service: &str, account: &str, secret: &str) -> Self {
        self.lock()
            .insert((service.to_string(), account.to_string()), secret.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), String>> {
        // A poisoned map still holds valid strings.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryStore {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        Ok(self
            .lock()
            .get(&(service.to_string(), account.to_string()))
            .filter(|secret| !secret.is_empty())
            .cloned())
    }

    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        self.lock()
            .insert((service.to_string(), account.to_string()), secret.to_string());
        Ok(())
    }

    async fn delete(&self, service: &str, account: &str) -> Result<bool> {
        Ok(self
            .lock()
            .remove(&(service.to_string(), account.to_string()))
            .is_some())
    }
}
