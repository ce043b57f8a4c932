//! Resolves the SSID and pre-shared key of the current Wi-Fi network.

use tracing::{error, info, warn};

use crate::command::CommandRunner;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::nm;
use crate::secrets::CredentialStore;

#[derive(Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl std::fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where a resolved password came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource {
    Keyring,
    NetworkManager,
}

/// Finds the active SSID and its password, caching freshly read passwords.
///
/// Runs strictly in order: SSID lookup, keyring lookup, and only on a keyring
/// miss the connection UUID lookup and the privileged secret read.
pub async fn resolve<R, S>(runner: &R, store: &S, config: &Config) -> Result<WifiCredentials>
where
    R: CommandRunner,
    S: CredentialStore,
{
    resolve_with_source(runner, store, config)
        .await
        .map(|(credentials, _)| credentials)
}

pub async fn resolve_with_source<R, S>(
    runner: &R,
    store: &S,
    config: &Config,
) -> Result<(WifiCredentials, PasswordSource)>
where
    R: CommandRunner,
    S: CredentialStore,
{
    let ssid = nm::current_ssid(runner, config)
        .await
        .ok_or(Error::NotConnected)?;

    if let Some(password) = store.get(&config.keyring_service, &ssid).await? {
        info!(%ssid, "using password cached in keyring");
        return Ok((WifiCredentials { ssid, password }, PasswordSource::Keyring));
    }

    let password = match fetch_from_network_manager(runner, config, &ssid).await {
        Ok(Some(password)) => password,
        Ok(None) => return Err(Error::PasswordNotFound(ssid)),
        Err(err) => {
            error!(%ssid, error = %err, "failed to retrieve password");
            return Err(Error::PasswordNotFound(ssid));
        }
    };
    info!(%ssid, "password retrieved");

    store
        .set(&config.keyring_service, &ssid, &password)
        .await?;

    Ok((
        WifiCredentials { ssid, password },
        PasswordSource::NetworkManager,
    ))
}

async fn fetch_from_network_manager<R: CommandRunner>(
    runner: &R,
    config: &Config,
    ssid: &str,
) -> Result<Option<String>> {
    let Some(uuid) = nm::active_connection_uuid(runner, config).await? else {
        warn!(%ssid, "no active connection profile");
        return Ok(None);
    };
    nm::read_psk(runner, config, &uuid).await
}

/// Drops the cached password for `ssid`. Returns whether an entry existed.
pub async fn forget<S: CredentialStore>(store: &S, config: &Config, ssid: &str) -> Result<bool> {
    let removed = store.delete(&config.keyring_service, ssid).await?;
    info!(%ssid, removed, "cleared cached password");
    Ok(removed)
}
