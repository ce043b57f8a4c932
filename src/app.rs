use std::path::PathBuf;

use clap::Subcommand;
use tracing::{error, info, warn};

use crate::command::SystemRunner;
use crate::config::Config;
use crate::credentials::{self, WifiCredentials};
use crate::error::{Error, Result};
use crate::nm;
use crate::qr::{self, WifiPayload};
use crate::secrets::{CredentialStore, KeyringStore, MemoryStore};
use crate::ui::{ErrorDialog, QrWindow};

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the QR code for the current network in a window (default).
    Show,
    /// Print the Wi-Fi QR payload to stdout.
    Payload,
    /// Write the QR code to a PNG file instead of opening a window.
    Png {
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Remove the cached password for the current network from the keyring.
    Forget,
}

/// Keyring backend picked at startup.
#[derive(Debug)]
pub enum Store {
    Keyring(KeyringStore),
    Memory(MemoryStore),
}

impl Store {
    pub fn new(use_keyring: bool) -> Self {
        if use_keyring {
            Self::Keyring(KeyringStore)
        } else {
            Self::Memory(MemoryStore::new())
        }
    }
}

impl CredentialStore for Store {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        match self {
            Self::Keyring(store) => store.get(service, account).await,
            Self::Memory(store) => store.get(service, account).await,
        }
    }

    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
        match self {
            Self::Keyring(store) => store.set(service, account, secret).await,
            Self::Memory(store) => store.set(service, account, secret).await,
        }
    }

    async fn delete(&self, service: &str, account: &str) -> Result<bool> {
        match self {
            Self::Keyring(store) => store.delete(service, account).await,
            Self::Memory(store) => store.delete(service, account).await,
        }
    }
}

pub fn run(command: Command, config: &Config, store: &Store) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let runner = SystemRunner::new(config.command_timeout());

    match command {
        Command::Show => {
            let shown = runtime
                .block_on(credentials::resolve(&runner, store, config))
                .and_then(|creds| prepare_window(&creds, config));
            match shown {
                Ok(window) => window.show(),
                Err(err) => {
                    surface_error(&err, config);
                    Err(err)
                }
            }
        }
        Command::Payload => {
            let creds = runtime.block_on(credentials::resolve(&runner, store, config))?;
            println!("{}", WifiPayload::from(&creds));
            Ok(())
        }
        Command::Png { output } => {
            let creds = runtime.block_on(credentials::resolve(&runner, store, config))?;
            let image = qr::render(&WifiPayload::from(&creds), &config.qr)?;
            qr::save_png(&image, &output)?;
            info!(ssid = %creds.ssid, path = %output.display(), "wrote QR code");
            Ok(())
        }
        Command::Forget => runtime.block_on(async {
            let ssid = nm::current_ssid(&runner, config)
                .await
                .ok_or(Error::NotConnected)?;
            if credentials::forget(store, config, &ssid).await? {
                println!("Forgot cached password for '{ssid}'.");
            } else {
                println!("No cached password for '{ssid}'.");
            }
            Ok::<(), Error>(())
        }),
    }
}

fn prepare_window(creds: &WifiCredentials, config: &Config) -> Result<QrWindow> {
    let image = qr::render(&WifiPayload::from(creds), &config.qr)?;
    QrWindow::new(&creds.ssid, image, config)
}

/// Title and body of the dialog shown for `err`.
pub fn dialog_text(err: &Error) -> (&'static str, String) {
    match err {
        Error::NotConnected => (
            "Error",
            "No SSID detected. Connect to a Wi-Fi network.".to_string(),
        ),
        Error::PasswordNotFound(ssid) => ("Error", format!("Password not found for SSID '{ssid}'.")),
        other => (
            "Critical Error",
            format!("An unexpected error occurred:\n{other}"),
        ),
    }
}

fn surface_error(err: &Error, config: &Config) {
    match err {
        Error::NotConnected => {
            error!("No SSID detected. Are you connected to a Wi-Fi network?")
        }
        Error::PasswordNotFound(ssid) => error!(%ssid, "password not found"),
        other => error!(error = %other, "unexpected error"),
    }
    let (title, message) = dialog_text(err);
    let shown = ErrorDialog::new(title, &message, &config.window.font_family)
        .and_then(ErrorDialog::show);
    if let Err(ui_err) = shown {
        warn!(error = %ui_err, "could not display error dialog");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_text_for_known_failures() {
        assert_eq!(
            dialog_text(&Error::NotConnected),
            (
                "Error",
                "No SSID detected. Connect to a Wi-Fi network.".to_string()
            )
        );
        assert_eq!(
            dialog_text(&Error::PasswordNotFound("HomeNet".into())),
            ("Error", "Password not found for SSID 'HomeNet'.".to_string())
        );
    }

    #[test]
    fn dialog_text_for_unexpected_failures() {
        let (title, message) = dialog_text(&Error::Config("bad".into()));
        assert_eq!(title, "Critical Error");
        assert!(message.starts_with("An unexpected error occurred:\n"));
        assert!(message.contains("bad"));
    }

    #[tokio::test]
    async fn memory_store_variant_delegates() {
        let store = Store::new(false);
        store.set("svc", "net", "pw").await.unwrap();
        assert_eq!(store.get("svc", "net").await.unwrap().as_deref(), Some("pw"));
        assert!(store.delete("svc", "net").await.unwrap());
    }
}
