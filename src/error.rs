use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Library error type for wisharify operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The external program could not be started at all.
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran but exited unsuccessfully.
    #[error("{command} failed ({status}): {message}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        message: String,
    },

    /// The external program did not finish in time.
    #[error("{command} timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    /// No active Wi-Fi network was reported by NetworkManager.
    #[error("no SSID detected; not connected to a Wi-Fi network")]
    NotConnected,

    /// The pre-shared key for the network could not be retrieved.
    #[error("password not found for SSID '{0}'")]
    PasswordNotFound(String),

    /// Secret Service keyring failure.
    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// QR encoding failed, usually because the payload is too long.
    #[error("failed to encode QR code: {0}")]
    Qr(#[from] qrcode::types::QrError),

    /// Image encoding or writing failed.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Configuration could not be read or is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// YAML parse error.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Window or rendering failure.
    #[error("ui error: {0}")]
    Ui(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
