//! Share the Wi-Fi network this machine is connected to as a QR code.
//!
//! The SSID comes from NetworkManager, the password from the desktop keyring
//! or, on a cache miss, from NetworkManager's stored profile.

pub mod app;
pub mod command;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod nm;
pub mod qr;
pub mod secrets;
pub mod ui;

pub use error::{Error, Result};
