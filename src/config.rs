use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

const MAX_BOX_SIZE: u32 = 32;
const MAX_BORDER: u32 = 20;
const MAX_IMAGE_SIZE: u32 = 4096;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_sec: u64,
    /// Prefix used to run the password read with elevated privileges.
    #[serde(default = "default_elevate_command")]
    pub elevate_command: Vec<String>,
    #[serde(default)]
    pub nmcli: NmcliConfig,
    #[serde(default)]
    pub qr: QrConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NmcliConfig {
    #[serde(default = "default_nmcli_program")]
    pub program: String,
    #[serde(default = "default_wifi_fields")]
    pub wifi_fields: String,
    #[serde(default = "default_connection_fields")]
    pub connection_fields: String,
    #[serde(default = "default_password_field")]
    pub password_field: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct QrConfig {
    /// Pixels per QR module before scaling.
    #[serde(default = "default_box_size")]
    pub box_size: u32,
    /// Quiet zone width in modules.
    #[serde(default = "default_border")]
    pub border: u32,
    /// Final edge length of the square QR image in pixels.
    #[serde(default = "default_image_size")]
    pub image_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WindowConfig {
    #[serde(default = "default_window_title")]
    pub title: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|err| {
            Error::Config(format!("failed to read config at {}: {err}", path.display()))
        })?;
        let cfg: Config = serde_yaml::from_slice(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads the per-user config file, falling back to defaults when it does not exist.
    pub fn load_default() -> Result<Self> {
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        match fs::read(&path) {
            Ok(data) => {
                let cfg: Config = serde_yaml::from_slice(&data)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(Error::Config(format!(
                "failed to read config at {}: {err}",
                path.display()
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_BOX_SIZE).contains(&self.qr.box_size) {
            return Err(Error::Config(format!(
                "qr.box-size must be between 1 and {MAX_BOX_SIZE}"
            )));
        }
        if self.qr.border > MAX_BORDER {
            return Err(Error::Config(format!(
                "qr.border must be at most {MAX_BORDER} modules"
            )));
        }
        if !(1..=MAX_IMAGE_SIZE).contains(&self.qr.image_size) {
            return Err(Error::Config(format!(
                "qr.image-size must be between 1 and {MAX_IMAGE_SIZE}"
            )));
        }
        if self.command_timeout_sec == 0 {
            return Err(Error::Config(
                "command-timeout-sec must be greater than zero".into(),
            ));
        }
        if self.nmcli.program.trim().is_empty() {
            return Err(Error::Config("nmcli.program must not be empty".into()));
        }
        if self.window.font_size.is_nan() || self.window.font_size <= 0.0 {
            return Err(Error::Config("window.font-size must be positive".into()));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_sec)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wisharify").join("config.yaml"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keyring_service: default_keyring_service(),
            command_timeout_sec: default_command_timeout(),
            elevate_command: default_elevate_command(),
            nmcli: NmcliConfig::default(),
            qr: QrConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for NmcliConfig {
    fn default() -> Self {
        Self {
            program: default_nmcli_program(),
            wifi_fields: default_wifi_fields(),
            connection_fields: default_connection_fields(),
            password_field: default_password_field(),
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            box_size: default_box_size(),
            border: default_border(),
            image_size: default_image_size(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_window_title(),
            font_family: default_font_family(),
            font_size: default_font_size(),
        }
    }
}

fn default_keyring_service() -> String {
    "nmcli-wifi".to_string()
}

fn default_command_timeout() -> u64 {
    // Long enough for someone to answer the polkit prompt.
    60
}

fn default_elevate_command() -> Vec<String> {
    vec!["pkexec".to_string()]
}

fn default_nmcli_program() -> String {
    "nmcli".to_string()
}

fn default_wifi_fields() -> String {
    "active,ssid".to_string()
}

fn default_connection_fields() -> String {
    "active,type,uuid".to_string()
}

fn default_password_field() -> String {
    "802-11-wireless-security.psk".to_string()
}

fn default_box_size() -> u32 {
    10
}

fn default_border() -> u32 {
    5
}

fn default_image_size() -> u32 {
    450
}

fn default_window_title() -> String {
    "Wisharify QR Code".to_string()
}

fn default_font_family() -> String {
    "Helvetica".to_string()
}

fn default_font_size() -> f32 {
    16.0
}
