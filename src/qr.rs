use std::fmt;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use tracing::debug;

use crate::config::QrConfig;
use crate::credentials::WifiCredentials;
use crate::error::{Error, Result};

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);
/// Upper bound on the unscaled image edge, border included.
const MAX_NATURAL_SIDE: u32 = 8192;

/// Text understood by phone cameras as "join this Wi-Fi network".
#[derive(Clone, PartialEq, Eq)]
pub struct WifiPayload {
    ssid: String,
    password: String,
}

impl WifiPayload {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }
}

impl From<&WifiCredentials> for WifiPayload {
    fn from(credentials: &WifiCredentials) -> Self {
        Self::new(credentials.ssid.clone(), credentials.password.clone())
    }
}

impl fmt::Display for WifiPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WIFI:T:WPA;S:{};P:{};;",
            escape(&self.ssid),
            escape(&self.password)
        )
    }
}

impl fmt::Debug for WifiPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiPayload")
            .field("ssid", &self.ssid)
            .finish_non_exhaustive()
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | ';' | ',' | ':' | '"') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Encodes `payload` and draws it as a square grayscale image.
pub fn render(payload: &WifiPayload, style: &QrConfig) -> Result<GrayImage> {
    let code = QrCode::new(payload.to_string().as_bytes())?;
    let modules = code.width() as u32;
    let box_size = style.box_size.max(1);
    let side = style
        .border
        .checked_mul(2)
        .and_then(|quiet| quiet.checked_add(modules))
        .and_then(|side_modules| side_modules.checked_mul(box_size))
        .filter(|side| *side <= MAX_NATURAL_SIDE)
        .ok_or_else(|| {
            Error::Config(format!(
                "QR code of {modules} modules with border {} at box size {box_size} exceeds {MAX_NATURAL_SIDE} px",
                style.border
            ))
        })?;
    if !(1..=MAX_NATURAL_SIDE).contains(&style.image_size) {
        return Err(Error::Config(format!(
            "QR image size {} must be between 1 and {MAX_NATURAL_SIDE} px",
            style.image_size
        )));
    }

    let mut image = GrayImage::from_pixel(side, side, LIGHT);
    for y in 0..modules {
        for x in 0..modules {
            if code[(x as usize, y as usize)] != Color::Dark {
                continue;
            }
            let left = (x + style.border) * box_size;
            let top = (y + style.border) * box_size;
            for py in top..top + box_size {
                for px in left..left + box_size {
                    image.put_pixel(px, py, DARK);
                }
            }
        }
    }
    debug!(
        version_modules = modules,
        natural_px = side,
        target_px = style.image_size,
        "rendered QR code"
    );

    if side == style.image_size {
        return Ok(image);
    }
    Ok(imageops::resize(
        &image,
        style.image_size,
        style.image_size,
        FilterType::Nearest,
    ))
}

pub fn save_png(image: &GrayImage, path: &Path) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
