use ab_glyph::{FontArc, PxScale};
use image::GrayImage;

use super::draw::{Canvas, LineMetrics, Rect, measure_text};
use super::{Scene, TEXT, draw_button, load_font, points_to_px, run_scene};
use crate::config::Config;
use crate::error::Result;

const PADDING: f32 = 10.0;
const LABEL_GAP: f32 = 10.0;
const QR_GAP: f32 = 20.0;
const BUTTON_SIZE: (f32, f32) = (88.0, 30.0);
const BOTTOM_MARGIN: f32 = 10.0;
/// Line height estimate used before a font is available.
const LINE_FACTOR: f32 = 1.4;

/// Inner window size for the QR window, in logical pixels.
///
/// The width keeps six quiet-zone borders of air on each side of the image.
pub fn qr_window_size(config: &Config) -> (f64, f64) {
    let image = config.qr.image_size as f32;
    let width = image + (config.qr.border * 12) as f32;
    let label = points_to_px(config.window.font_size, 1.0) * LINE_FACTOR;
    let height = 2.0 * PADDING
        + label
        + LABEL_GAP
        + image
        + QR_GAP
        + BUTTON_SIZE.1
        + BOTTOM_MARGIN;
    (width as f64, height as f64)
}

/// Where each element of the QR window goes, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct QrLayout {
    label_top: f32,
    qr: Rect,
    button: Rect,
}

impl QrLayout {
    fn compute(width: u32, height: u32, scale: f32, image_size: u32, label_height: f32) -> Self {
        let width = width as f32;
        let height = height as f32;
        let label_top = 2.0 * PADDING * scale;

        let button_w = BUTTON_SIZE.0 * scale;
        let button_h = BUTTON_SIZE.1 * scale;
        let qr_top = label_top + label_height + LABEL_GAP * scale;
        let room_w = width - 2.0 * PADDING * scale;
        let room_h = height - qr_top - (QR_GAP + BOTTOM_MARGIN) * scale - button_h;
        let side = (image_size as f32 * scale).min(room_w).min(room_h).max(1.0);
        let qr = Rect::new((width - side) * 0.5, qr_top, side, side);

        let button = Rect::new(
            (width - button_w) * 0.5,
            qr.bottom() + QR_GAP * scale,
            button_w,
            button_h,
        );
        Self {
            label_top,
            qr,
            button,
        }
    }
}

/// The window showing `Connect to: <ssid>`, the QR code and an Exit button.
pub struct QrWindow {
    title: String,
    label: String,
    image: GrayImage,
    font: FontArc,
    font_size: f32,
    image_size: u32,
    size: (f64, f64),
}

impl QrWindow {
    pub fn new(ssid: &str, image: GrayImage, config: &Config) -> Result<Self> {
        let font = load_font(&config.window.font_family)?;
        Ok(Self {
            title: config.window.title.clone(),
            label: format!("Connect to: {ssid}"),
            image,
            font,
            font_size: config.window.font_size,
            image_size: config.qr.image_size,
            size: qr_window_size(config),
        })
    }

    /// Blocks until the user dismisses the window.
    pub fn show(self) -> Result<()> {
        run_scene(self)
    }
}

impl Scene for QrWindow {
    fn title(&self) -> &str {
        &self.title
    }

    fn logical_size(&self) -> (f64, f64) {
        self.size
    }

    fn paint(&self, canvas: &mut Canvas, scale: f32, hovered: bool) -> Rect {
        let px = PxScale::from(points_to_px(self.font_size, scale));
        let metrics = LineMetrics::of(&self.font, px);
        let layout = QrLayout::compute(
            canvas.width(),
            canvas.height(),
            scale,
            self.image_size,
            metrics.height(),
        );

        let text_width = measure_text(&self.label, &self.font, px);
        let left = ((canvas.width() as f32 - text_width) * 0.5).max(PADDING * scale);
        canvas.draw_text(
            &self.font,
            &self.label,
            px,
            TEXT,
            left,
            layout.label_top + metrics.ascent,
        );

        canvas.draw_gray_image(&self.image, layout.qr);
        draw_button(canvas, &self.font, "Exit", layout.button, scale, hovered);
        layout.button
    }
}
