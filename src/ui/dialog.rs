use ab_glyph::{FontArc, PxScale};

use super::draw::{Canvas, Color, Rect};
use super::{Scene, TEXT, draw_button, load_font, points_to_px, run_scene};
use crate::error::Result;

const SIZE: (f64, f64) = (420.0, 180.0);
const ACCENT: Color = Color::from_rgb(0xc62828);

/// Blocking error message box with an OK button.
pub struct ErrorDialog {
    title: String,
    message: String,
    font: FontArc,
}

impl ErrorDialog {
    pub fn new(title: &str, message: &str, font_family: &str) -> Result<Self> {
        Ok(Self {
            title: title.to_string(),
            message: message.to_string(),
            font: load_font(font_family)?,
        })
    }

    pub fn show(self) -> Result<()> {
        run_scene(self)
    }
}

impl Scene for ErrorDialog {
    fn title(&self) -> &str {
        &self.title
    }

    fn logical_size(&self) -> (f64, f64) {
        SIZE
    }

    fn paint(&self, canvas: &mut Canvas, scale: f32, hovered: bool) -> Rect {
        let width = canvas.width() as f32;
        let height = canvas.height() as f32;
        let margin = 18.0 * scale;

        // Red stripe on the left marks the box as an error.
        canvas.fill_rect(Rect::new(0.0, 0.0, 6.0 * scale, height), ACCENT);

        let heading = PxScale::from(points_to_px(12.0, scale));
        let body = PxScale::from(points_to_px(10.0, scale));
        let text_left = margin + 6.0 * scale;
        let text_width = width - text_left - margin;

        let below_heading = canvas.draw_paragraph(
            &self.font,
            &self.title,
            heading,
            ACCENT,
            text_left,
            margin,
            text_width,
        );
        canvas.draw_paragraph(
            &self.font,
            &self.message,
            body,
            TEXT,
            text_left,
            below_heading + 8.0 * scale,
            text_width,
        );

        let button = Rect::new(
            width - margin - 80.0 * scale,
            height - margin - 28.0 * scale,
            80.0 * scale,
            28.0 * scale,
        );
        draw_button(canvas, &self.font, "OK", button, scale, hovered);
        button
    }
}
