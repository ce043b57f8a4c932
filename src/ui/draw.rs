//! Software rasterisation into a `0RGB` softbuffer frame.

// Text helpers take explicit geometry so callers can lay out without allocating.
#![allow(clippy::too_many_arguments)]

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::GrayImage;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn from_rgb(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self { r, g, b, a: 1.0 }
    }

    fn packed(self) -> u32 {
        pack_color((self.r, self.g, self.b))
    }
}

/// Axis-aligned rectangle in physical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }
}

pub struct Canvas {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            pixels: vec![background.packed(); (width as usize) * (height as usize)],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let x0 = rect.left.max(0.0).floor() as i32;
        let y0 = rect.top.max(0.0).floor() as i32;
        let x1 = rect.right().min(self.width as f32).ceil() as i32;
        let y1 = rect.bottom().min(self.height as f32).ceil() as i32;
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x as f32, y as f32, color, color.a);
            }
        }
    }

    pub fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        if radius <= 0.0 || radius * 2.0 >= rect.width.min(rect.height) {
            self.fill_rect(rect, color);
            return;
        }
        // Centre column plus the two side strips between the corners.
        self.fill_rect(
            Rect::new(rect.left + radius, rect.top, rect.width - 2.0 * radius, rect.height),
            color,
        );
        self.fill_rect(
            Rect::new(rect.left, rect.top + radius, radius, rect.height - 2.0 * radius),
            color,
        );
        self.fill_rect(
            Rect::new(
                rect.right() - radius,
                rect.top + radius,
                radius,
                rect.height - 2.0 * radius,
            ),
            color,
        );
        let corners = [
            (rect.left + radius, rect.top + radius, -1.0, -1.0),
            (rect.right() - radius, rect.top + radius, 1.0, -1.0),
            (rect.left + radius, rect.bottom() - radius, -1.0, 1.0),
            (rect.right() - radius, rect.bottom() - radius, 1.0, 1.0),
        ];
        for (cx, cy, sx, sy) in corners {
            self.fill_quarter_disc(cx, cy, radius, sx, sy, color);
        }
    }

    fn fill_quarter_disc(&mut self, cx: f32, cy: f32, radius: f32, sx: f32, sy: f32, color: Color) {
        let reach = radius.ceil() as i32;
        for dy in 0..=reach {
            for dx in 0..=reach {
                let (fx, fy) = (dx as f32, dy as f32);
                if (fx * fx + fy * fy).sqrt() > radius {
                    continue;
                }
                self.blend_pixel(cx + sx * fx, cy + sy * fy, color, color.a);
            }
        }
    }

    /// Scales a grayscale image into `rect` with nearest-neighbour sampling.
    pub fn draw_gray_image(&mut self, image: &GrayImage, rect: Rect) {
        let (src_w, src_h) = image.dimensions();
        if src_w == 0 || src_h == 0 || rect.width < 1.0 || rect.height < 1.0 {
            return;
        }
        let x0 = rect.left.max(0.0).floor() as u32;
        let y0 = rect.top.max(0.0).floor() as u32;
        let x1 = rect.right().min(self.width as f32).ceil() as u32;
        let y1 = rect.bottom().min(self.height as f32).ceil() as u32;
        let draw_w = x1.saturating_sub(x0).max(1);
        let draw_h = y1.saturating_sub(y0).max(1);
        for dy in 0..draw_h {
            for dx in 0..draw_w {
                let sx = ((dx as f32 / draw_w as f32) * src_w as f32) as u32;
                let sy = ((dy as f32 / draw_h as f32) * src_h as f32) as u32;
                let luma = image.get_pixel(sx.min(src_w - 1), sy.min(src_h - 1)).0[0];
                let shade = luma as f32 / 255.0;
                let color = Color {
                    r: shade,
                    g: shade,
                    b: shade,
                    a: 1.0,
                };
                self.blend_pixel((x0 + dx) as f32, (y0 + dy) as f32, color, 1.0);
            }
        }
    }

    /// Draws one line of text with its baseline at `baseline`.
    pub fn draw_text(
        &mut self,
        font: &FontArc,
        text: &str,
        scale: PxScale,
        color: Color,
        left: f32,
        baseline: f32,
    ) {
        let scaled = font.as_scaled(scale);
        let mut cursor_x = left;
        let mut previous = None;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let glyph_id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                cursor_x += scaled.kern(prev, glyph_id);
            }
            let mut glyph = scaled.scaled_glyph(ch);
            glyph.position = point(cursor_x, baseline);
            if let Some(outline) = font.outline_glyph(glyph) {
                let bounds = outline.px_bounds();
                outline.draw(|x, y, coverage| {
                    self.blend_pixel(
                        bounds.min.x + x as f32,
                        bounds.min.y + y as f32,
                        color,
                        coverage,
                    );
                });
            }
            cursor_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
    }

    /// Word-wraps `text` into `max_width` and returns the y just below the last line.
    pub fn draw_paragraph(
        &mut self,
        font: &FontArc,
        text: &str,
        scale: PxScale,
        color: Color,
        left: f32,
        top: f32,
        max_width: f32,
    ) -> f32 {
        let metrics = LineMetrics::of(font, scale);
        let mut cursor_y = top;
        for line in wrap_text(text, font, scale, max_width) {
            self.draw_text(font, &line, scale, color, left, cursor_y + metrics.ascent);
            cursor_y += metrics.height();
        }
        cursor_y
    }

    fn blend_pixel(&mut self, x: f32, y: f32, color: Color, coverage: f32) {
        if coverage <= 0.0 {
            return;
        }
        let xi = x.floor() as i64;
        let yi = y.floor() as i64;
        if xi < 0 || yi < 0 || xi >= self.width as i64 || yi >= self.height as i64 {
            return;
        }
        let idx = (yi as usize) * (self.width as usize) + xi as usize;
        let alpha = (color.a * coverage).clamp(0.0, 1.0);
        let dst = unpack_color(self.pixels[idx]);
        let out = (
            color.r * alpha + dst.0 * (1.0 - alpha),
            color.g * alpha + dst.1 * (1.0 - alpha),
            color.b * alpha + dst.2 * (1.0 - alpha),
        );
        self.pixels[idx] = pack_color(out);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

impl LineMetrics {
    pub fn of(font: &FontArc, scale: PxScale) -> Self {
        let scaled = font.as_scaled(scale);
        Self {
            ascent: scaled.ascent(),
            descent: scaled.descent().abs(),
            line_gap: scaled.line_gap(),
        }
    }

    pub fn height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }
}

pub fn measure_text(text: &str, font: &FontArc, scale: PxScale) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut previous = None;
    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        let glyph_id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
    width.max(0.0)
}

/// Greedy word wrap. Explicit newlines always break.
pub fn wrap_text(text: &str, font: &FontArc, scale: PxScale, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if current.is_empty() || measure_text(&candidate, font, scale) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

fn unpack_color(value: u32) -> (f32, f32, f32) {
    let r = ((value >> 16) & 0xFF) as f32 / 255.0;
    let g = ((value >> 8) & 0xFF) as f32 / 255.0;
    let b = (value & 0xFF) as f32 / 255.0;
    (r, g, b)
}

fn pack_color(color: (f32, f32, f32)) -> u32 {
    let r = (color.0.clamp(0.0, 1.0) * 255.0).round() as u32;
    let g = (color.1.clamp(0.0, 1.0) * 255.0).round() as u32;
    let b = (color.2.clamp(0.0, 1.0) * 255.0).round() as u32;
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    const WHITE: Color = Color::from_rgb(0xffffff);
    const BLACK: Color = Color::from_rgb(0x000000);

    #[test]
    fn colors_pack_as_xrgb() {
        assert_eq!(Color::from_rgb(0x123456).packed(), 0xFF12_3456);
        assert_eq!(unpack_color(0xFFFF_0000), (1.0, 0.0, 0.0));
    }

    #[test]
    fn fill_rect_is_clipped_to_canvas() {
        let mut canvas = Canvas::new(4, 4, WHITE);
        canvas.fill_rect(Rect::new(2.0, 2.0, 10.0, 10.0), BLACK);
        assert_eq!(canvas.pixel(1, 1), Some(WHITE.packed()));
        assert_eq!(canvas.pixel(3, 3), Some(BLACK.packed()));
        assert_eq!(canvas.pixel(4, 4), None);
    }

    #[test]
    fn rounded_rect_leaves_corners_open() {
        let mut canvas = Canvas::new(40, 40, WHITE);
        canvas.fill_rounded_rect(Rect::new(0.0, 0.0, 40.0, 40.0), 12.0, BLACK);
        assert_eq!(canvas.pixel(0, 0), Some(WHITE.packed()));
        assert_eq!(canvas.pixel(20, 20), Some(BLACK.packed()));
        assert_eq!(canvas.pixel(20, 0), Some(BLACK.packed()));
    }

    #[test]
    fn gray_image_is_upscaled_without_smoothing() {
        let mut image = GrayImage::from_pixel(2, 2, Luma([255]));
        image.put_pixel(0, 0, Luma([0]));
        let mut canvas = Canvas::new(10, 10, WHITE);
        canvas.draw_gray_image(&image, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(canvas.pixel(4, 4), Some(BLACK.packed()));
        assert_eq!(canvas.pixel(5, 5), Some(WHITE.packed()));
        assert_eq!(canvas.pixel(9, 0), Some(WHITE.packed()));
    }

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(rect.contains(10.0, 10.0));
        assert!(rect.contains(14.9, 14.9));
        assert!(!rect.contains(15.0, 12.0));
    }
}
