//! Native windows drawn in software: the QR code window and the error dialog.

mod dialog;
pub mod draw;
mod font;
mod qr_window;

use std::num::NonZeroU32;
use std::sync::Arc;

use ab_glyph::{FontArc, PxScale};
use softbuffer::{Context as SoftContext, Surface};
use tracing::{debug, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::error::{Error, Result};
use draw::{Canvas, Color, LineMetrics, Rect, measure_text};

pub use dialog::ErrorDialog;
pub use font::load_font;
pub use qr_window::{QrWindow, qr_window_size};

/// One static screen with a single button that closes the window.
pub(crate) trait Scene {
    fn title(&self) -> &str;
    /// Requested inner size in logical pixels.
    fn logical_size(&self) -> (f64, f64);
    /// Paints a full frame and returns where the dismiss button was drawn.
    fn paint(&self, canvas: &mut Canvas, scale: f32, hovered: bool) -> Rect;
}

/// Opens a window for `scene` and blocks until it is dismissed.
///
/// winit allows a single event loop per process, so a program gets to show one
/// window this way.
pub(crate) fn run_scene<S: Scene>(scene: S) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| Error::Ui(err.to_string()))?;
    let mut app = SceneApp::new(scene);
    event_loop
        .run_app(&mut app)
        .map_err(|err| Error::Ui(err.to_string()))?;
    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

type WindowHandle = Arc<Window>;

struct SceneApp<S> {
    scene: S,
    window: Option<WindowHandle>,
    // Kept alive for as long as the surface exists.
    _context: Option<SoftContext<WindowHandle>>,
    surface: Option<Surface<WindowHandle, WindowHandle>>,
    scale_factor: f32,
    button: Rect,
    cursor: Option<(f32, f32)>,
    hovered: bool,
    needs_redraw: bool,
    failure: Option<Error>,
}

impl<S: Scene> SceneApp<S> {
    fn new(scene: S) -> Self {
        Self {
            scene,
            window: None,
            _context: None,
            surface: None,
            scale_factor: 1.0,
            button: Rect::default(),
            cursor: None,
            hovered: false,
            needs_redraw: true,
            failure: None,
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        if self.window.is_some() {
            return Ok(());
        }
        let (width, height) = self.scene.logical_size();
        let attrs = Window::default_attributes()
            .with_title(self.scene.title())
            .with_inner_size(LogicalSize::new(width, height))
            .with_resizable(false)
            .with_active(true);
        let window = event_loop
            .create_window(attrs)
            .map_err(|err| Error::Ui(format!("failed to create window: {err}")))?;
        let window = WindowHandle::new(window);

        let context = SoftContext::new(window.clone())
            .map_err(|err| Error::Ui(format!("failed to create softbuffer context: {err}")))?;
        let surface = Surface::new(&context, window.clone())
            .map_err(|err| Error::Ui(format!("failed to create softbuffer surface: {err}")))?;

        self.scale_factor = window.scale_factor() as f32;
        self._context = Some(context);
        self.surface = Some(surface);
        self.window = Some(window);
        self.needs_redraw = true;
        debug!(title = self.scene.title(), "window created");
        Ok(())
    }

    fn render(&mut self) {
        let (Some(window), Some(surface)) = (self.window.as_ref(), self.surface.as_mut()) else {
            return;
        };
        let size = window.inner_size();
        let (Some(width), Some(height)) = (
            NonZeroU32::new(size.width.max(1)),
            NonZeroU32::new(size.height.max(1)),
        ) else {
            return;
        };
        if let Err(err) = surface.resize(width, height) {
            warn!(error = %err, "failed to resize surface");
            return;
        }

        let mut canvas = Canvas::new(width.get(), height.get(), BACKGROUND);
        self.button = self.scene.paint(&mut canvas, self.scale_factor, self.hovered);

        match surface.buffer_mut() {
            Ok(mut buffer) => {
                buffer.copy_from_slice(canvas.pixels());
                if let Err(err) = buffer.present() {
                    warn!(error = %err, "failed to present frame");
                }
            }
            Err(err) => warn!(error = %err, "failed to map frame buffer"),
        }
    }

    fn set_hovered(&mut self, hovered: bool) {
        if self.hovered != hovered {
            self.hovered = hovered;
            self.needs_redraw = true;
        }
    }
}

impl<S: Scene> ApplicationHandler for SceneApp<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.ensure_window(event_loop) {
            self.failure = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != window_id {
            return;
        }
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => event_loop.exit(),
            WindowEvent::Resized(_) => self.needs_redraw = true,
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor as f32;
                self.needs_redraw = true;
            }
            WindowEvent::RedrawRequested => self.render(),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x as f32, position.y as f32));
                self.set_hovered(pointer_on(self.button, self.cursor));
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.set_hovered(false);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if pointer_on(self.button, self.cursor) => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if matches!(
                    event.logical_key,
                    Key::Named(NamedKey::Escape | NamedKey::Enter | NamedKey::Space)
                ) {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.needs_redraw {
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
            self.needs_redraw = false;
        }
    }
}

pub(crate) const BACKGROUND: Color = Color::from_rgb(0xf2f2f2);
pub(crate) const TEXT: Color = Color::from_rgb(0x1c1c1c);
const BUTTON_FACE: Color = Color::from_rgb(0xe1e1e1);
const BUTTON_HOVER: Color = Color::from_rgb(0xd0dcea);
const BUTTON_EDGE: Color = Color::from_rgb(0xadadad);

/// Draws a push button with its label centred inside `rect`.
pub(crate) fn draw_button(
    canvas: &mut Canvas,
    font: &FontArc,
    label: &str,
    rect: Rect,
    scale: f32,
    hovered: bool,
) {
    let radius = 4.0 * scale;
    let edge = scale.max(1.0);
    canvas.fill_rounded_rect(rect, radius, BUTTON_EDGE);
    let face = if hovered { BUTTON_HOVER } else { BUTTON_FACE };
    canvas.fill_rounded_rect(
        Rect::new(
            rect.left + edge,
            rect.top + edge,
            rect.width - 2.0 * edge,
            rect.height - 2.0 * edge,
        ),
        (radius - edge).max(0.0),
        face,
    );

    let px = PxScale::from(13.0 * scale);
    let metrics = LineMetrics::of(font, px);
    let text_width = measure_text(label, font, px);
    let left = rect.left + (rect.width - text_width) * 0.5;
    let baseline = rect.top + (rect.height + metrics.ascent - metrics.descent) * 0.5;
    canvas.draw_text(font, label, px, TEXT, left, baseline);
}

/// Whether the last known pointer position lies on `button`.
///
/// Presses are hit-tested against the button drawn in the latest frame, not
/// the hover state, which can lag behind a relayout.
fn pointer_on(button: Rect, cursor: Option<(f32, f32)>) -> bool {
    cursor.is_some_and(|(x, y)| button.contains(x, y))
}

/// Typography uses points like desktop toolkits do; 1pt = 4/3 px at 96 dpi.
pub(crate) fn points_to_px(points: f32, scale: f32) -> f32 {
    points * 96.0 / 72.0 * scale
}
