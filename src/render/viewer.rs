use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use softbuffer::{Context as SoftContext, Surface};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

use crate::config::Configuration;
use crate::engine::SlideshowEngine;
use crate::error::Error;
use crate::events::{Effects, HostEvent, Moment};
use crate::render::compositor::{Canvas, Detached, DrawSurface};
use crate::render::loader::FileDecoder;
use crate::scan::DirectoryLibrary;

#[derive(Debug, Clone, Copy)]
pub enum ViewerEvent {
    Cancelled,
}

type WindowHandle = Arc<Window>;

/// A softbuffer surface sized to the window's inner area.
struct WindowSurface {
    _context: SoftContext<WindowHandle>,
    surface: Surface<WindowHandle, WindowHandle>,
    width: u32,
    height: u32,
}

impl WindowSurface {
    fn new(window: &WindowHandle) -> Result<Self> {
        let context = SoftContext::new(window.clone())
            .map_err(|err| anyhow!("failed to create softbuffer context: {err}"))?;
        let surface = Surface::new(&context, window.clone())
            .map_err(|err| anyhow!("failed to create softbuffer surface: {err}"))?;
        Ok(Self {
            _context: context,
            surface,
            width: 0,
            height: 0,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            self.width = 0;
            self.height = 0;
            return;
        };
        match self.surface.resize(width, height) {
            Ok(()) => {
                self.width = size.width;
                self.height = size.height;
            }
            Err(err) => warn!(error = %err, "failed to resize softbuffer surface"),
        }
    }
}

impl DrawSurface for WindowSurface {
    fn paint_frame(&mut self, paint: &mut dyn FnMut(&mut Canvas<'_>)) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::SurfaceUnavailable);
        }
        let mut buffer = self.surface.buffer_mut().map_err(|err| {
            debug!(error = %err, "no frame buffer available");
            Error::SurfaceUnavailable
        })?;
        {
            let mut canvas = Canvas::new(&mut *buffer, self.width, self.height)
                .ok_or(Error::SurfaceUnavailable)?;
            paint(&mut canvas);
        }
        buffer.present().map_err(|err| {
            warn!(error = %err, "failed to present frame");
            Error::SurfaceUnavailable
        })
    }
}

/// Remembers a frame presented during the current loop iteration, so the
/// `RedrawRequested` winit queues right after a resize does not paint it again.
#[derive(Debug, Default)]
struct RedrawGate {
    presented: Option<(u32, u32)>,
}

impl RedrawGate {
    fn record(&mut self, effects: &Effects, size: (u32, u32)) {
        if effects.painted() {
            self.presented = Some(size);
        }
    }

    /// `false` when a frame of exactly this size is already on screen.
    fn take_redraw(&mut self, size: (u32, u32)) -> bool {
        self.presented.take() != Some(size)
    }

    fn reset(&mut self) {
        self.presented = None;
    }
}

struct WallpaperApp {
    cfg: Configuration,
    cancel: CancellationToken,
    engine: SlideshowEngine<DirectoryLibrary, FileDecoder>,
    window: Option<WindowHandle>,
    surface: Option<WindowSurface>,
    size: PhysicalSize<u32>,
    occluded: bool,
    redraw_gate: RedrawGate,
}

impl WallpaperApp {
    fn new(cfg: Configuration, cancel: CancellationToken) -> Self {
        let library = DirectoryLibrary::new(cfg.wallpaper_path.clone());
        let decoder = FileDecoder::new(cfg.max_decode_dimension);
        let engine = SlideshowEngine::new(library, decoder, cfg.selection_mode(), cfg.timing());
        Self {
            cfg,
            cancel,
            engine,
            window: None,
            surface: None,
            size: PhysicalSize::new(0, 0),
            occluded: false,
            redraw_gate: RedrawGate::default(),
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Option<WindowHandle> {
        if let Some(window) = self.window.as_ref() {
            return Some(window.clone());
        }

        let mut attrs = Window::default_attributes().with_title(self.cfg.window.title.clone());
        if self.cfg.window.fullscreen {
            attrs = attrs
                .with_decorations(false)
                .with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        match event_loop.create_window(attrs) {
            Ok(window) => {
                window.set_cursor_visible(!self.cfg.window.hide_cursor);
                let window = WindowHandle::new(window);
                self.window = Some(window.clone());
                Some(window)
            }
            Err(err) => {
                error!(error = %err, "failed to create wallpaper window");
                None
            }
        }
    }

    fn dispatch(&mut self, event: HostEvent) {
        let at = Moment::now();
        let effects = match self.surface.as_mut() {
            Some(surface) => self.engine.handle_event(event, at, surface),
            None => self.engine.handle_event(event, at, &mut Detached),
        };
        self.redraw_gate
            .record(&effects, (self.size.width, self.size.height));
        trace!(?event, ?effects, "engine step");
    }

    fn handle_redraw(&mut self) {
        if self
            .redraw_gate
            .take_redraw((self.size.width, self.size.height))
        {
            self.dispatch(HostEvent::Redraw);
        } else {
            trace!("frame already presented at this size; skipping redraw");
        }
    }

    fn should_show(&self) -> bool {
        !self.occluded && self.size.width > 0 && self.size.height > 0
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(size);
        }
        if !self.should_show() {
            self.dispatch(HostEvent::VisibilityChanged(false));
            return;
        }
        self.dispatch(HostEvent::SurfaceResized {
            width: size.width,
            height: size.height,
        });
        if !self.engine.is_visible() {
            self.dispatch(HostEvent::VisibilityChanged(true));
        }
    }

    fn handle_pointer(&mut self, position: PhysicalPosition<f64>) {
        if !self.cfg.window.pointer_parallax || self.size.width == 0 || self.size.height == 0 {
            return;
        }
        let x = (position.x / f64::from(self.size.width)) as f32;
        let y = (position.y / f64::from(self.size.height)) as f32;
        self.dispatch(HostEvent::OffsetChanged { x, y });
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.dispatch(HostEvent::Destroy);
        event_loop.exit();
    }
}

impl ApplicationHandler<ViewerEvent> for WallpaperApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }

        let Some(window) = self.ensure_window(event_loop) else {
            event_loop.exit();
            return;
        };

        if self.surface.is_none() {
            match WindowSurface::new(&window) {
                Ok(surface) => self.surface = Some(surface),
                Err(err) => {
                    error!(error = ?err, "failed to initialize drawing surface");
                    event_loop.exit();
                    return;
                }
            }
        }

        info!(
            path = %self.cfg.wallpaper_path.display(),
            mode = ?self.cfg.selection_mode(),
            "wallpaper window ready"
        );
        self.handle_resize(window.inner_size());
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.dispatch(HostEvent::VisibilityChanged(false));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                info!("wallpaper window closed");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let size = window.inner_size();
                let _ = inner_size_writer.request_inner_size(size);
                self.handle_resize(size);
            }
            WindowEvent::Occluded(occluded) => {
                self.occluded = occluded;
                let visible = self.should_show();
                self.dispatch(HostEvent::VisibilityChanged(visible));
            }
            WindowEvent::CursorMoved { position, .. } => self.handle_pointer(position),
            WindowEvent::RedrawRequested => self.handle_redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            self.shutdown(event_loop);
            return;
        }
        if self.engine.is_due(Instant::now()) {
            self.dispatch(HostEvent::TimerFired);
        }
        match self.engine.deadline() {
            Some(at) => event_loop.set_control_flow(ControlFlow::WaitUntil(at)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
        self.redraw_gate.reset();
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Cancelled => {
                info!("wallpaper received cancellation event");
                self.shutdown(event_loop);
            }
        }
    }
}

/// Open the wallpaper window and drive the slideshow until closed or cancelled.
///
/// # Errors
/// Returns an error if the event loop cannot be created or fails while running.
pub fn run_windowed(cfg: Configuration, cancel: CancellationToken) -> Result<()> {
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build wallpaper event loop")?;
    let proxy = event_loop.create_proxy();

    let cancel_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            let _ = proxy.send_event(ViewerEvent::Cancelled);
        })
    };

    let mut app = WallpaperApp::new(cfg, cancel);
    let run_result = event_loop.run_app(&mut app);
    cancel_task.abort();

    run_result.context("wallpaper event loop failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Rendered, TimerAction};

    fn painted() -> Effects {
        Effects {
            rendered: Rendered::Single,
            timer: TimerAction::Armed(std::time::Duration::from_secs(1)),
        }
    }

    #[test]
    fn redraw_after_resize_paint_is_skipped_once() {
        let mut gate = RedrawGate::default();
        gate.record(&painted(), (800, 600));
        assert!(!gate.take_redraw((800, 600)));
        // a later expose still repaints
        assert!(gate.take_redraw((800, 600)));
    }

    #[test]
    fn redraw_at_new_size_is_honoured() {
        let mut gate = RedrawGate::default();
        gate.record(&painted(), (800, 600));
        assert!(gate.take_redraw((1024, 768)));
    }

    #[test]
    fn unpainted_steps_do_not_suppress_redraw() {
        let mut gate = RedrawGate::default();
        gate.record(&Effects::NONE, (800, 600));
        assert!(gate.take_redraw((800, 600)));

        gate.record(&painted(), (800, 600));
        gate.reset();
        assert!(gate.take_redraw((800, 600)));
    }
}
