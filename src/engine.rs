//! The slideshow engine: crossfade state machine plus its frame scheduler.
//!
//! All state changes happen inside [`SlideshowEngine::handle_event`], which
//! the host calls from a single thread for every lifecycle notification and
//! every elapsed deadline. The engine decides what to paint and when it wants
//! to be called again; the host only has to honour [`SlideshowEngine::deadline`].

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::events::{Effects, HostEvent, Moment, Rendered, TimerAction};
use crate::render::compositor::{DrawSurface, Layers, ParallaxOffset, Viewport, draw};
use crate::render::loader::{ImageDecoder, Raster};
use crate::scan::ImageSource;
use crate::selector::{SelectionMode, Selector};
use crate::timer::TimerSlot;

/// Progress a freshly started crossfade begins at, so it never reads as idle.
const INITIAL_PROGRESS: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Idle re-check period.
    pub poll_interval: Duration,
    /// Re-arm delay while a crossfade is animating.
    pub frame_interval: Duration,
    pub crossfade_duration: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            frame_interval: Duration::from_millis(1000 / 60),
            crossfade_duration: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrossfadeState {
    Idle,
    Transitioning { started: Instant, progress: f64 },
}

/// Opacity of the outgoing image at `progress`.
pub fn fade_alpha(progress: f64) -> u8 {
    ((1.0 - progress) * 255.0) as u8
}

/// The engine's two raster slots.
///
/// `previous` only exists while a crossfade runs. Installing a new one drops
/// the old generation first, so two previous rasters are never alive at once.
#[derive(Debug, Default)]
pub struct RasterPair {
    current: Option<Raster>,
    previous: Option<Raster>,
}

impl RasterPair {
    pub fn current(&self) -> Option<&Raster> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Raster> {
        self.previous.as_ref()
    }

    /// Swap in `raster` as current, dropping the outgoing image immediately.
    pub fn replace(&mut self, raster: Raster) {
        self.current = Some(raster);
    }

    /// Swap in `incoming`, keeping the outgoing image alive as `previous`.
    ///
    /// Returns `false` when there was no outgoing image to fade from.
    pub fn begin_fade(&mut self, incoming: Raster) -> bool {
        self.previous = None;
        self.previous = self.current.replace(incoming);
        self.previous.is_some()
    }

    pub fn release_previous(&mut self) {
        if let Some(old) = self.previous.take() {
            debug!(path = %old.path().display(), "released previous raster");
        }
    }

    pub fn clear(&mut self) {
        self.previous = None;
        self.current = None;
    }

    fn layers(&self, fade: Option<u8>) -> Layers<'_> {
        match (self.current.as_ref(), self.previous.as_ref(), fade) {
            (Some(current), Some(previous), Some(alpha)) => Layers::Crossfade {
                current,
                previous,
                alpha,
            },
            (Some(current), _, _) => Layers::Single(current),
            (None, _, _) => Layers::Empty,
        }
    }
}

enum Advance {
    Unchanged,
    /// New image is current with nothing to fade from.
    Installed,
    /// New image is current and the old one is held for the crossfade.
    Fading,
}

pub struct SlideshowEngine<L, D> {
    library: L,
    decoder: D,
    selector: Selector,
    timing: Timing,
    rasters: RasterPair,
    crossfade: CrossfadeState,
    visible: bool,
    viewport: Viewport,
    timer: TimerSlot,
}

impl<L: ImageSource, D: ImageDecoder> SlideshowEngine<L, D> {
    pub fn new(library: L, decoder: D, mode: SelectionMode, timing: Timing) -> Self {
        Self {
            library,
            decoder,
            selector: Selector::new(mode),
            timing,
            rasters: RasterPair::default(),
            crossfade: CrossfadeState::Idle,
            visible: false,
            viewport: Viewport::default(),
            timer: TimerSlot::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn crossfade(&self) -> CrossfadeState {
        self.crossfade
    }

    pub fn progress(&self) -> f64 {
        match self.crossfade {
            CrossfadeState::Idle => 0.0,
            CrossfadeState::Transitioning { progress, .. } => progress,
        }
    }

    pub fn rasters(&self) -> &RasterPair {
        &self.rasters
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selector.committed()
    }

    /// When the engine next wants [`HostEvent::TimerFired`], if at all.
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.timer.is_due(now)
    }

    pub fn handle_event<S: DrawSurface + ?Sized>(
        &mut self,
        event: HostEvent,
        at: Moment,
        surface: &mut S,
    ) -> Effects {
        match event {
            HostEvent::VisibilityChanged(true) => {
                let became_visible = !self.visible;
                self.visible = true;
                if became_visible {
                    self.show(at, surface)
                } else {
                    self.step(at, surface, false)
                }
            }
            HostEvent::VisibilityChanged(false) => self.hide(),
            HostEvent::SurfaceResized { width, height } => {
                self.viewport.width = width;
                self.viewport.height = height;
                debug!(width, height, "viewport resized");
                self.refresh(at, surface)
            }
            HostEvent::OffsetChanged { x, y } => {
                self.viewport.offset = ParallaxOffset::new(x, y);
                self.refresh(at, surface)
            }
            HostEvent::TimerFired => {
                self.timer.cancel();
                if !self.visible {
                    debug!("timer fired while hidden; ignoring");
                    return Effects::NONE;
                }
                self.step(at, surface, false)
            }
            HostEvent::Redraw => {
                if !self.visible {
                    return Effects::NONE;
                }
                Effects {
                    rendered: self.render(surface, self.fade()),
                    timer: TimerAction::Unchanged,
                }
            }
            HostEvent::Destroy => self.destroy(),
        }
    }

    // First frame after becoming visible: no crossfade, whatever the clock says.
    fn show<S: DrawSurface + ?Sized>(&mut self, at: Moment, surface: &mut S) -> Effects {
        self.rasters.release_previous();
        self.advance(at, false);
        self.crossfade = CrossfadeState::Idle;
        self.rasters.release_previous();
        let rendered = self.render(surface, None);
        info!(
            index = ?self.selector.committed(),
            width = self.viewport.width,
            height = self.viewport.height,
            "slideshow visible"
        );
        Effects {
            rendered,
            timer: self.arm(at, self.timing.poll_interval),
        }
    }

    fn hide(&mut self) -> Effects {
        self.visible = false;
        self.timer.cancel();
        self.crossfade = CrossfadeState::Idle;
        self.rasters.release_previous();
        debug!("slideshow hidden");
        Effects {
            rendered: Rendered::Nothing,
            timer: TimerAction::Cancelled,
        }
    }

    fn destroy(&mut self) -> Effects {
        let effects = self.hide();
        self.rasters.clear();
        info!("slideshow destroyed");
        effects
    }

    // Viewport changes only repaint while someone can see the result.
    fn refresh<S: DrawSurface + ?Sized>(&mut self, at: Moment, surface: &mut S) -> Effects {
        if !self.visible {
            return Effects::NONE;
        }
        self.step(at, surface, true)
    }

    fn step<S: DrawSurface + ?Sized>(
        &mut self,
        at: Moment,
        surface: &mut S,
        redraw: bool,
    ) -> Effects {
        match self.crossfade {
            CrossfadeState::Transitioning { started, progress } => {
                let elapsed = at.instant.saturating_duration_since(started);
                let progress = (elapsed.as_secs_f64()
                    / self.timing.crossfade_duration.as_secs_f64())
                .max(progress);
                if progress >= 1.0 {
                    self.crossfade = CrossfadeState::Idle;
                    let rendered = self.render(surface, None);
                    self.rasters.release_previous();
                    debug!("crossfade complete");
                    Effects {
                        rendered,
                        timer: self.arm(at, self.timing.poll_interval),
                    }
                } else {
                    self.crossfade = CrossfadeState::Transitioning { started, progress };
                    let rendered = self.render(surface, Some(fade_alpha(progress)));
                    Effects {
                        rendered,
                        timer: self.arm(at, self.timing.frame_interval),
                    }
                }
            }
            CrossfadeState::Idle => match self.advance(at, true) {
                Advance::Fading => {
                    self.crossfade = CrossfadeState::Transitioning {
                        started: at.instant,
                        progress: INITIAL_PROGRESS,
                    };
                    debug!("crossfade started");
                    Effects {
                        rendered: Rendered::Nothing,
                        timer: self.arm(at, self.timing.frame_interval),
                    }
                }
                Advance::Installed => Effects {
                    rendered: self.render(surface, None),
                    timer: self.arm(at, self.timing.poll_interval),
                },
                Advance::Unchanged => {
                    let rendered = if redraw {
                        self.render(surface, None)
                    } else {
                        Rendered::Nothing
                    };
                    Effects {
                        rendered,
                        timer: self.arm(at, self.timing.poll_interval),
                    }
                }
            },
        }
    }

    fn advance(&mut self, at: Moment, fade: bool) -> Advance {
        let Some((index, raster)) = self.pick(at) else {
            return Advance::Unchanged;
        };
        self.selector.commit(index);
        if !fade {
            self.rasters.replace(raster);
            return Advance::Installed;
        }
        if self.rasters.begin_fade(raster) {
            Advance::Fading
        } else {
            Advance::Installed
        }
    }

    // Rebuild the candidate set, consult the selector and decode on change.
    fn pick(&self, at: Moment) -> Option<(usize, Raster)> {
        let orientation = self.viewport.orientation();
        let images = match self.library.list_images(orientation) {
            Ok(images) => images,
            Err(err) if err.is_empty_library() => {
                debug!(error = %err, "image library unavailable; skipping selection");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "failed to list images");
                return None;
            }
        };
        let selection = match self.selector.select(at.wall, images.len()) {
            Ok(selection) => selection,
            Err(err) => {
                debug!(error = %err, "skipping selection");
                return None;
            }
        };
        if !selection.changed {
            return None;
        }
        let path = images.get(selection.index)?;
        match self.decoder.decode(path) {
            Ok(raster) => {
                info!(
                    index = selection.index,
                    count = images.len(),
                    path = %path.display(),
                    "advancing slideshow"
                );
                Some((selection.index, raster))
            }
            Err(err) => {
                warn!(error = %err, "keeping current image; will retry next poll");
                None
            }
        }
    }

    fn fade(&self) -> Option<u8> {
        match self.crossfade {
            CrossfadeState::Idle => None,
            CrossfadeState::Transitioning { progress, .. } => Some(fade_alpha(progress)),
        }
    }

    fn render<S: DrawSurface + ?Sized>(&self, surface: &mut S, fade: Option<u8>) -> Rendered {
        let layers = self.rasters.layers(fade);
        match draw(surface, &layers, self.viewport.offset) {
            Ok(()) => match layers {
                Layers::Crossfade { alpha, .. } => Rendered::Crossfade { alpha },
                Layers::Single(_) => Rendered::Single,
                Layers::Empty => Rendered::Cleared,
            },
            Err(err) => {
                debug!(error = %err, "skipping frame");
                Rendered::Skipped
            }
        }
    }

    // Cancel-then-schedule: the slot never holds more than one deadline.
    fn arm(&mut self, at: Moment, delay: Duration) -> TimerAction {
        match self.timer.arm(at.instant, delay) {
            Some(_) => TimerAction::Armed(delay),
            None => TimerAction::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn raster(name: &str) -> Raster {
        Raster::new(name, RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255])))
    }

    #[test]
    fn alpha_fades_from_opaque_to_clear() {
        assert_eq!(fade_alpha(0.0), 255);
        assert_eq!(fade_alpha(0.5), 127);
        assert_eq!(fade_alpha(1.0), 0);
    }

    #[test]
    fn first_fade_has_nothing_to_hold() {
        let mut pair = RasterPair::default();
        assert!(!pair.begin_fade(raster("a")));
        assert!(pair.previous().is_none());
        assert!(pair.begin_fade(raster("b")));
        assert_eq!(pair.previous().unwrap().path().to_str(), Some("a"));
        assert_eq!(pair.current().unwrap().path().to_str(), Some("b"));
    }

    #[test]
    fn interrupting_fade_keeps_only_latest_previous() {
        let mut pair = RasterPair::default();
        pair.replace(raster("a"));
        pair.begin_fade(raster("b"));
        pair.begin_fade(raster("c"));
        assert_eq!(pair.previous().unwrap().path().to_str(), Some("b"));
        assert_eq!(pair.current().unwrap().path().to_str(), Some("c"));
        pair.release_previous();
        assert!(pair.previous().is_none());
    }

    #[test]
    fn layers_ignore_fade_without_previous() {
        let mut pair = RasterPair::default();
        assert!(matches!(pair.layers(Some(10)), Layers::Empty));
        pair.replace(raster("a"));
        assert!(matches!(pair.layers(Some(10)), Layers::Single(_)));
        pair.begin_fade(raster("b"));
        assert!(matches!(
            pair.layers(Some(10)),
            Layers::Crossfade { alpha: 10, .. }
        ));
        assert!(matches!(pair.layers(None), Layers::Single(_)));
    }
}
