use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime, TimeDelta};

/// Inbound notifications from whatever hosts the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    VisibilityChanged(bool),
    SurfaceResized { width: u32, height: u32 },
    /// Parallax scroll position, each axis a fraction in `[0, 1]`.
    OffsetChanged { x: f32, y: f32 },
    /// The engine's single pending deadline elapsed.
    TimerFired,
    /// The host lost the frame contents (expose, damage) and wants them back.
    Redraw,
    Destroy,
}

/// The two clocks an engine step reads: monotonic for animation progress,
/// local wall time for picking the image.
#[derive(Debug, Clone, Copy)]
pub struct Moment {
    pub instant: Instant,
    pub wall: NaiveDateTime,
}

impl Moment {
    pub fn new(instant: Instant, wall: NaiveDateTime) -> Self {
        Self { instant, wall }
    }

    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Local::now().naive_local(),
        }
    }

    /// Both clocks advanced by `elapsed`.
    pub fn after(&self, elapsed: Duration) -> Self {
        let delta = TimeDelta::from_std(elapsed).unwrap_or(TimeDelta::zero());
        Self {
            instant: self.instant.checked_add(elapsed).unwrap_or(self.instant),
            wall: self.wall.checked_add_signed(delta).unwrap_or(self.wall),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendered {
    Nothing,
    Single,
    /// No raster yet; the frame was only cleared to black.
    Cleared,
    /// Both layers painted; `alpha` is the previous image's remaining opacity.
    Crossfade { alpha: u8 },
    /// A paint was due but the surface had no buffer to give.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Armed(Duration),
    Cancelled,
    Unchanged,
}

/// What one engine step did, for hosts that want to react and for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effects {
    pub rendered: Rendered,
    pub timer: TimerAction,
}

impl Effects {
    pub const NONE: Self = Self {
        rendered: Rendered::Nothing,
        timer: TimerAction::Unchanged,
    };

    pub fn painted(&self) -> bool {
        matches!(self.rendered, Rendered::Single | Rendered::Crossfade { .. })
    }
}
