use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::engine::Timing;
use crate::selector::SelectionMode;

const DEFAULT_WALLPAPER_SUBDIR: &str = "Pictures/Wallpapers";
const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Directory holding the wallpapers, plus optional `Portrait`/`Landscape` subfolders.
    pub wallpaper_path: PathBuf,
    /// Hash the minute bucket instead of walking the folder in order.
    pub shuffle: bool,
    /// How often the engine checks whether the minute bucket moved on.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Animation rate while a crossfade is running.
    pub frame_rate: u32,
    /// Length of the fade from the outgoing to the incoming image.
    #[serde(with = "humantime_serde")]
    pub crossfade_duration: Duration,
    /// Decoded images larger than this on either side are downscaled.
    pub max_decode_dimension: u32,
    /// Host window behaviour.
    pub window: WindowConfig,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_yaml::from_str(&s)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.wallpaper_path.as_os_str().is_empty(),
            "wallpaper-path must not be empty"
        );
        ensure!(
            !self.poll_interval.is_zero(),
            "poll-interval must be greater than zero"
        );
        ensure!(
            self.poll_interval <= MAX_INTERVAL,
            "poll-interval must be at most one day"
        );
        ensure!(
            (1..=1000).contains(&self.frame_rate),
            "frame-rate must be between 1 and 1000"
        );
        ensure!(
            !self.crossfade_duration.is_zero(),
            "crossfade-duration must be greater than zero"
        );
        ensure!(
            self.crossfade_duration <= MAX_INTERVAL,
            "crossfade-duration must be at most one day"
        );
        ensure!(
            self.max_decode_dimension > 0,
            "max-decode-dimension must be greater than zero"
        );
        Ok(self)
    }

    pub fn selection_mode(&self) -> SelectionMode {
        if self.shuffle {
            SelectionMode::Shuffle
        } else {
            SelectionMode::Sequential
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            poll_interval: self.poll_interval,
            frame_interval: Duration::from_millis(u64::from(1000 / self.frame_rate.max(1))),
            crossfade_duration: self.crossfade_duration,
        }
    }

    fn default_wallpaper_path() -> PathBuf {
        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(DEFAULT_WALLPAPER_SUBDIR),
            None => PathBuf::from("Wallpapers"),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            wallpaper_path: Self::default_wallpaper_path(),
            shuffle: false,
            poll_interval: Duration::from_secs(1),
            frame_rate: 60,
            crossfade_duration: Duration::from_secs(1),
            max_decode_dimension: 4096,
            window: WindowConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    /// Open as a borderless fullscreen window on the current monitor.
    pub fullscreen: bool,
    pub hide_cursor: bool,
    /// Pan the wallpaper with the pointer position.
    pub pointer_parallax: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Slideshow Wallpaper".to_string(),
            fullscreen: true,
            hide_cursor: true,
            pointer_parallax: true,
        }
    }
}
