use std::path::PathBuf;

use thiserror::Error;

/// Library error type for slideshow operations.
///
/// Every runtime variant is recoverable: the engine logs it, skips the
/// affected action and keeps its schedule running.
#[derive(Debug, Error)]
pub enum Error {
    /// No candidate images were found for the current orientation.
    #[error("no candidate images found")]
    EmptyImageSet,

    /// The wallpaper directory is missing or not a directory.
    #[error("image directory unavailable: {}", .0.display())]
    DirectoryUnavailable(PathBuf),

    /// The selected file could not be decoded into a raster.
    #[error("failed to decode {}: {source}", path.display())]
    DecodeFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The drawable surface had no frame buffer to hand out.
    #[error("drawable surface is not ready")]
    SurfaceUnavailable,
}

impl Error {
    /// `true` for the errors that simply mean "nothing to show right now".
    pub fn is_empty_library(&self) -> bool {
        matches!(self, Self::EmptyImageSet | Self::DirectoryUnavailable(_))
    }
}
