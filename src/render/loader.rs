use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use fast_image_resize as fir;
use image::{ImageError, RgbaImage};
use tracing::{debug, warn};

use crate::error::Error;

/// A decoded RGBA8 image, owned by whoever holds it.
pub struct Raster {
    path: PathBuf,
    pixels: RgbaImage,
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("path", &self.path)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Raster {
    pub fn new(path: impl Into<PathBuf>, pixels: RgbaImage) -> Self {
        Self {
            path: path.into(),
            pixels,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Turns a path into a raster.
pub trait ImageDecoder {
    /// # Errors
    /// Returns [`Error::DecodeFailure`] when the file cannot be read or decoded.
    fn decode(&self, path: &Path) -> Result<Raster, Error>;
}

/// Decodes from disk with the `image` crate, honouring EXIF orientation and
/// capping the raster size.
#[derive(Debug, Clone)]
pub struct FileDecoder {
    max_dimension: u32,
}

impl FileDecoder {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<Raster, Error> {
        let img = decode_rgba8_apply_exif(path).map_err(|source| Error::DecodeFailure {
            path: path.to_path_buf(),
            source,
        })?;
        let (w, h) = img.dimensions();
        let (target_w, target_h) = fit_within(w, h, self.max_dimension);
        let pixels = if (target_w, target_h) == (w, h) {
            img
        } else {
            match resize_rgba(&img, target_w, target_h) {
                Ok(resized) => {
                    debug!(
                        path = %path.display(),
                        from = ?(w, h),
                        to = ?(target_w, target_h),
                        "downscaled oversized image"
                    );
                    resized
                }
                Err(err) => {
                    warn!(path = %path.display(), error = ?err, "downscale failed; keeping full size");
                    img
                }
            }
        };
        Ok(Raster::new(path, pixels))
    }
}

// Decodes an image to RGBA8 and applies EXIF orientation if available.
// Missing or unreadable metadata leaves the pixels as stored.
fn decode_rgba8_apply_exif(path: &Path) -> Result<RgbaImage, ImageError> {
    let img = image::ImageReader::open(path)
        .map_err(ImageError::IoError)?
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .decode()?;
    let img = img.to_rgba8();

    let orientation = read_orientation(path).unwrap_or(1);
    Ok(apply_orientation(img, orientation))
}

fn apply_orientation(img: RgbaImage, orientation: u16) -> RgbaImage {
    use image::imageops::{flip_horizontal, flip_vertical, rotate90, rotate180, rotate270};
    match orientation {
        2 => flip_horizontal(&img),
        3 => rotate180(&img),
        4 => flip_vertical(&img),
        // transpose
        5 => flip_horizontal(&rotate90(&img)),
        6 => rotate90(&img),
        // transverse
        7 => flip_horizontal(&rotate270(&img)),
        8 => rotate270(&img),
        _ => img,
    }
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let o = field.value.get_uint(0)? as u16;
    debug!(orientation = o, path = %path.display(), "exif orientation");
    Some(o)
}

/// Largest size with the same aspect ratio whose sides both fit in `max_dim`.
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dim || longest == 0 {
        return (width, height);
    }
    let scale = max_dim as f64 / longest as f64;
    let w = (width as f64 * scale).round().clamp(1.0, max_dim as f64);
    let h = (height as f64 * scale).round().clamp(1.0, max_dim as f64);
    (w as u32, h as u32)
}

fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> anyhow::Result<RgbaImage> {
    if target_w == 0 || target_h == 0 {
        anyhow::bail!("resize dimensions must be positive");
    }
    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("failed to create source view for downscale")?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .context("downscale failed")?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| anyhow::anyhow!("failed to construct resized RGBA image"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    // JPEG 2x1 with EXIF orientation 6 (rotate 90 CW), base64 encoded
    const ORIENT6_JPEG: &str = concat!(
        "/9j/4AAQSkZJRgABAQAAAQABAAD/4QAiRXhpZgAATU0AKgAAAAgAAQESAAMAAAABAAYAAAAAAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8UHRofHh0aHBwgJC4nICIsIxwcKDcpLDAxNDQ0Hyc5PTgyPC4zNDL/",
        "2wBDAQkJCQwLDBgNDRgyIRwhMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjL/wAARCAABAAIDASIAAhEBAxEB/8QAHwAAAQUBAQEBAQEAAAAAAAAAAAECAwQFBgcICQoL/8QAtRAAAgEDAwIEAwUFBAQAAAF9AQIDAAQRBRIhMUEGE1FhByJxFDKBkaEII0KxwRVS0fAkM2JyggkKFhcYGRolJicoKSo0NTY3ODk6Q0RFRkdISUpTVFVWV1hZWmNkZWZnaGlqc3R1dnd4eXqDhIWGh4iJipKTlJWWl5iZmqKjpKWmp6ipqrKztLW2t7i5usLDxMXGx8jJytLT1NXW19jZ2uHi4+Tl5ufo6erx8vP09fb3+Pn6/8QAHwEAAwEBAQEBAQEBAQAAAAAAAAECAwQFBgcICQoL/8QAtREAAgECBAQDBAcFBAQAAQJ3AAECAxEEBSExBhJBUQdhcRMiMoEIFEKRobHBCSMzUvAVYnLRChYkNOEl8RcYGRomJygpKjU2Nzg5OkNERUZHSElKU1RVVldYWVpjZGVmZ2hpanN0dXZ3eHl6goOEhYaHiImKkpOUlZaXmJmaoqOkpaanqKmqsrO0tba3uLm6wsPExcbHyMnK0tPU1dbX2Nna4uPk5ebn6Onq8vP09fb3+Pn6/9oADAMBAAIRAxEAPwDi6KKK+ZP3E//Z"
    );

    #[test]
    fn applies_orientation_six() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(ORIENT6_JPEG)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orient6.jpg");
        std::fs::write(&path, &bytes).unwrap();
        let raster = FileDecoder::new(4096).decode(&path).unwrap();
        assert_eq!((raster.width(), raster.height()), (1, 2));
    }

    #[test]
    fn oversized_images_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbaImage::from_pixel(400, 100, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        let raster = FileDecoder::new(200).decode(&path).unwrap();
        assert_eq!((raster.width(), raster.height()), (200, 50));
        assert_eq!(raster.pixels().get_pixel(100, 25).0, [10, 20, 30, 255]);
    }

    #[test]
    fn garbage_bytes_are_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        match FileDecoder::new(4096).decode(&path) {
            Err(Error::DecodeFailure { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected decode failure, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_decode_failure() {
        let err = FileDecoder::new(4096)
            .decode(Path::new("/nonexistent/wallpaper.png"))
            .unwrap_err();
        assert!(matches!(err, Error::DecodeFailure { .. }));
    }

    #[test]
    fn fit_within_preserves_aspect() {
        assert_eq!(fit_within(4000, 3000, 2000), (2000, 1500));
        assert_eq!(fit_within(3000, 4000, 2000), (1500, 2000));
        assert_eq!(fit_within(800, 600, 2000), (800, 600));
        assert_eq!(fit_within(10_000, 1, 100), (100, 1));
    }
}
