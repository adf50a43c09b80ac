//! In-memory stand-ins for the engine's collaborators, shared by unit and
//! integration tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime};
use image::{Rgba, RgbaImage};

use crate::error::Error;
use crate::events::Moment;
use crate::render::compositor::{Canvas, DrawSurface};
use crate::render::loader::{ImageDecoder, Raster};
use crate::scan::{ImageSource, Orientation};

/// `2024-03-01 12:00:00`, a fixed wall clock origin for deterministic runs.
pub fn base_wall() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

pub fn base_moment() -> Moment {
    Moment::new(Instant::now(), base_wall())
}

/// Frame buffer held in memory; counts presented frames.
#[derive(Debug)]
pub struct MemorySurface {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    ready: bool,
    presented: usize,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            ready: true,
            presented: 0,
        }
    }

    /// An unready surface refuses every frame, like a window not yet mapped.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize];
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

impl DrawSurface for MemorySurface {
    fn paint_frame(&mut self, paint: &mut dyn FnMut(&mut Canvas<'_>)) -> Result<(), Error> {
        if !self.ready {
            return Err(Error::SurfaceUnavailable);
        }
        let mut canvas = Canvas::new(&mut self.pixels, self.width, self.height)
            .ok_or(Error::SurfaceUnavailable)?;
        paint(&mut canvas);
        self.presented += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LibraryState {
    root: Vec<PathBuf>,
    portrait: Vec<PathBuf>,
    landscape: Vec<PathBuf>,
    unavailable: bool,
}

/// A library whose listing the test can change while the engine owns a clone.
#[derive(Debug, Clone, Default)]
pub struct StaticLibrary {
    state: Rc<RefCell<LibraryState>>,
}

impl StaticLibrary {
    pub fn with_images<I, P>(images: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let library = Self::default();
        library.set_images(images);
        library
    }

    pub fn set_images<I, P>(&self, images: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.state.borrow_mut().root = images.into_iter().map(Into::into).collect();
    }

    pub fn set_oriented<I, P>(&self, orientation: Orientation, images: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let images = images.into_iter().map(Into::into).collect();
        let mut state = self.state.borrow_mut();
        match orientation {
            Orientation::Portrait => state.portrait = images,
            Orientation::Landscape => state.landscape = images,
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.borrow_mut().unavailable = unavailable;
    }
}

impl ImageSource for StaticLibrary {
    fn list_images(&self, orientation: Orientation) -> Result<Vec<PathBuf>, Error> {
        let state = self.state.borrow();
        if state.unavailable {
            return Err(Error::DirectoryUnavailable(PathBuf::from("memory")));
        }
        let extra = match orientation {
            Orientation::Portrait => &state.portrait,
            Orientation::Landscape => &state.landscape,
        };
        Ok(state.root.iter().chain(extra).cloned().collect())
    }
}

/// Produces a solid raster per path; the colour is a function of the path.
#[derive(Debug, Clone)]
pub struct SolidDecoder {
    size: (u32, u32),
    failing: Rc<RefCell<HashSet<PathBuf>>>,
    decodes: Rc<Cell<usize>>,
}

impl Default for SolidDecoder {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl SolidDecoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width.max(1), height.max(1)),
            failing: Rc::default(),
            decodes: Rc::default(),
        }
    }

    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.borrow_mut().insert(path.into());
    }

    pub fn heal(&self, path: &Path) {
        self.failing.borrow_mut().remove(path);
    }

    /// Decode attempts so far, successful or not.
    pub fn decodes(&self) -> usize {
        self.decodes.get()
    }

    pub fn color_for(path: &Path) -> [u8; 3] {
        let n = path
            .to_string_lossy()
            .bytes()
            .fold(7u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        [n as u8, (n >> 8) as u8, (n >> 16) as u8]
    }

    /// [`Self::color_for`] as it lands in a `0x00RRGGBB` frame buffer.
    pub fn packed_color_for(path: &Path) -> u32 {
        let [r, g, b] = Self::color_for(path);
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }
}

impl ImageDecoder for SolidDecoder {
    fn decode(&self, path: &Path) -> Result<Raster, Error> {
        self.decodes.set(self.decodes.get() + 1);
        if self.failing.borrow().contains(path) {
            return Err(Error::DecodeFailure {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "marked as failing",
                )),
            });
        }
        let [r, g, b] = Self::color_for(path);
        let pixels = RgbaImage::from_pixel(self.size.0, self.size.1, Rgba([r, g, b, 255]));
        Ok(Raster::new(path, pixels))
    }
}
