//! Scale-to-fill + parallax transform and the software painter that applies it.

use crate::error::Error;
use crate::render::loader::Raster;
use crate::scan::Orientation;

const BLACK: u32 = 0x0000_0000;

/// Scroll position per axis as a fraction of the pan range, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParallaxOffset {
    pub x: f32,
    pub y: f32,
}

impl ParallaxOffset {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub offset: ParallaxOffset,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            offset: ParallaxOffset::default(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::for_size(self.width, self.height)
    }
}

/// Uniform scale followed by a translation, mapping source pixels onto the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverTransform {
    pub scale: f32,
    pub tx: f32,
    pub ty: f32,
}

impl CoverTransform {
    pub fn scaled_size(&self, src_w: u32, src_h: u32) -> (f32, f32) {
        (src_w as f32 * self.scale, src_h as f32 * self.scale)
    }
}

/// Cover the viewport with the source, then pan the overflow by the parallax offset.
///
/// Offset 0 pins the left/top edge and offset 1 pins the right/bottom edge.
pub fn cover_transform(viewport: &Viewport, src_w: u32, src_h: u32) -> CoverTransform {
    let iw = src_w.max(1) as f32;
    let ih = src_h.max(1) as f32;
    let vw = viewport.width as f32;
    let vh = viewport.height as f32;
    let scale = (vw / iw).max(vh / ih);
    CoverTransform {
        scale,
        tx: -viewport.offset.x * (iw * scale - vw),
        ty: -viewport.offset.y * (ih * scale - vh),
    }
}

/// A borrowed `0x00RRGGBB` frame buffer.
pub struct Canvas<'a> {
    pixels: &'a mut [u32],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    /// Returns `None` when `pixels` does not hold exactly `width * height` entries.
    pub fn new(pixels: &'a mut [u32], width: u32, height: u32) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Paint `raster` through its cover transform at `alpha` (0-255).
    pub fn paint(&mut self, raster: &Raster, offset: ParallaxOffset, alpha: u8) {
        let (rw, rh) = (raster.width(), raster.height());
        if alpha == 0 || self.width == 0 || self.height == 0 || rw == 0 || rh == 0 {
            return;
        }
        let viewport = Viewport {
            width: self.width,
            height: self.height,
            offset,
        };
        let t = cover_transform(&viewport, rw, rh);

        let columns: Vec<usize> = (0..self.width)
            .map(|x| source_coord(x, t.tx, t.scale, rw) as usize * 4)
            .collect();
        let src = raster.pixels().as_raw();
        let src_stride = rw as usize * 4;
        let width = self.width as usize;

        for y in 0..self.height {
            let sy = source_coord(y, t.ty, t.scale, rh) as usize;
            let src_row = &src[sy * src_stride..(sy + 1) * src_stride];
            let start = y as usize * width;
            let dst_row = &mut self.pixels[start..start + width];
            for (dst, &sx) in dst_row.iter_mut().zip(&columns) {
                let rgba = &src_row[sx..sx + 4];
                let a = u32::from(alpha) * u32::from(rgba[3]) / 255;
                *dst = if a >= 255 {
                    pack(u32::from(rgba[0]), u32::from(rgba[1]), u32::from(rgba[2]))
                } else {
                    blend(rgba, *dst, a)
                };
            }
        }
    }
}

// Nearest source sample for the centre of destination pixel `dst`.
fn source_coord(dst: u32, translate: f32, scale: f32, extent: u32) -> u32 {
    let s = ((dst as f32 + 0.5 - translate) / scale).floor();
    if s.is_nan() {
        return 0;
    }
    s.clamp(0.0, (extent - 1) as f32) as u32
}

fn pack(r: u32, g: u32, b: u32) -> u32 {
    (r << 16) | (g << 8) | b
}

fn blend(src: &[u8], dst: u32, alpha: u32) -> u32 {
    let mix = |s: u8, d: u32| (u32::from(s) * alpha + d * (255 - alpha) + 127) / 255;
    pack(
        mix(src[0], (dst >> 16) & 0xFF),
        mix(src[1], (dst >> 8) & 0xFF),
        mix(src[2], dst & 0xFF),
    )
}

/// What goes on screen for one frame.
#[derive(Debug, Clone, Copy)]
pub enum Layers<'a> {
    Empty,
    Single(&'a Raster),
    /// `previous` fades out on top of a fully opaque `current`.
    Crossfade {
        current: &'a Raster,
        previous: &'a Raster,
        alpha: u8,
    },
}

/// Paint `layers` into `canvas`.
pub fn compose(canvas: &mut Canvas<'_>, layers: &Layers<'_>, offset: ParallaxOffset) {
    canvas.fill(BLACK);
    match *layers {
        Layers::Empty => {}
        Layers::Single(current) => canvas.paint(current, offset, u8::MAX),
        Layers::Crossfade {
            current,
            previous,
            alpha,
        } => {
            canvas.paint(current, offset, u8::MAX);
            canvas.paint(previous, offset, alpha);
        }
    }
}

/// A presentable frame buffer.
pub trait DrawSurface {
    /// Acquire a frame buffer, hand it to `paint`, then present it.
    ///
    /// # Errors
    /// Returns [`Error::SurfaceUnavailable`] without calling `paint` when no
    /// buffer can be acquired right now.
    fn paint_frame(&mut self, paint: &mut dyn FnMut(&mut Canvas<'_>)) -> Result<(), Error>;
}

/// A surface that is never ready, for hosts that have not attached one yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl DrawSurface for Detached {
    fn paint_frame(&mut self, _paint: &mut dyn FnMut(&mut Canvas<'_>)) -> Result<(), Error> {
        Err(Error::SurfaceUnavailable)
    }
}

/// Paint one frame through the surface's acquire/present pair.
pub fn draw<S: DrawSurface + ?Sized>(
    surface: &mut S,
    layers: &Layers<'_>,
    offset: ParallaxOffset,
) -> Result<(), Error> {
    surface.paint_frame(&mut |canvas| compose(canvas, layers, offset))
}
