use image::{Rgba, RgbaImage};
use slideshow_wallpaper::render::compositor::{
    Canvas, Layers, ParallaxOffset, Viewport, compose, cover_transform,
};
use slideshow_wallpaper::render::loader::Raster;

fn close(a: f32, b: f32) {
    assert!((a - b).abs() <= 0.001, "{a} vs {b}");
}

fn viewport(w: u32, h: u32, x: f32, y: f32) -> Viewport {
    Viewport {
        offset: ParallaxOffset::new(x, y),
        ..Viewport::new(w, h)
    }
}

#[test]
fn square_image_covers_tall_viewport() {
    // 500x500 on 1000x2000: scale = max(2, 4) = 4, scaled 2000x2000
    let t = cover_transform(&viewport(1000, 2000, 1.0, 0.5), 500, 500);
    close(t.scale, 4.0);
    close(t.tx, -1000.0);
    close(t.ty, 0.0);
    let (w, h) = t.scaled_size(500, 500);
    close(w, 2000.0);
    close(h, 2000.0);
}

#[test]
fn tall_image_pans_vertically() {
    // 1000x2000 on 500x500: scale = max(0.5, 0.25) = 0.5, scaled 500x1000
    let top = cover_transform(&viewport(500, 500, 0.0, 0.0), 1000, 2000);
    close(top.scale, 0.5);
    close(top.tx, 0.0);
    close(top.ty, 0.0);

    let bottom = cover_transform(&viewport(500, 500, 0.0, 1.0), 1000, 2000);
    close(bottom.ty, -500.0);

    let middle = cover_transform(&viewport(500, 500, 0.0, 0.5), 1000, 2000);
    close(middle.ty, -250.0);
}

#[test]
fn exact_fit_has_no_pan_range() {
    let t = cover_transform(&viewport(1920, 1080, 1.0, 1.0), 3840, 2160);
    close(t.scale, 0.5);
    close(t.tx, 0.0);
    close(t.ty, 0.0);
}

#[test]
fn scaled_image_always_covers_viewport() {
    for (vw, vh, iw, ih) in [(1920, 1080, 800, 600), (1080, 1920, 4000, 3000), (640, 480, 10, 1000)] {
        let t = cover_transform(&viewport(vw, vh, 0.3, 0.7), iw, ih);
        let (w, h) = t.scaled_size(iw, ih);
        assert!(w + 0.01 >= vw as f32 && h + 0.01 >= vh as f32);
        assert!(t.tx <= 0.0 && t.tx + w + 0.01 >= vw as f32);
        assert!(t.ty <= 0.0 && t.ty + h + 0.01 >= vh as f32);
    }
}

#[test]
fn offset_selects_visible_half() {
    // left half red, right half blue, shown on a square canvas
    let mut img = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
    let raster = Raster::new("split.png", img);

    let mut buf = vec![0u32; 1];
    let mut canvas = Canvas::new(&mut buf, 1, 1).unwrap();
    compose(&mut canvas, &Layers::Single(&raster), ParallaxOffset::new(0.0, 0.0));
    assert_eq!(canvas.pixel(0, 0), Some(0x00FF_0000));
    compose(&mut canvas, &Layers::Single(&raster), ParallaxOffset::new(1.0, 0.0));
    assert_eq!(canvas.pixel(0, 0), Some(0x0000_00FF));
}

#[test]
fn half_faded_previous_mixes_evenly() {
    let current = Raster::new("white.png", RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])));
    let previous = Raster::new("black.png", RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])));
    let mut buf = vec![0u32; 4];
    let mut canvas = Canvas::new(&mut buf, 2, 2).unwrap();
    compose(
        &mut canvas,
        &Layers::Crossfade {
            current: &current,
            previous: &previous,
            alpha: 127,
        },
        ParallaxOffset::default(),
    );
    // 255 * 128 / 255 rounds to 128 per channel
    assert_eq!(canvas.pixel(1, 1), Some(0x0080_8080));
}
