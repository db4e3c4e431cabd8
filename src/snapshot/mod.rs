//! Still-frame snapshot rasterizer.
//!
//! Rasterizes a [`Scene`] on the CPU into an RGBA image: paper background
//! with speckle, antialiased coverage for strokes, discs and outlines, and a
//! built-in bitmap font for glyphs. The species name is stamped top-left.

mod font;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::path::Path;

use glam::Vec2;
use image::{ImageFormat, Rgba, RgbaImage};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::descriptor::{GeneticDescriptor, Rgb};
use crate::error::{EngineError, Result};
use crate::params::RenderConfig;
use crate::render::{Paint, Scene, Shape};

const LABEL_ORIGIN: Vec2 = Vec2::new(20.0, 40.0);
const LABEL_SIZE: f32 = 20.0;
const SPECKLE_ALPHA: f32 = 0.04;

/// One captured still frame
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub image: RgbaImage,
    /// Overlay text stamped on the frame
    pub label: String,
}

impl Snapshot {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode as PNG bytes
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| EngineError::Encode(e.to_string()))?;
        Ok(buf.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        image::save_buffer(
            path,
            self.image.as_raw(),
            self.width(),
            self.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| EngineError::Encode(format!("{}: {}", path.display(), e)))?;
        info!("Snapshot saved to {}", path.display());
        Ok(())
    }
}

/// Rasterize `scene` with the species label overlay.
///
/// Paper speckle is seeded from the species name, so one specimen always
/// lands on the same sheet.
pub fn snapshot(scene: &Scene, descriptor: &GeneticDescriptor, config: &RenderConfig) -> Snapshot {
    let mut canvas = Canvas::paper(scene.width, scene.height, config);

    let mut hasher = DefaultHasher::new();
    descriptor.name.hash(&mut hasher);
    canvas.speckle(config.paper_speckles, &mut StdRng::seed_from_u64(hasher.finish()));

    for primitive in &scene.primitives {
        canvas.draw(&primitive.shape, primitive.paint);
    }

    let label = descriptor.name.to_uppercase();
    canvas.text(LABEL_ORIGIN, &label, LABEL_SIZE, 0.0, Paint::new(Rgb(0, 0, 0), 1.0));

    Snapshot {
        image: canvas.image,
        label,
    }
}

struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    fn paper(width: u32, height: u32, config: &RenderConfig) -> Self {
        let [r, g, b] = config.paper_rgb;
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([r, g, b, 255])),
        }
    }

    fn speckle<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        let ink = Paint::new(Rgb(0, 0, 0), SPECKLE_ALPHA);
        for _ in 0..count {
            let at = Vec2::new(rng.gen::<f32>() * w, rng.gen::<f32>() * h);
            let radius = rng.gen_range(0.5..2.0);
            self.disc(at, radius, ink);
        }
    }

    fn draw(&mut self, shape: &Shape, paint: Paint) {
        match shape {
            Shape::Polyline { points, width } => {
                if let [only] = points.as_slice() {
                    self.disc(*only, width / 2.0, paint);
                }
                for pair in points.windows(2) {
                    self.segment(pair[0], pair[1], *width, paint);
                }
            }
            Shape::Disc { center, radius } => self.disc(*center, *radius, paint),
            Shape::Outline {
                center,
                radius,
                width,
            } => self.outline(*center, *radius, *width, paint),
            Shape::Glyph {
                origin,
                text,
                size,
                angle,
            } => self.text(*origin, text, *size, *angle, paint),
        }
    }

    fn disc(&mut self, center: Vec2, radius: f32, paint: Paint) {
        self.cover(center - Vec2::splat(radius), center + Vec2::splat(radius), paint, |p| {
            radius + 0.5 - p.distance(center)
        });
    }

    fn outline(&mut self, center: Vec2, radius: f32, width: f32, paint: Paint) {
        let half = width / 2.0;
        let r = radius + half;
        self.cover(center - Vec2::splat(r), center + Vec2::splat(r), paint, |p| {
            half + 0.5 - (p.distance(center) - radius).abs()
        });
    }

    fn segment(&mut self, a: Vec2, b: Vec2, width: f32, paint: Paint) {
        let half = (width / 2.0).max(0.5);
        let ab = b - a;
        let len2 = ab.length_squared();
        self.cover(a.min(b) - Vec2::splat(half), a.max(b) + Vec2::splat(half), paint, |p| {
            let t = if len2 > 0.0 {
                ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            half + 0.5 - p.distance(a + ab * t)
        });
    }

    /// Bitmap text; one font cell is a tenth of `size`
    fn text(&mut self, origin: Vec2, text: &str, size: f32, angle: f32, paint: Paint) {
        let cell = size / 10.0;
        let (sin, cos) = angle.sin_cos();
        for (col, row) in font::cells(text) {
            let local = Vec2::new(
                (col as f32 + 0.5) * cell,
                (row as f32 + 0.5 - font::GLYPH_HEIGHT as f32) * cell,
            );
            let rotated = Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos);
            self.disc(origin + rotated, cell * 0.62, paint);
        }
    }

    /// Blend `paint` over the box `lo..hi`, weighting each pixel center by
    /// `coverage(p)` clamped to 0..1.
    fn cover(&mut self, lo: Vec2, hi: Vec2, paint: Paint, coverage: impl Fn(Vec2) -> f32) {
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);
        let x0 = (lo.x.floor() as i64).max(0);
        let y0 = (lo.y.floor() as i64).max(0);
        let x1 = (hi.x.ceil() as i64).min(w - 1);
        let y1 = (hi.y.ceil() as i64).min(h - 1);
        if paint.alpha <= 0.0 || x0 > x1 || y0 > y1 {
            return;
        }
        for y in y0..=y1 {
            for x in x0..=x1 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let a = coverage(center).clamp(0.0, 1.0) * paint.alpha;
                if a > 0.0 {
                    blend(self.image.get_pixel_mut(x as u32, y as u32), paint.rgb, a);
                }
            }
        }
    }
}

fn blend(px: &mut Rgba<u8>, rgb: Rgb, alpha: f32) {
    let Rgb(r, g, b) = rgb;
    for (channel, src) in px.0.iter_mut().zip([r, g, b]) {
        let mixed = *channel as f32 * (1.0 - alpha) + src as f32 * alpha;
        *channel = mixed.round().clamp(0.0, 255.0) as u8;
    }
}
