//! Shared primitive library used by every topology.
//!
//! All primitives read the same physiology and pointer state: energy
//! thickens strokes and swells clusters, stress scatters samples, pointer
//! proximity brightens, enlarges and pulls geometry toward it.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use super::pointer::{reach, PointerState};
use super::scene::{Paint, Part, Scene, Shape};
use crate::descriptor::{LeafShape, Rgb};
use crate::physiology::PhysioState;

pub struct Brush<'a, R: Rng + ?Sized> {
    pub scene: Scene,
    pointer: PointerState,
    physio: PhysioState,
    wind: f32,
    words: &'a [String],
    cap: f32,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> Brush<'a, R> {
    pub fn new(
        scene: Scene,
        pointer: PointerState,
        physio: PhysioState,
        wind: f32,
        words: &'a [String],
        attraction_cap: f32,
        rng: &'a mut R,
    ) -> Self {
        Self {
            scene,
            pointer,
            physio,
            wind,
            words,
            cap: attraction_cap,
            rng,
        }
    }

    pub fn finish(self) -> Scene {
        self.scene
    }

    pub fn physio(&self) -> PhysioState {
        self.physio
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    /// Uniform in [0, 1)
    pub fn rand(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform in [lo, hi)
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.rand()
    }

    /// Uniform integer in [0, n)
    pub fn roll(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n.max(1))
    }

    /// Uniform in [-0.5, 0.5)
    fn centered(&mut self) -> f32 {
        self.rand() - 0.5
    }

    pub fn influence(&self, point: Vec2, reach: f32) -> f32 {
        self.pointer.influence(point, reach)
    }

    /// Pull `point` toward the pointer once its influence passes `threshold`
    pub fn pull(&self, point: Vec2, reach: f32, threshold: f32, strength: f32) -> Vec2 {
        let mi = self.influence(point, reach);
        if mi > threshold {
            self.pointer.attract(point, mi, strength, self.cap)
        } else {
            point
        }
    }

    /// Jittered straight stroke with stipple texture on thick lines
    pub fn stroke(&mut self, p1: Vec2, p2: Vec2, width: f32, rgb: Rgb, part: Part) {
        let mid = (p1 + p2) * 0.5;
        let mi = self.influence(mid, reach::STROKE);
        let pulse = 1.0 + self.physio.energy * 0.6 + mi * 0.5;
        let scatter = self.physio.stress * 2.0 + mi * 4.0;

        let end = if mi > 0.2 {
            p2 + (self.pointer.position - mid) * (mi * 0.15).min(self.cap)
        } else {
            p2
        };

        let steps = (p1.distance(p2) * 1.2).max(12.0) as usize;
        let mut points = Vec::with_capacity(steps + 1);
        points.push(p1);
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            let spread = scatter * (1.0 - t * 0.4);
            let jitter = Vec2::new(self.centered() * spread, self.centered() * spread);
            points.push(p1.lerp(end, t) + jitter);
        }

        self.scene.push(
            Shape::Polyline {
                points,
                width: width * pulse,
            },
            Paint::new(rgb, 0.75 + mi * 0.25),
            part,
        );

        if width > 2.0 {
            let dot = Paint::new(rgb, 0.4 + mi * 0.3);
            for i in (0..=steps).step_by(3) {
                let t = i as f32 / steps as f32;
                self.scene.push(
                    Shape::Disc {
                        center: p1.lerp(end, t),
                        radius: width * 0.3,
                    },
                    dot,
                    part,
                );
            }
        }
    }

    /// Jittered quadratic curve; the control point leans toward the pointer
    pub fn curve(&mut self, p1: Vec2, ctrl: Vec2, p2: Vec2, width: f32, rgb: Rgb, part: Part) {
        let mi = self.influence(ctrl, reach::STROKE);
        let pulse = 1.0 + self.physio.energy * 0.6 + mi * 0.5;
        let scatter = self.physio.stress * 1.5 + mi * 3.0;
        let ctrl = if mi > 0.2 {
            self.pointer.attract(ctrl, mi, 0.2, self.cap)
        } else {
            ctrl
        };

        let steps = (p1.distance(p2) * 1.5).max(60.0) as usize;
        let mut points = Vec::with_capacity(steps + 1);
        points.push(p1);
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            let spread = scatter * (1.0 - t * 0.3);
            let jitter = Vec2::new(self.centered() * spread, self.centered() * spread);
            points.push(quad(p1, ctrl, p2, t) + jitter);
        }

        self.scene.push(
            Shape::Polyline {
                points,
                width: width * pulse,
            },
            Paint::new(rgb, 0.75 + mi * 0.25),
            part,
        );

        if width > 2.0 {
            let dot = Paint::new(rgb, 0.4 + mi * 0.3);
            for i in (0..=steps).step_by(4) {
                let t = i as f32 / steps as f32;
                self.scene.push(
                    Shape::Disc {
                        center: quad(p1, ctrl, p2, t),
                        radius: width * 0.3,
                    },
                    dot,
                    part,
                );
            }
        }
    }

    /// Cellular cluster: scattered discs inside `radius`
    pub fn cluster(&mut self, center: Vec2, radius: f32, rgb: Rgb, part: Part) {
        let radius = radius.max(0.0);
        let cells = 8 + (radius * 1.5) as usize;
        let mi = self.influence(center, reach::NODE);
        let pulse = 1.0 + self.physio.energy * 0.4 + mi * 0.6;
        let center = self.pull(center, reach::NODE, 0.2, 0.15);
        let drift = Vec2::new(self.wind.sin() * 3.0, 0.0);

        for _ in 0..cells {
            let r = radius * self.rand().sqrt() * pulse;
            let theta = self.rand() * TAU;
            let base = center + Vec2::new(theta.cos(), theta.sin()) * r;
            let cell_mi = self.pointer.influence(base, 100.0);
            let wobble = Vec2::new(self.centered(), self.centered()) * (mi * 15.0)
                + Vec2::new(self.centered(), self.centered()) * (cell_mi * 8.0);
            let at = base + drift + wobble;
            let size = (self.rand() * 2.8 + 1.2) * pulse * (1.0 + cell_mi * 0.3);
            let alpha = (0.5 + self.rand() * 0.3) * (1.0 + mi * 0.4);

            self.scene.push(
                Shape::Disc {
                    center: at,
                    radius: size,
                },
                Paint::new(rgb, alpha),
                part,
            );
            if size > 2.0 {
                self.scene.push(
                    Shape::Disc {
                        center: at,
                        radius: size * 1.3,
                    },
                    Paint::new(rgb, 0.2 + mi * 0.2),
                    part,
                );
            }
        }
    }

    /// Radial node: textured body disc with an outline
    pub fn node(&mut self, center: Vec2, radius: f32, fill: Rgb, stroke: Rgb, part: Part) {
        self.textured_node(center, radius, fill, stroke, part, NodeStyle::Radial);
    }

    /// Crystal node: more opaque, sparser texture, heavier outline
    pub fn crystal(&mut self, center: Vec2, radius: f32, fill: Rgb, stroke: Rgb, part: Part) {
        self.textured_node(center, radius, fill, stroke, part, NodeStyle::Crystal);
    }

    fn textured_node(
        &mut self,
        center: Vec2,
        radius: f32,
        fill: Rgb,
        stroke: Rgb,
        part: Part,
        style: NodeStyle,
    ) {
        let mi = self.influence(center, reach::NODE);
        let radius = radius.max(0.0) * (1.0 + mi * 0.5);
        let offset = if mi > 0.3 {
            self.pointer.attract(center, mi, 0.2, self.cap) - center
        } else {
            Vec2::new(self.centered(), self.centered()) * (mi * 5.0)
        };
        let at = center + offset;

        let (body_alpha, texture_per_px, texture_alpha, outline_scale, outline_alpha) = match style
        {
            NodeStyle::Radial => (0.55, 2.0, 0.3, 1.0, 0.75),
            NodeStyle::Crystal => (0.75, 1.0, 0.5, 1.5, 0.95),
        };

        self.scene.push(
            Shape::Disc { center: at, radius },
            Paint::new(fill, body_alpha + mi * 0.35),
            part,
        );

        let texture = Paint::new(fill, texture_alpha + mi * 0.3);
        for _ in 0..(radius * texture_per_px) as usize {
            let r = radius * self.rand().sqrt() * 0.7;
            let theta = self.rand() * TAU;
            self.scene.push(
                Shape::Disc {
                    center: at + Vec2::new(theta.cos(), theta.sin()) * r,
                    radius: 1.5,
                },
                texture,
                part,
            );
        }

        self.scene.push(
            Shape::Outline {
                center: at,
                radius,
                width: (1.5 + mi * 0.5) * outline_scale,
            },
            Paint::new(stroke, outline_alpha + mi * 0.25),
            part,
        );
    }

    /// Ring of `count` small nodes orbiting `center`
    pub fn satellites(
        &mut self,
        center: Vec2,
        count: usize,
        orbit: f32,
        radius: f32,
        fill: Rgb,
        stroke: Rgb,
    ) {
        for i in 0..count {
            let angle = TAU * i as f32 / count as f32;
            let at = center + Vec2::new(angle.cos(), angle.sin()) * orbit;
            self.node(at, radius, fill, stroke, Part::Satellite);
        }
    }

    /// Description words placed along a path, shrinking and fading with distance
    pub fn word_stem(&mut self, p1: Vec2, p2: Vec2, rgb: Rgb) {
        let delta = p2 - p1;
        let length = delta.length();
        if length < 1.0 || self.words.is_empty() {
            return;
        }
        let angle = delta.y.atan2(delta.x);
        let step = (length / self.words.len().max(6) as f32).max(24.0);
        let pulse = 1.0 + self.physio.energy * 0.5;

        let mut dist = 0.0;
        let mut idx = 0;
        while dist <= length {
            let t = dist / length;
            self.scene.push(
                Shape::Glyph {
                    origin: p1 + delta * t,
                    text: self.words[idx % self.words.len()].clone(),
                    size: 10.0 + (1.0 - t) * 12.0 * pulse,
                    angle,
                },
                Paint::new(rgb, 0.8 - t * 0.4),
                Part::Glyph,
            );
            dist += step;
            idx += 1;
        }
    }

    /// Single leaf drawn according to the descriptor's leaf shape
    pub fn leaf(&mut self, at: Vec2, size: f32, angle: f32, shape: LeafShape, fill: Rgb, stem: Rgb) {
        let dir = Vec2::new(angle.sin(), -angle.cos());
        match shape {
            LeafShape::Round => self.node(at + dir * size * 0.5, size, fill, stem, Part::Leaf),
            LeafShape::Needle => {
                let tip = at + dir * size * 2.0;
                self.stroke(at, tip, (size * 0.25).max(0.8), fill, Part::Leaf);
            }
            LeafShape::Fern => {
                for i in 1..=3 {
                    let t = i as f32 / 3.0;
                    self.node(at + dir * size * 1.5 * t, size * (1.1 - t * 0.5), fill, stem, Part::Leaf);
                }
            }
            LeafShape::Heart => {
                let side = Vec2::new(-dir.y, dir.x) * size * 0.45;
                let lobe = at + dir * size * 0.8;
                self.node(lobe + side, size * 0.6, fill, stem, Part::Leaf);
                self.node(lobe - side, size * 0.6, fill, stem, Part::Leaf);
            }
            LeafShape::Crystal => {
                self.crystal(at + dir * size * 0.6, size * 0.8, fill, stem, Part::Leaf)
            }
            LeafShape::Abstract => self.cluster(at + dir * size * 0.5, size, fill, Part::Leaf),
        }
    }

    /// Free text, horizontally centered on `at`
    pub fn label(&mut self, at: Vec2, text: &str, size: f32, rgb: Rgb, alpha: f32, part: Part) {
        let width = text.chars().count() as f32 * size * 0.6;
        self.scene.push(
            Shape::Glyph {
                origin: at - Vec2::new(width / 2.0, 0.0),
                text: text.to_string(),
                size,
                angle: 0.0,
            },
            Paint::new(rgb, alpha),
            part,
        );
    }
}

#[derive(Clone, Copy)]
enum NodeStyle {
    Radial,
    Crystal,
}

/// Quadratic Bezier point
pub fn quad(p1: Vec2, ctrl: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p1 * (u * u) + ctrl * (2.0 * u * t) + p2 * (t * t)
}
