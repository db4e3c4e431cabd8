//! Recursive binary branching (fractal tree and alien shrub).

use glam::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, TAU};

use super::{angle_delta, heading, leaf_count, Stage};
use crate::render::brush::Brush;
use crate::render::pointer::reach;
use crate::render::scene::Part;

const ROOT_LENGTH: f32 = 120.0;
const ROOT_WIDTH: f32 = 14.0;

struct Branch {
    from: Vec2,
    len: f32,
    /// Degrees, 0 = up
    angle: f32,
    depth: u32,
    width: f32,
}

pub fn draw<R: Rng + ?Sized>(brush: &mut Brush<'_, R>, stage: &Stage, shrub: bool) {
    let root = Branch {
        from: Vec2::new(stage.center.x, stage.baseline),
        len: ROOT_LENGTH,
        angle: 0.0,
        depth: 1,
        width: ROOT_WIDTH,
    };
    grow(brush, stage, shrub, root);
}

fn grow<R: Rng + ?Sized>(brush: &mut Brush<'_, R>, stage: &Stage, shrub: bool, b: Branch) {
    let d = stage.descriptor;
    let palette = d.palette;
    let max_depth = stage.max_depth;
    let pointer = brush.pointer();
    let mi = brush.influence(b.from, reach::BRANCH);

    let mut to = b.from + heading(b.angle.to_radians()) * b.len;
    if shrub {
        to += Vec2::new(brush.range(-7.5, 7.5), brush.range(-7.5, 7.5));
    }
    if mi > 0.1 {
        // Bend toward the pointer, at most 15% of the angular gap
        let toward = pointer.position - b.from;
        let target = toward.x.atan2(-toward.y);
        let base = b.angle.to_radians();
        let bent = base + angle_delta(base, target) * mi * 0.15;
        to = b.from + heading(bent) * b.len;
    }

    let part = if b.depth == 1 { Part::Trunk } else { Part::Branch };
    brush.stroke(b.from, to, b.width * (0.8 + mi * 0.2), palette.stem(), part);

    let s = &mut brush.scene.structure;
    s.segments += 1;
    s.depth = s.depth.max(b.depth);
    s.height = s.height.max(stage.baseline - to.y);

    if shrub {
        if b.depth > 1 {
            let radius = brush.range(4.0, 10.0);
            let fill = if b.depth % 2 == 0 {
                palette.primary()
            } else {
                palette.accent()
            };
            brush.node(to, radius, fill, palette.stem(), Part::Node);
            brush.scene.structure.nodes += 1;

            let layers = 2 + brush.roll(3);
            for layer in 0..layers {
                let count = 3 + brush.roll(4);
                let orbit = radius + 10.0 + layer as f32 * 12.0;
                let size = brush.range(2.0, 4.0);
                brush.satellites(to, count, orbit, size, palette.accent(), palette.stem());
            }
        }
        if (2..=3).contains(&b.depth) {
            let skew = (b.angle + brush.range(-15.0, 15.0)).to_radians();
            brush.word_stem(b.from, b.from + heading(skew) * b.len, palette.stem());
        }
    } else {
        let radius = (max_depth.saturating_sub(b.depth) * 3 + 5) as f32;
        brush.node(b.from, radius, palette.primary(), palette.stem(), Part::Node);
        brush.scene.structure.nodes += 1;
        if b.depth <= 2 {
            brush.word_stem(b.from, to, palette.stem());
        }
    }

    if b.depth > 2 && (b.depth % 2 == 0 || b.depth == max_depth) {
        let leaf_size = (10.0 - b.depth as f32).max(2.0);
        if shrub {
            let leaf_angle = b.angle.to_radians() + brush.range(-0.4, 0.4);
            let tip = to + heading(leaf_angle) * leaf_size * 1.5;
            brush.stroke(to, tip, b.width / 3.0, palette.primary(), Part::Leaf);
            if leaf_size > 3.0 {
                brush.leaf(
                    tip,
                    leaf_size * 0.5,
                    leaf_angle,
                    d.leaf_shape,
                    palette.primary(),
                    palette.stem(),
                );
            }
        } else {
            // Small leaf cluster around the branch tip
            let count = leaf_count(d.leaf_arrangement, 3);
            for i in 0..count {
                let around = TAU * i as f32 / count as f32 + brush.range(0.0, 0.5);
                let dist = leaf_size * 1.2 * brush.range(0.5, 1.0);
                let at = to + Vec2::new(around.cos(), around.sin()) * dist;
                let size = brush.range(2.0, 4.0);
                brush.leaf(
                    at,
                    size,
                    around + FRAC_PI_2,
                    d.leaf_shape,
                    palette.primary(),
                    palette.stem(),
                );
            }
        }
    }

    if b.depth < max_depth && b.len > 5.0 {
        let factor = (stage.growth / (10.0 * b.depth as f32 + 1.0)).min(1.0);
        let cur_len = b.len * factor;
        if cur_len > 2.0 {
            let stress = brush.physio().stress;
            let spread = d.angle_variance + brush.range(-0.5, 0.5) * stress * 30.0;
            let sway = (stage.clock.wind + b.depth as f32).sin() * (4.0 + stress * 8.0);
            let child_mi = brush.influence(to, reach::BRANCH);
            let sway = sway + child_mi * 15.0 * brush.range(-0.5, 0.5);

            for side in [-1.0, 1.0] {
                grow(
                    brush,
                    stage,
                    shrub,
                    Branch {
                        from: to,
                        len: cur_len * 0.8,
                        angle: b.angle + side * spread + sway,
                        depth: b.depth + 1,
                        width: b.width * 0.65,
                    },
                );
            }
        }
    }
}
