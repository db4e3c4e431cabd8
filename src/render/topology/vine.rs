//! Hanging vines: iterative path-walks with pointer-attracted heading drift.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::{PI, TAU};

use super::{angle_delta, heading, leaf_count, Stage};
use crate::render::brush::Brush;
use crate::render::pointer::reach;
use crate::render::scene::Part;

const MAX_SEGMENTS: f32 = 70.0;
const SEGMENT_LENGTH: f32 = 10.0;
const NODE_EVERY: usize = 6;
const WORD_EVERY: usize = 12;
const LEAF_EVERY: usize = 4;

struct VineShape {
    offset_x: f32,
    /// Radians, PI hangs straight down
    angle: f32,
    bias: f32,
    length: f32,
    spread: f32,
}

const fn shape(offset_x: f32, angle: f32, bias: f32, length: f32, spread: f32) -> VineShape {
    VineShape {
        offset_x,
        angle,
        bias,
        length,
        spread,
    }
}

/// Center first, then alternating outward
const VINES: [VineShape; 9] = [
    shape(0.0, PI, 0.0, 1.5, 1.8),
    shape(-180.0, PI - PI / 8.0, -2.0, 1.3, 2.2),
    shape(200.0, PI + PI / 7.0, 2.5, 1.2, 2.5),
    shape(-320.0, PI - PI / 6.0, -2.5, 1.1, 2.0),
    shape(350.0, PI + PI / 6.0, 3.0, 1.0, 2.3),
    shape(-100.0, PI - PI / 12.0, -1.0, 0.9, 1.6),
    shape(120.0, PI + PI / 10.0, 1.5, 0.85, 1.7),
    shape(-450.0, PI - PI / 5.0, -3.0, 0.8, 1.9),
    shape(480.0, PI + PI / 5.0, 3.5, 0.75, 2.1),
];

pub fn draw<R: Rng + ?Sized>(brush: &mut Brush<'_, R>, stage: &Stage) {
    let g = stage.progress();
    let top = stage.size.y * 0.15;
    let count = ((g * 12.0).floor() as usize).min(VINES.len());

    for (i, vine) in VINES.iter().take(count).enumerate() {
        // Later vines sprout later and stay shorter
        let age = (g - i as f32 / 12.0).max(0.0);
        let age_factor = (age * 1.5).min(1.0);
        if age_factor > 0.0 {
            let start = Vec2::new(stage.center.x + vine.offset_x, top);
            walk(brush, stage, vine, start, age_factor);
        }
    }
}

fn walk<R: Rng + ?Sized>(
    brush: &mut Brush<'_, R>,
    stage: &Stage,
    vine: &VineShape,
    start: Vec2,
    age_factor: f32,
) {
    let d = stage.descriptor;
    let palette = d.palette;
    let wind = stage.clock.wind;
    let total = MAX_SEGMENTS * stage.progress() * age_factor;
    let segments = total.ceil() as usize;
    let seg_len = SEGMENT_LENGTH * vine.length;

    let mut at = start;
    let mut angle = vine.angle;

    for i in 0..segments {
        let mi = brush.influence(at, reach::VINE);
        let sway = (i as f32 * 0.3 + wind).sin() * 8.0 * vine.spread + mi * 8.0;
        let curl = (i as f32 * 0.1).cos() * (d.angle_variance / 5.0) + vine.bias * 0.05;

        if mi > 0.1 {
            let toward = brush.pointer().position - at;
            let target = toward.x.atan2(-toward.y);
            angle += angle_delta(angle, target) * mi * 0.1;
        }
        angle += (curl + sway * 0.1) * 0.1;

        let next = at + heading(angle) * seg_len;
        let ctrl = (at + next) * 0.5 + Vec2::new(sway, 0.0);
        let width = (5.0 - i as f32 * 0.08).max(1.5);
        brush.curve(at, ctrl, next, width, palette.stem(), Part::Vine);
        brush.scene.structure.segments += 1;

        if i > 0 && i % NODE_EVERY == 0 {
            let radius = 4.0 + (i as f32 / total) * 6.0;
            let fill = if (i / NODE_EVERY) % 2 == 0 {
                palette.primary()
            } else {
                palette.accent()
            };
            brush.node(next, radius, fill, palette.stem(), Part::Node);
            brush.scene.structure.nodes += 1;
        }

        if i > 0 && i % WORD_EVERY == 0 && (i as f32) < total / 2.0 {
            brush.word_stem(start, next, palette.stem());
        }

        if i % LEAF_EVERY == 0 {
            let leaves = leaf_count(d.leaf_arrangement, 2);
            let base = stage.clock.time + i as f32;
            for l in 0..leaves {
                let around = base + TAU * l as f32 / leaves as f32;
                let pos = next + Vec2::new(around.cos(), around.sin()) * 8.0;
                let size = brush.range(2.0, 3.0);
                brush.leaf(pos, size, around, d.leaf_shape, palette.primary(), palette.stem());
            }
        }

        let s = &mut brush.scene.structure;
        s.height = s.height.max(next.y - start.y);
        at = next;
    }
    if segments > 0 {
        brush.scene.structure.depth = brush.scene.structure.depth.max(1);
    }
}
