//! Fern fronds: a segmented main stem with side branches and leaflets.

use glam::Vec2;
use rand::Rng;

use super::Stage;
use crate::descriptor::LeafArrangement;
use crate::render::brush::Brush;
use crate::render::scene::Part;

const FROND_HEIGHT: f32 = 200.0;
const FROND_SEGMENTS: f32 = 20.0;
const SIDE_OFFSET: f32 = 80.0;
const SIDE_SCALE: f32 = 0.75;

pub fn draw<R: Rng + ?Sized>(brush: &mut Brush<'_, R>, stage: &Stage) {
    let base = Vec2::new(stage.center.x, stage.baseline);
    frond(brush, stage, base, FROND_HEIGHT, FROND_SEGMENTS);
    for dx in [-SIDE_OFFSET, SIDE_OFFSET] {
        frond(
            brush,
            stage,
            base + Vec2::new(dx, 0.0),
            FROND_HEIGHT * SIDE_SCALE,
            FROND_SEGMENTS * SIDE_SCALE,
        );
    }
}

fn frond<R: Rng + ?Sized>(
    brush: &mut Brush<'_, R>,
    stage: &Stage,
    base: Vec2,
    height: f32,
    max_segments: f32,
) {
    let d = stage.descriptor;
    let palette = d.palette;
    let segments = (max_segments * stage.progress()).floor() as usize;
    let seg_h = height / max_segments;

    let mut at = base;
    let mut flip = false;
    for i in 0..segments {
        let next = at - Vec2::new(0.0, seg_h);
        brush.stroke(at, next, 4.0, palette.stem(), Part::Stem);
        brush.scene.structure.segments += 1;

        if i > 0 && i % 2 == 0 {
            let radius = brush.range(6.0, 8.0);
            brush.node(at, radius, palette.primary(), palette.stem(), Part::Node);
            brush.scene.structure.nodes += 1;

            let length = seg_h * brush.range(3.0, 5.0);
            let lean = brush.range(35.0, 45.0).to_radians();
            let sides: &[f32] = match d.leaf_arrangement {
                LeafArrangement::Alternate => {
                    flip = !flip;
                    if flip {
                        &[-1.0]
                    } else {
                        &[1.0]
                    }
                }
                LeafArrangement::Opposite | LeafArrangement::Whorled => &[-1.0, 1.0],
            };
            for &side in sides {
                side_branch(brush, stage, at, side, lean, length);
            }
            if d.leaf_arrangement == LeafArrangement::Whorled {
                let size = brush.range(1.5, 2.5);
                brush.leaf(at, size, 0.0, d.leaf_shape, palette.accent(), palette.stem());
            }
            brush.scene.structure.depth = brush.scene.structure.depth.max(2);
        }
        at = next;
    }

    if segments > 0 {
        brush.word_stem(base, at, palette.stem());
        let s = &mut brush.scene.structure;
        s.depth = s.depth.max(1);
        s.height = s.height.max(base.y - at.y);
    }
}

fn side_branch<R: Rng + ?Sized>(
    brush: &mut Brush<'_, R>,
    stage: &Stage,
    from: Vec2,
    side: f32,
    lean: f32,
    length: f32,
) {
    let d = stage.descriptor;
    let palette = d.palette;
    let dir = Vec2::new(side * lean.cos(), -lean.sin());
    let tip = from + dir * length;

    brush.stroke(from, tip, 2.5, palette.stem(), Part::Branch);
    brush.scene.structure.segments += 1;
    let radius = brush.range(3.0, 5.0);
    brush.node(tip, radius, palette.primary(), palette.stem(), Part::Node);
    brush.scene.structure.nodes += 1;

    let leaflets = 2 + brush.roll(2);
    let angle = dir.x.atan2(-dir.y);
    for l in 1..=leaflets {
        let t = l as f32 / (leaflets + 1) as f32;
        let size = brush.range(1.5, 2.5);
        brush.leaf(
            from + dir * length * t,
            size,
            angle,
            d.leaf_shape,
            palette.accent(),
            palette.stem(),
        );
    }
}
