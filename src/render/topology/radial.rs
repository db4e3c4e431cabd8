//! Concentric node rings (radial succulent and crystal cactus).

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use super::Stage;
use crate::render::brush::Brush;
use crate::render::scene::Part;

const MAX_RINGS: f32 = 10.0;
const RING_SPACING: f32 = 20.0;

pub fn draw<R: Rng + ?Sized>(brush: &mut Brush<'_, R>, stage: &Stage, crystal: bool) {
    let palette = stage.descriptor.palette;
    let center = stage.center;
    let layers = MAX_RINGS * stage.progress();
    let rings = layers.ceil() as usize;
    let outer = (layers.floor() as usize).checked_sub(1);

    for i in 0..rings {
        let radius = i as f32 * RING_SPACING;
        let count = 6 + i * 3;
        let node_size = (layers - i as f32) * 2.0 + 4.0;
        let fill = if i % 2 == 0 {
            palette.primary()
        } else {
            palette.accent()
        };

        for j in 0..count {
            let mut theta = TAU * j as f32 / count as f32;
            if !crystal {
                theta += stage.clock.wind * 0.1;
            }
            let at = center + Vec2::new(theta.cos(), theta.sin()) * radius;

            if crystal {
                brush.crystal(at, node_size, fill, palette.stem(), Part::Node);
            } else {
                brush.node(at, node_size, fill, palette.stem(), Part::Node);
            }

            if Some(i) == outer {
                if crystal {
                    if j % 3 == 0 {
                        brush.word_stem(center, at, palette.stem());
                    }
                } else {
                    let satellites = 3 + brush.roll(2);
                    let size = brush.range(2.0, 3.0);
                    brush.satellites(
                        at,
                        satellites,
                        node_size + 8.0,
                        size,
                        palette.accent(),
                        palette.stem(),
                    );
                }
            }
        }

        let s = &mut brush.scene.structure;
        s.rings += 1;
        s.nodes += count;
        s.height = radius;
    }
    if rings > 0 {
        brush.scene.structure.depth = 1;
    }
}
