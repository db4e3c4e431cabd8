//! Weeping willow: curved trunk, arched canopy branches, hanging chains.

use glam::Vec2;
use rand::Rng;

use super::Stage;
use crate::render::brush::Brush;
use crate::render::pointer::reach;
use crate::render::scene::Part;

const TRUNK_HEIGHT: f32 = 180.0;
const CANOPY_BRANCHES: usize = 15;
const CHAIN_SEGMENTS: f32 = 24.0;
/// Full chain length at maximum growth
const CHAIN_DROP: f32 = 280.0;
const CHAIN_NODE_EVERY: usize = 4;

pub fn draw<R: Rng + ?Sized>(brush: &mut Brush<'_, R>, stage: &Stage) {
    let palette = stage.descriptor.palette;
    let g = stage.progress();
    let h = TRUNK_HEIGHT * g;
    if h <= 0.0 {
        return;
    }

    let root = Vec2::new(stage.center.x, stage.baseline);
    let top = root - Vec2::new(0.0, h);

    let trunk_mi = brush.influence(root - Vec2::new(0.0, h / 2.0), reach::VINE);
    let lean = trunk_mi * 15.0 * brush.range(-0.5, 0.5);
    let ctrl = root + Vec2::new(20.0 + lean, -h / 2.0);
    brush.curve(root, ctrl, top, 12.0, palette.stem(), Part::Trunk);
    brush.word_stem(root, top, palette.stem());
    let crown = brush.range(10.0, 12.0);
    brush.node(top, crown, palette.primary(), palette.stem(), Part::Node);

    let chain_segments = (CHAIN_SEGMENTS * g).floor() as usize;
    let seg_drop = CHAIN_DROP / CHAIN_SEGMENTS;

    {
        let s = &mut brush.scene.structure;
        s.segments += 1;
        s.nodes += 1;
        s.depth = 1;
        s.height = h;
    }

    for _ in 0..CANOPY_BRANCHES {
        let tip = top + Vec2::new(brush.range(-90.0, 90.0), brush.range(-25.0, 25.0));
        let branch_mi = brush.influence(tip, reach::CANOPY);
        let nudge = Vec2::new(brush.range(-0.5, 0.5), brush.range(-0.5, 0.5)) * branch_mi * 10.0;
        let ctrl = top + Vec2::new(0.0, -20.0) + nudge;
        brush.curve(top, ctrl, tip, 2.5, palette.stem(), Part::Branch);
        let radius = brush.range(6.0, 8.0);
        brush.node(tip, radius, palette.primary(), palette.stem(), Part::Node);

        let mut at = tip;
        let mut chain_nodes = 0;
        for s in 0..chain_segments {
            let mi = brush.influence(at, reach::CHAIN);
            let phase = s as f32 + stage.clock.time * 4.0 + brush.physio().stress * 15.0;
            let wave = phase.sin() * 5.0 + mi * 8.0;
            let next = at + Vec2::new(wave, seg_drop);
            brush.stroke(at, next, 1.2, palette.primary(), Part::Chain);

            if s > 0 && s % CHAIN_NODE_EVERY == 0 {
                let radius = (5.0 - s as f32 / CHAIN_SEGMENTS * 3.0).max(2.0);
                brush.node(next, radius, palette.primary(), palette.stem(), Part::Node);
                chain_nodes += 1;
            }
            at = next;
        }

        let st = &mut brush.scene.structure;
        st.segments += 1 + chain_segments;
        st.nodes += 1 + chain_nodes;
        if chain_segments > 0 {
            st.depth = 2;
        }
    }
}
