//! Data blossom: glyph spokes, node rings, a word halo and satellite clusters.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, TAU};

use super::Stage;
use crate::render::brush::Brush;
use crate::render::scene::{Paint, Part, Shape};

const MIN_SPOKES: usize = 20;
const MAX_HALO_WORDS: usize = 48;
const SATELLITE_CLUSTERS: usize = 6;
const SATELLITES_PER_CLUSTER: usize = 5;

pub fn draw<R: Rng + ?Sized>(brush: &mut Brush<'_, R>, stage: &Stage) {
    let d = stage.descriptor;
    let palette = d.palette;
    let (stem, node, accent) = (palette.stem(), palette.primary(), palette.accent());
    let c = stage.center;
    let time = stage.clock.time;
    let energy = brush.physio().energy;
    let stress = brush.physio().stress;

    let progress = stage.progress().max(0.18);
    let base_radius = stage.size.x.min(stage.size.y) * 0.42 * progress + 100.0;
    let spokes = MIN_SPOKES.max((d.branching_factor * 7.0).floor() as usize);
    let ring_nodes = 5 + (progress * 12.0).floor() as usize;

    for i in 0..spokes {
        let fi = i as f32;
        let angle = TAU * fi / spokes as f32;
        let sway = (time * 0.8 + fi).sin() * (d.angle_variance * 0.01 + stress * 0.2);
        let ray = base_radius * (0.8 + (time + fi).sin() * 0.12);
        let end = c + Vec2::new((angle + sway).cos(), (angle + sway).sin()) * ray;

        brush.word_stem(c, end, stem);
        hairline(brush, c, end, 0.8, Paint::new(stem, 0.25), Part::Spoke);

        for n in 1..=ring_nodes {
            let t = n as f32 / (ring_nodes + 1) as f32;
            let radius = 4.0 + t * 10.0 + energy * 6.0;
            brush.node(c.lerp(end, t), radius, node, accent, Part::Node);
        }
        brush.node(end, 10.0 + stage.growth * 0.2, accent, stem, Part::Node);
    }
    brush.node(c, 18.0 + stage.growth * 0.2, accent, stem, Part::Node);

    // Word halo
    let words: Vec<String> = d.tokens().into_iter().take(MAX_HALO_WORDS).collect();
    let halo = base_radius * 0.6;
    for (i, word) in words.iter().enumerate() {
        let angle = TAU * i as f32 / words.len() as f32 + time * 0.05;
        brush.scene.push(
            Shape::Glyph {
                origin: c + Vec2::new(angle.cos(), angle.sin()) * halo,
                text: word.clone(),
                size: 10.0,
                angle: angle + FRAC_PI_2,
            },
            Paint::new(stem, 0.67),
            Part::Glyph,
        );
    }

    for i in 0..SATELLITE_CLUSTERS {
        let fi = i as f32;
        let angle = TAU * fi / SATELLITE_CLUSTERS as f32 + time * 0.1;
        let dist = base_radius * 1.15 + (time + fi).sin() * 20.0;
        let hub = c + Vec2::new(angle.cos(), angle.sin()) * dist;
        brush.node(hub, 12.0 + energy * 8.0, node, accent, Part::Node);
        hairline(brush, c, hub, 0.5, Paint::new(stem, 0.31), Part::Spoke);

        for s in 0..SATELLITES_PER_CLUSTER {
            let theta = angle + TAU * s as f32 / SATELLITES_PER_CLUSTER as f32;
            let at = hub + Vec2::new(theta.cos(), theta.sin()) * (30.0 + s as f32 * 8.0);
            brush.node(at, 4.0 + s as f32 * 2.0, accent, stem, Part::Satellite);
            hairline(brush, hub, at, 0.5, Paint::new(accent, 0.38), Part::Satellite);
        }
    }

    let st = &mut brush.scene.structure;
    st.segments += spokes;
    st.rings += ring_nodes;
    st.nodes += spokes * (ring_nodes + 1) + 1 + SATELLITE_CLUSTERS;
    st.depth = 2;
    st.height = base_radius;
}

/// Untextured straight line
fn hairline<R: Rng + ?Sized>(
    brush: &mut Brush<'_, R>,
    from: Vec2,
    to: Vec2,
    width: f32,
    paint: Paint,
    part: Part,
) {
    brush.scene.push(
        Shape::Polyline {
            points: vec![from, to],
            width,
        },
        paint,
        part,
    );
}
