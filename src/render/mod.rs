//! Procedural architecture renderer.
//!
//! `render` turns one tick of organism state into a [`Scene`]. Dispatch is
//! purely by topology; every strategy draws through the same [`Brush`] so
//! physiology and pointer modulation look identical across forms.

mod brush;
mod clock;
mod pointer;
mod scene;
mod topology;

pub use brush::{quad, Brush};
pub use clock::{Clock, Weather};
pub use pointer::{reach, PointerState};
pub use scene::{Paint, Part, Primitive, Scene, Shape, Structure};

use glam::Vec2;
use rand::Rng;

use crate::descriptor::{GeneticDescriptor, Rgb};
use crate::growth::Phase;
use crate::params::RenderConfig;
use crate::physiology::PhysioState;
use topology::Stage;

const INK: Rgb = Rgb(0, 0, 0);

/// Everything the renderer reads for one tick
#[derive(Clone, Copy, Debug)]
pub struct RenderInput<'a> {
    pub descriptor: &'a GeneticDescriptor,
    pub phase: Phase,
    /// 0..=100
    pub growth: f32,
    pub physio: PhysioState,
    pub pointer: PointerState,
    pub clock: Clock,
}

pub fn render<R: Rng + ?Sized>(input: &RenderInput, config: &RenderConfig, rng: &mut R) -> Scene {
    let words = input.descriptor.tokens();
    let scene = Scene::new(config.canvas_width, config.canvas_height);
    let mut brush = Brush::new(
        scene,
        input.pointer,
        input.physio,
        input.clock.wind,
        &words,
        config.attraction_cap,
        rng,
    );

    let [cx, cy] = config.center();
    let center = Vec2::new(cx, cy);
    let palette = input.descriptor.palette;

    match input.phase {
        Phase::Dormant => {
            let radius = 20.0 + (input.clock.time * 1.6).sin() * 5.0;
            brush.cluster(center, radius, INK, Part::Seed);
            brush.label(center, "WAITING FOR BIO-SYNTHESIS...", 20.0, INK, 0.25, Part::Label);
        }
        Phase::Seeded => {
            let radius = 30.0 + (input.clock.time * 2.8).sin() * 5.0;
            brush.cluster(center, radius, palette.primary(), Part::Seed);
            let text = format!("READY: {}", input.descriptor.name.to_uppercase());
            brush.label(center + Vec2::new(0.0, 80.0), &text, 16.0, INK, 0.5, Part::Label);
        }
        Phase::Alive if input.growth <= 0.0 => {
            let seed = Vec2::new(cx, config.baseline_y());
            brush.cluster(seed, 12.0, palette.primary(), Part::Seed);
        }
        Phase::Alive => {
            let stage = Stage {
                descriptor: input.descriptor,
                growth: input.growth.min(100.0),
                clock: input.clock,
                center,
                baseline: config.baseline_y(),
                size: Vec2::new(config.canvas_width as f32, config.canvas_height as f32),
                max_depth: config.max_depth,
            };
            topology::draw(&mut brush, &stage);
        }
    }

    brush.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Topology;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn descriptor(topology: Topology) -> GeneticDescriptor {
        GeneticDescriptor {
            topology,
            ..Default::default()
        }
    }

    fn draw(d: &GeneticDescriptor, phase: Phase, growth: f32, seed: u64) -> Scene {
        let input = RenderInput {
            descriptor: d,
            phase,
            growth,
            physio: PhysioState {
                stress: 0.3,
                energy: 0.2,
            },
            pointer: PointerState::default(),
            clock: Clock {
                time: 1.0,
                wind: 0.5,
            },
        };
        let mut rng = StdRng::seed_from_u64(seed);
        render(&input, &RenderConfig::default(), &mut rng)
    }

    #[test]
    fn test_zero_growth_is_seed_only() {
        for t in Topology::ALL {
            let scene = draw(&descriptor(t), Phase::Alive, 0.0, 1);
            assert!(scene.is_seed_only(), "{:?}", t);
            assert_eq!(scene.structure, Structure::default(), "{:?}", t);
        }
    }

    #[test]
    fn test_complexity_monotone_in_growth() {
        for t in Topology::ALL {
            let d = descriptor(t);
            let mut prev = 0;
            for step in 0..=40 {
                let growth = step as f32 * 2.5;
                let c = draw(&d, Phase::Alive, growth, step).structure.complexity();
                assert!(c >= prev, "{:?} shrank at growth {}: {} < {}", t, growth, c, prev);
                prev = c;
            }
            assert!(prev > 0, "{:?}", t);
        }
    }

    #[test]
    fn test_full_growth_is_maximal_and_stable() {
        for t in Topology::ALL {
            let d = descriptor(t);
            let a = draw(&d, Phase::Alive, 100.0, 5).structure;
            let b = draw(&d, Phase::Alive, 100.0, 99).structure;
            assert_eq!(a.segments, b.segments, "{:?}", t);
            assert_eq!(a.nodes, b.nodes, "{:?}", t);
            assert_eq!(a.rings, b.rings, "{:?}", t);
            assert_eq!(a.depth, b.depth, "{:?}", t);
            // Overshoot renders the same target
            let over = draw(&d, Phase::Alive, 250.0, 5).structure;
            assert_eq!(over.complexity(), a.complexity(), "{:?}", t);
        }
    }

    #[test]
    fn test_tree_full_depth() {
        let s = draw(&descriptor(Topology::FractalTree), Phase::Alive, 100.0, 2).structure;
        assert_eq!(s.depth, 7);
        assert_eq!(s.segments, 127);
        assert_eq!(s.nodes, 127);

        let shrub = draw(&descriptor(Topology::AlienShrub), Phase::Alive, 100.0, 2).structure;
        assert_eq!(shrub.segments, 127);
        assert_eq!(shrub.nodes, 126);
    }

    #[test]
    fn test_tree_sapling() {
        // Trunk plus two short children that are too small to branch again
        let s = draw(&descriptor(Topology::FractalTree), Phase::Alive, 1.0, 2).structure;
        assert_eq!(s.segments, 3);
        assert_eq!(s.depth, 2);
    }

    #[test]
    fn test_willow_half_grown() {
        let scene = draw(&descriptor(Topology::WeepingWillow), Phase::Alive, 50.0, 3);
        assert_eq!(scene.count(Part::Chain), 15 * 12);
        assert_eq!(scene.structure.height, 90.0);

        let full = draw(&descriptor(Topology::WeepingWillow), Phase::Alive, 100.0, 3);
        assert_eq!(full.count(Part::Chain), 15 * 24);
        assert_eq!(full.structure.height, 180.0);
    }

    #[test]
    fn test_succulent_rings() {
        let s = draw(&descriptor(Topology::RadialSucculent), Phase::Alive, 100.0, 4).structure;
        assert_eq!(s.rings, 10);
        assert_eq!(s.nodes, (0..10).map(|i| 6 + 3 * i).sum::<usize>());
        let cactus = draw(&descriptor(Topology::CrystalCactus), Phase::Alive, 35.0, 4).structure;
        assert_eq!(cactus.rings, 4);
    }

    #[test]
    fn test_fern_full_height() {
        let s = draw(&descriptor(Topology::FernFrond), Phase::Alive, 100.0, 4).structure;
        assert!((s.height - 200.0).abs() < 1e-3);
        // 20 + 15 + 15 stem segments plus one side branch per even segment
        assert_eq!(s.segments, 50 + 9 + 7 + 7);
    }

    #[test]
    fn test_vine_count_grows() {
        let d = descriptor(Topology::OrganicVine);
        let young = draw(&d, Phase::Alive, 10.0, 4);
        let old = draw(&d, Phase::Alive, 100.0, 4);
        assert!(young.count(Part::Vine) < old.count(Part::Vine));
        assert!(old.structure.nodes > 0);
    }

    #[test]
    fn test_blossom_rings_follow_growth() {
        let d = descriptor(Topology::DataBlossom);
        assert_eq!(draw(&d, Phase::Alive, 100.0, 1).structure.rings, 17);
        assert_eq!(draw(&d, Phase::Alive, 10.0, 1).structure.rings, 7);
        assert_eq!(draw(&d, Phase::Alive, 10.0, 1).structure.segments, 20);
    }

    #[test]
    fn test_growth_never_changes_opacity() {
        let d = descriptor(Topology::FernFrond);
        let alphas = |g: f32| -> Vec<f32> {
            draw(&d, Phase::Alive, g, 8)
                .primitives
                .iter()
                .filter(|p| p.part == Part::Stem && matches!(p.shape, Shape::Polyline { .. }))
                .map(|p| p.paint.alpha)
                .collect()
        };
        let young = alphas(20.0);
        let old = alphas(100.0);
        assert!(!young.is_empty());
        assert!(young.iter().chain(old.iter()).all(|&a| a == 0.75));
    }

    #[test]
    fn test_phase_placeholders() {
        let d = GeneticDescriptor::default();
        let dormant = draw(&d, Phase::Dormant, 0.0, 1);
        assert!(dormant.glyphs().any(|g| g == "WAITING FOR BIO-SYNTHESIS..."));
        assert!(dormant.count(Part::Seed) > 0);

        let seeded = draw(&d, Phase::Seeded, 0.0, 1);
        assert!(seeded.glyphs().any(|g| g == "READY: WILLOW OF WHISPERS"));
        assert_eq!(seeded.structure.complexity(), 0);
    }

    #[test]
    fn test_pointer_pulls_geometry() {
        let d = descriptor(Topology::FernFrond);
        let mut input = RenderInput {
            descriptor: &d,
            phase: Phase::Alive,
            growth: 100.0,
            physio: PhysioState::default(),
            pointer: PointerState::default(),
            clock: Clock::default(),
        };
        let config = RenderConfig::default();
        let first_stem_end = |scene: &Scene| -> Vec2 {
            scene
                .primitives
                .iter()
                .find_map(|p| match (&p.shape, p.part) {
                    (Shape::Polyline { points, .. }, Part::Stem) => points.last().copied(),
                    _ => None,
                })
                .unwrap()
        };

        let calm = render(&input, &config, &mut StdRng::seed_from_u64(1));
        input.pointer = PointerState::at(700.0, 490.0);
        let pulled = render(&input, &config, &mut StdRng::seed_from_u64(1));
        assert!(first_stem_end(&pulled).x > first_stem_end(&calm).x);
    }
}
