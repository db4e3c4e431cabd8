//! Growth topologies. Each strategy unrolls a fraction of its target
//! structure proportional to growth and records what it drew in the
//! scene's [`Structure`](super::Structure).

mod bloom;
mod frond;
mod radial;
mod tree;
mod vine;
mod willow;

use glam::Vec2;
use rand::Rng;

use super::brush::Brush;
use super::clock::Clock;
use crate::descriptor::{GeneticDescriptor, LeafArrangement, Topology};

/// Per-frame layout shared by the strategies
pub struct Stage<'a> {
    pub descriptor: &'a GeneticDescriptor,
    /// 0..=100
    pub growth: f32,
    pub clock: Clock,
    pub center: Vec2,
    /// Ground line y for rooted forms
    pub baseline: f32,
    pub size: Vec2,
    pub max_depth: u32,
}

impl Stage<'_> {
    /// Growth as a 0..1 fraction
    pub fn progress(&self) -> f32 {
        (self.growth / 100.0).clamp(0.0, 1.0)
    }
}

pub fn draw<R: Rng + ?Sized>(brush: &mut Brush<'_, R>, stage: &Stage) {
    match stage.descriptor.topology {
        Topology::FractalTree => tree::draw(brush, stage, false),
        Topology::AlienShrub => tree::draw(brush, stage, true),
        Topology::OrganicVine => vine::draw(brush, stage),
        Topology::RadialSucculent => radial::draw(brush, stage, false),
        Topology::CrystalCactus => radial::draw(brush, stage, true),
        Topology::FernFrond => frond::draw(brush, stage),
        Topology::WeepingWillow => willow::draw(brush, stage),
        Topology::DataBlossom => bloom::draw(brush, stage),
    }
}

/// Leaves per attachment point
fn leaf_count(arrangement: LeafArrangement, base: usize) -> usize {
    match arrangement {
        LeafArrangement::Alternate => base,
        LeafArrangement::Opposite => base + 1,
        LeafArrangement::Whorled => base + 2,
    }
}

/// Shortest signed difference between two angles (radians)
fn angle_delta(from: f32, to: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (to - from + PI).rem_euclid(TAU) - PI
}

/// Heading convention: 0 points up, angles grow clockwise
fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.sin(), -angle.cos())
}
