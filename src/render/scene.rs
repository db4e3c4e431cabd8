//! Scene: the ordered list of drawing primitives for one tick.

use glam::Vec2;

use crate::descriptor::Rgb;

/// Structural role of a primitive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Part {
    Seed,
    Trunk,
    Branch,
    Stem,
    Vine,
    Chain,
    Spoke,
    Node,
    Leaf,
    Satellite,
    Glyph,
    Label,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    pub rgb: Rgb,
    /// 0..1
    pub alpha: f32,
}

impl Paint {
    pub fn new(rgb: Rgb, alpha: f32) -> Self {
        Self {
            rgb,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Connected stroke through the points
    Polyline { points: Vec<Vec2>, width: f32 },
    /// Filled circle
    Disc { center: Vec2, radius: f32 },
    /// Circle outline
    Outline {
        center: Vec2,
        radius: f32,
        width: f32,
    },
    /// Text whose baseline starts at `origin`, rotated by `angle` radians
    Glyph {
        origin: Vec2,
        text: String,
        size: f32,
        angle: f32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    pub shape: Shape,
    pub paint: Paint,
    pub part: Part,
}

/// Counts describing how much of the target structure is unrolled
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Structure {
    /// Deepest recursion level drawn
    pub depth: u32,
    /// Branch, stem, chain or spoke segments
    pub segments: usize,
    /// Concentric rings
    pub rings: usize,
    /// Structural nodes (decorative satellites excluded)
    pub nodes: usize,
    /// Main extent in pixels (trunk height, frond height, radius)
    pub height: f32,
}

impl Structure {
    /// Scalar complexity used to compare growth stages
    pub fn complexity(&self) -> usize {
        self.segments + self.rings + self.nodes + self.depth as usize
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub primitives: Vec<Primitive>,
    pub structure: Structure,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn push(&mut self, shape: Shape, paint: Paint, part: Part) {
        self.primitives.push(Primitive { shape, paint, part });
    }

    pub fn count(&self, part: Part) -> usize {
        self.primitives.iter().filter(|p| p.part == part).count()
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(|p| match &p.shape {
            Shape::Glyph { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn is_seed_only(&self) -> bool {
        !self.primitives.is_empty() && self.primitives.iter().all(|p| p.part == Part::Seed)
    }
}
