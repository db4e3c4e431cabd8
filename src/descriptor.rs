//! Genetic descriptor: the small record that shapes one organism.
//!
//! Collaborators exchange descriptors in a loosely typed form
//! ([`DescriptorSpec`], plain strings for enums and colors). The engine only
//! ever works with the validated [`GeneticDescriptor`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// Growth topology (selects the render strategy and the voice preset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    FractalTree,
    OrganicVine,
    RadialSucculent,
    FernFrond,
    WeepingWillow,
    AlienShrub,
    CrystalCactus,
    DataBlossom,
}

impl Topology {
    pub const ALL: [Topology; 8] = [
        Topology::FractalTree,
        Topology::OrganicVine,
        Topology::RadialSucculent,
        Topology::FernFrond,
        Topology::WeepingWillow,
        Topology::AlienShrub,
        Topology::CrystalCactus,
        Topology::DataBlossom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topology::FractalTree => "fractal_tree",
            Topology::OrganicVine => "organic_vine",
            Topology::RadialSucculent => "radial_succulent",
            Topology::FernFrond => "fern_frond",
            Topology::WeepingWillow => "weeping_willow",
            Topology::AlienShrub => "alien_shrub",
            Topology::CrystalCactus => "crystal_cactus",
            Topology::DataBlossom => "data_blossom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafShape {
    Fern,
    Round,
    Needle,
    Abstract,
    Heart,
    Crystal,
}

impl LeafShape {
    pub const ALL: [LeafShape; 6] = [
        LeafShape::Fern,
        LeafShape::Round,
        LeafShape::Needle,
        LeafShape::Abstract,
        LeafShape::Heart,
        LeafShape::Crystal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeafShape::Fern => "fern",
            LeafShape::Round => "round",
            LeafShape::Needle => "needle",
            LeafShape::Abstract => "abstract",
            LeafShape::Heart => "heart",
            LeafShape::Crystal => "crystal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafArrangement {
    Alternate,
    Opposite,
    Whorled,
}

impl LeafArrangement {
    pub const ALL: [LeafArrangement; 3] = [
        LeafArrangement::Alternate,
        LeafArrangement::Opposite,
        LeafArrangement::Whorled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeafArrangement::Alternate => "alternate",
            LeafArrangement::Opposite => "opposite",
            LeafArrangement::Whorled => "whorled",
        }
    }
}

/// Mood (selects the musical scale and mood effects)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Happy,
    Melancholic,
    Mysterious,
    Aggressive,
    Calm,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Melancholic,
        Mood::Mysterious,
        Mood::Aggressive,
        Mood::Calm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Melancholic => "melancholic",
            Mood::Mysterious => "mysterious",
            Mood::Aggressive => "aggressive",
            Mood::Calm => "calm",
        }
    }
}

macro_rules! parse_by_name {
    ($ty:ty, $what:literal) => {
        impl FromStr for $ty {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self> {
                let wanted = s.trim().to_ascii_lowercase();
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        EngineError::InvalidDescriptor(format!("unknown {} '{}'", $what, s))
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

parse_by_name!(Topology, "topology");
parse_by_name!(LeafShape, "leaf shape");
parse_by_name!(LeafArrangement, "leaf arrangement");
parse_by_name!(Mood, "mood");

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` or `#rgb`
    pub fn from_hex(s: &str) -> Result<Self> {
        let bad = || EngineError::InvalidDescriptor(format!("bad color '{}'", s));
        let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
        if !hex.is_ascii() {
            return Err(bad());
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| bad());
        match hex.len() {
            6 => Ok(Rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let c = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Rgb(c(0)?, c(1)?, c(2)?))
            }
            _ => Err(bad()),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Ordered stem/primary/accent colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette(pub [Rgb; 3]);

impl Palette {
    pub fn stem(&self) -> Rgb {
        self.0[0]
    }

    pub fn primary(&self) -> Rgb {
        self.0[1]
    }

    pub fn accent(&self) -> Rgb {
        self.0[2]
    }
}

/// Loosely typed descriptor as produced by external collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub topology: String,
    #[serde(default = "default_branching")]
    pub branching_factor: f32,
    #[serde(default = "default_angle_variance")]
    pub angle_variance: f32,
    pub palette: Vec<String>,
    #[serde(default = "default_leaf_shape")]
    pub leaf_shape: String,
    #[serde(default = "default_leaf_arrangement")]
    pub leaf_arrangement: String,
    #[serde(default = "default_growth_speed")]
    pub growth_speed: f32,
    pub mood: String,
    #[serde(default = "default_energy")]
    pub energy: f32,
}

fn default_branching() -> f32 {
    0.8
}
fn default_angle_variance() -> f32 {
    45.0
}
fn default_leaf_shape() -> String {
    "needle".into()
}
fn default_leaf_arrangement() -> String {
    "alternate".into()
}
fn default_growth_speed() -> f32 {
    1.2
}
fn default_energy() -> f32 {
    0.3
}

impl DescriptorSpec {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| EngineError::InvalidDescriptor(e.to_string()))
    }
}

/// Validated genetic descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct GeneticDescriptor {
    pub name: String,
    pub description: String,
    pub topology: Topology,
    pub branching_factor: f32,
    /// Degrees
    pub angle_variance: f32,
    pub palette: Palette,
    pub leaf_shape: LeafShape,
    pub leaf_arrangement: LeafArrangement,
    pub growth_speed: f32,
    pub mood: Mood,
    /// Authored temperament (0..1), distinct from the runtime energy
    pub energy: f32,
}

impl Default for GeneticDescriptor {
    fn default() -> Self {
        Self {
            name: "Willow of Whispers".into(),
            description: "A melancholy specimen that weeps with the bassline.".into(),
            topology: Topology::WeepingWillow,
            branching_factor: 0.8,
            angle_variance: 45.0,
            palette: Palette([
                Rgb(0x1a, 0x1a, 0x1a),
                Rgb(0x00, 0x78, 0xbf),
                Rgb(0xff, 0x48, 0xb0),
            ]),
            leaf_shape: LeafShape::Needle,
            leaf_arrangement: LeafArrangement::Alternate,
            growth_speed: 1.2,
            mood: Mood::Melancholic,
            energy: 0.3,
        }
    }
}

impl GeneticDescriptor {
    /// Validate a loosely typed descriptor. Numeric fields are clamped.
    pub fn resolve(spec: &DescriptorSpec) -> Result<Self> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidDescriptor("empty name".into()));
        }
        if spec.palette.len() < 3 {
            return Err(EngineError::InvalidDescriptor(format!(
                "palette needs 3 colors, got {}",
                spec.palette.len()
            )));
        }
        let palette = Palette([
            Rgb::from_hex(&spec.palette[0])?,
            Rgb::from_hex(&spec.palette[1])?,
            Rgb::from_hex(&spec.palette[2])?,
        ]);

        Ok(Self {
            name: name.to_string(),
            description: spec.description.trim().to_string(),
            topology: spec.topology.parse()?,
            branching_factor: finite_or(spec.branching_factor, 0.8).clamp(0.5, 5.0),
            angle_variance: finite_or(spec.angle_variance, 45.0).clamp(0.0, 120.0),
            palette,
            leaf_shape: spec.leaf_shape.parse()?,
            leaf_arrangement: spec.leaf_arrangement.parse()?,
            growth_speed: finite_or(spec.growth_speed, 1.2).clamp(0.1, 5.0),
            mood: spec.mood.parse()?,
            energy: finite_or(spec.energy, 0.3).clamp(0.0, 1.0),
        })
    }

    /// Resolve, falling back to the default descriptor on any problem.
    pub fn resolve_or_default(spec: &DescriptorSpec) -> Self {
        match Self::resolve(spec) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("{}; falling back to the default specimen", e);
                Self::default()
            }
        }
    }

    /// Machine-generate a descriptor locally.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        const PREFIX: [&str; 8] = [
            "Whisper", "Static", "Hollow", "Velvet", "Signal", "Ember", "Glass", "Murmur",
        ];
        const SUFFIX: [&str; 8] = [
            "Fern", "Lattice", "Bloom", "Spire", "Tendril", "Rosette", "Bramble", "Canopy",
        ];
        const PALETTES: [[Rgb; 3]; 5] = [
            [Rgb(0x1a, 0x1a, 0x1a), Rgb(0x00, 0x78, 0xbf), Rgb(0xff, 0x48, 0xb0)],
            [Rgb(0x2b, 0x2d, 0x42), Rgb(0x00, 0xa9, 0x5c), Rgb(0xff, 0xe8, 0x00)],
            [Rgb(0x3d, 0x1c, 0x02), Rgb(0xff, 0x66, 0x5e), Rgb(0x76, 0x5b, 0xa7)],
            [Rgb(0x11, 0x22, 0x33), Rgb(0x70, 0x74, 0x7c), Rgb(0xf1, 0x50, 0x60)],
            [Rgb(0x0f, 0x3d, 0x3e), Rgb(0x00, 0x83, 0x8a), Rgb(0xff, 0xb5, 0x11)],
        ];
        const WORDS: [&str; 12] = [
            "signal", "root", "hum", "pulse", "drift", "echo", "spore", "static", "tide",
            "murmur", "lattice", "breath",
        ];

        let pick = |rng: &mut R, words: &[&'static str]| -> &'static str {
            words[rng.gen_range(0..words.len())]
        };

        let name = format!("{} {}", pick(rng, &PREFIX), pick(rng, &SUFFIX));
        let mut words: Vec<&str> = WORDS.to_vec();
        words.shuffle(rng);
        let description = format!(
            "A {} specimen that {}s with every {}.",
            words[0], words[1], words[2]
        );

        Self {
            name,
            description,
            topology: Topology::ALL[rng.gen_range(0..Topology::ALL.len())],
            branching_factor: rng.gen_range(0.5..3.0),
            angle_variance: rng.gen_range(15.0..75.0),
            palette: Palette(PALETTES[rng.gen_range(0..PALETTES.len())]),
            leaf_shape: LeafShape::ALL[rng.gen_range(0..LeafShape::ALL.len())],
            leaf_arrangement: LeafArrangement::ALL[rng.gen_range(0..LeafArrangement::ALL.len())],
            growth_speed: rng.gen_range(0.6..2.0),
            mood: Mood::ALL[rng.gen_range(0..Mood::ALL.len())],
            energy: rng.gen_range(0.0..1.0),
        }
    }

    /// Words used for glyph decoration (name followed by description)
    pub fn tokens(&self) -> Vec<String> {
        self.name
            .split_whitespace()
            .chain(self.description.split_whitespace())
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_ascii_uppercase()
            })
            .filter(|w| !w.is_empty())
            .collect()
    }

    pub fn to_spec(&self) -> DescriptorSpec {
        DescriptorSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            topology: self.topology.to_string(),
            branching_factor: self.branching_factor,
            angle_variance: self.angle_variance,
            palette: self.palette.0.iter().map(|c| c.to_hex()).collect(),
            leaf_shape: self.leaf_shape.to_string(),
            leaf_arrangement: self.leaf_arrangement.to_string(),
            growth_speed: self.growth_speed,
            mood: self.mood.to_string(),
            energy: self.energy,
        }
    }
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}
