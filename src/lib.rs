//! Bloomsynth library - Audio-reactive procedural organism

pub mod analysis;
pub mod descriptor;
pub mod error;
pub mod growth;
pub mod music;
pub mod organism;
pub mod params;
pub mod physiology;
pub mod render;
pub mod snapshot;

pub use descriptor::GeneticDescriptor;
pub use error::{EngineError, Result};
pub use organism::{Frame, Organism, Telemetry};
pub use params::EngineConfig;
