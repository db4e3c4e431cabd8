//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};
use rand::Rng;

use bloomsynth::analysis::Source;
use bloomsynth::descriptor::{DescriptorSpec, GeneticDescriptor};
use bloomsynth::error::{EngineError, Result};
use bloomsynth::params::RecordingConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Bloomsynth")]
#[command(about = "Grows a sound-fed procedural organism", long_about = None)]
pub struct Args {
    /// Descriptor file (TOML)
    #[arg(long, value_name = "FILE", conflicts_with = "random")]
    pub descriptor: Option<PathBuf>,

    /// Roll a random descriptor
    #[arg(long)]
    pub random: bool,

    /// Feed a WAV file (looped) into the organism
    #[arg(long, value_name = "FILE", conflicts_with = "mic")]
    pub wav: Option<PathBuf>,

    /// Feed the default microphone into the organism
    #[arg(long)]
    pub mic: bool,

    /// Let the organism listen to its own song
    #[arg(long, conflicts_with_all = ["wav", "mic"], requires = "sing")]
    pub listen_to_self: bool,

    /// Number of visual ticks to run
    #[arg(long, value_name = "N", default_value = "600")]
    pub ticks: u32,

    /// Visual ticks per second
    #[arg(long, value_name = "FPS", default_value = "60")]
    pub fps: u32,

    /// Turn on generative music
    #[arg(long)]
    pub sing: bool,

    /// Play the music on the default output device instead of rendering it silently
    #[arg(long, requires = "sing")]
    pub speakers: bool,

    /// Write a PNG snapshot after the last tick
    #[arg(long)]
    pub snapshot: bool,

    /// Record the music to a WAV clip
    #[arg(long, requires = "sing")]
    pub record: bool,

    /// Output directory for snapshot and clip
    #[arg(long, value_name = "DIR", default_value = "output")]
    pub output: PathBuf,

    /// Engine config file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seed for reproducible drawing and music
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

impl Args {
    /// Resolve the descriptor; malformed files fall back to the default
    pub fn load_descriptor<R: Rng + ?Sized>(&self, rng: &mut R) -> GeneticDescriptor {
        if self.random {
            return GeneticDescriptor::random(rng);
        }
        let Some(path) = &self.descriptor else {
            return GeneticDescriptor::default();
        };
        let spec = std::fs::read_to_string(path)
            .map_err(|e| EngineError::InvalidDescriptor(format!("{}: {}", path.display(), e)))
            .and_then(|text| DescriptorSpec::from_toml(&text));
        match spec {
            Ok(spec) => GeneticDescriptor::resolve_or_default(&spec),
            Err(e) => {
                warn!("{}, using default descriptor", e);
                GeneticDescriptor::default()
            }
        }
    }

    /// Signal source requested on the command line
    pub fn source(&self) -> Option<Source> {
        if let Some(path) = &self.wav {
            Some(Source::file(path.clone(), true))
        } else if self.mic {
            Some(Source::Microphone)
        } else {
            None
        }
    }

    /// Create recording configuration if any artifact is requested
    pub fn create_recording_config(&self) -> Result<Option<RecordingConfig>> {
        if !self.snapshot && !self.record {
            return Ok(None);
        }
        let config = RecordingConfig::new(&self.output);
        std::fs::create_dir_all(&config.output_dir).map_err(|e| {
            EngineError::Encode(format!("create {}: {}", config.output_dir.display(), e))
        })?;
        info!("Writing artifacts to {}", config.output_dir.display());
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["bloomsynth"]);
        assert_eq!(args.ticks, 600);
        assert_eq!(args.fps, 60);
        assert!(args.source().is_none());
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(args.load_descriptor(&mut rng), GeneticDescriptor::default());
    }

    #[test]
    fn test_conflicting_sources_rejected() {
        assert!(Args::try_parse_from(["bloomsynth", "--wav", "a.wav", "--mic"]).is_err());
        assert!(Args::try_parse_from(["bloomsynth", "--record"]).is_err());
    }

    #[test]
    fn test_missing_descriptor_file_falls_back() {
        let args = Args::parse_from(["bloomsynth", "--descriptor", "/nonexistent/plant.toml"]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(args.load_descriptor(&mut rng), GeneticDescriptor::default());
    }
}
