//! The organism engine: one explicit state record driving a visual tick.
//!
//! Per tick the organism pulls the newest feature frame, updates physiology
//! (or lets it relax when no source is linked), feeds growth, advances the
//! wind, forwards physiology to the music engine and renders. Render and
//! music read the same per-tick snapshot.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::analysis::{FeatureExtractor, Source};
use crate::descriptor::GeneticDescriptor;
use crate::error::Result;
use crate::growth::{GrowthMachine, GrowthState, Phase};
use crate::music::{Clip, MusicEngine};
use crate::params::EngineConfig;
use crate::physiology::{PhysioState, PhysiologyModel};
use crate::render::{self, Clock, PointerState, RenderInput, Scene, Weather};
use crate::snapshot::{self, Snapshot};

/// Readout for one tick
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Telemetry {
    pub stress: f32,
    pub energy: f32,
    /// 0..=100
    pub growth: f32,
    pub phase: Phase,
    /// A signal source is attached
    pub linked: bool,
}

/// Result of one visual tick
#[derive(Clone, Debug)]
pub struct Frame {
    pub scene: Scene,
    pub telemetry: Telemetry,
}

pub struct Organism {
    config: EngineConfig,
    descriptor: GeneticDescriptor,
    growth: GrowthMachine,
    physiology: PhysiologyModel,
    extractor: FeatureExtractor,
    music: MusicEngine,
    singing: bool,
    pointer: PointerState,
    weather: Weather,
    elapsed: f32,
    rng: StdRng,
}

impl Organism {
    pub fn new(config: EngineConfig) -> Self {
        let music = MusicEngine::new(config.music.clone());
        Self::assemble(config, music, StdRng::from_entropy())
    }

    /// Organism whose drawing and note choices follow `seed`
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        let music = MusicEngine::with_seed(config.music.clone(), seed);
        Self::assemble(config, music, StdRng::seed_from_u64(seed))
    }

    fn assemble(config: EngineConfig, music: MusicEngine, mut rng: StdRng) -> Self {
        Self {
            descriptor: GeneticDescriptor::default(),
            growth: GrowthMachine::new(config.growth.clone()),
            physiology: PhysiologyModel::new(config.physiology.clone()),
            extractor: FeatureExtractor::new(config.fft.clone()),
            music,
            singing: false,
            pointer: PointerState::default(),
            weather: Weather::new(rng.gen()),
            elapsed: 0.0,
            rng,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn descriptor(&self) -> &GeneticDescriptor {
        &self.descriptor
    }

    pub fn growth(&self) -> GrowthState {
        self.growth.state()
    }

    pub fn phase(&self) -> Phase {
        self.growth.phase()
    }

    pub fn physio(&self) -> PhysioState {
        self.physiology.state()
    }

    /// Shared handle to the music engine (for a device output or a tap)
    pub fn music(&self) -> &MusicEngine {
        &self.music
    }

    pub fn is_singing(&self) -> bool {
        self.singing
    }

    pub fn is_linked(&self) -> bool {
        self.extractor.is_attached()
    }

    /// Seconds of ticks driven so far
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn telemetry(&self) -> Telemetry {
        let physio = self.physiology.state();
        let growth = self.growth.state();
        Telemetry {
            stress: physio.stress,
            energy: physio.energy,
            growth: growth.growth,
            phase: growth.phase,
            linked: self.extractor.is_attached(),
        }
    }

    /// Replace the descriptor. Growth is kept; a singing graph restarts.
    pub fn set_descriptor(&mut self, descriptor: GeneticDescriptor) {
        info!(
            "Descriptor: {} ({}, {})",
            descriptor.name, descriptor.topology, descriptor.mood
        );
        self.descriptor = descriptor;
        if self.singing {
            self.music.start(&self.descriptor);
            self.music.update_bio_state(self.physiology.state());
        }
    }

    pub fn generate_seed(&mut self) -> Result<()> {
        self.growth.generate_seed()
    }

    pub fn reject_seed(&mut self) -> Result<()> {
        self.growth.reject()
    }

    pub fn plant(&mut self) -> Result<()> {
        self.growth.plant()?;
        if self.singing {
            self.music.start(&self.descriptor);
        }
        Ok(())
    }

    /// Back to Dormant: growth zeroed, audio torn down, default descriptor
    pub fn compost(&mut self) -> Result<()> {
        self.growth.compost()?;
        self.extractor.detach();
        self.music.stop();
        self.singing = false;
        self.physiology.reset();
        self.weather.reset();
        self.pointer = PointerState::default();
        self.descriptor = GeneticDescriptor::default();
        Ok(())
    }

    /// Link a signal source; on error the previous source stays linked
    pub fn attach_source(&mut self, source: Source) -> Result<()> {
        self.extractor.attach(source)
    }

    /// Listen to the organism's own song
    pub fn attach_own_voice(&mut self) -> Result<()> {
        let tap = self.music.analysis_tap();
        self.extractor.attach(tap)
    }

    pub fn detach_source(&mut self) {
        self.extractor.detach();
    }

    /// Pause or resume a file source; false when none is attached
    pub fn set_source_paused(&mut self, paused: bool) -> bool {
        self.extractor.set_paused(paused)
    }

    pub fn is_source_paused(&self) -> bool {
        self.extractor.is_paused()
    }

    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = PointerState::at(x, y);
    }

    pub fn release_pointer(&mut self) {
        self.pointer.active = false;
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    /// Start or stop the generative music
    pub fn set_singing(&mut self, singing: bool) {
        if singing == self.singing {
            return;
        }
        self.singing = singing;
        if singing {
            self.music.start(&self.descriptor);
            self.music.update_bio_state(self.physiology.state());
        } else {
            self.music.stop();
        }
    }

    /// One visual tick, `dt` seconds after the previous one
    pub fn tick(&mut self, dt: f32) -> Frame {
        self.elapsed += dt.max(0.0);

        let frame = self.extractor.frame();
        let linked = self.extractor.is_attached();
        let physio = if linked {
            self.physiology.update(&frame)
        } else {
            self.physiology.decay()
        };
        let growth = self.growth.tick(frame.volume(), self.descriptor.growth_speed);
        let clock = self.weather.advance(linked.then_some(frame.mid));

        if self.singing {
            self.music.update_bio_state(physio);
        }

        let scene = self.draw(growth, physio, clock);
        Frame {
            scene,
            telemetry: Telemetry {
                stress: physio.stress,
                energy: physio.energy,
                growth: growth.growth,
                phase: growth.phase,
                linked,
            },
        }
    }

    /// Rasterize the current state as a still frame
    pub fn snapshot(&mut self) -> Snapshot {
        let scene = self.draw(
            self.growth.state(),
            self.physiology.state(),
            self.weather.clock(),
        );
        snapshot::snapshot(&scene, &self.descriptor, &self.config.render)
    }

    pub fn start_recording(&self) -> bool {
        self.music.start_recording()
    }

    pub fn stop_recording(&self) -> Option<Clip> {
        self.music.stop_recording()
    }

    fn draw(&mut self, growth: GrowthState, physio: PhysioState, clock: Clock) -> Scene {
        let input = RenderInput {
            descriptor: &self.descriptor,
            phase: growth.phase,
            growth: growth.growth,
            physio,
            pointer: self.pointer,
            clock,
        };
        render::render(&input, &self.config.render, &mut self.rng)
    }
}
