//! Bloomsynth - A sound-fed procedural organism
//!
//! Sound becomes stress and energy, energy becomes growth, and the plant
//! sings back through a voice chosen by its shape.

mod cli;

use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use bloomsynth::error::Result;
use bloomsynth::music::AudioOutput;
use bloomsynth::{EngineConfig, Organism};
use cli::Args;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = EngineConfig::load(args.config.as_deref());
    let recording = args.create_recording_config()?;

    let (mut organism, mut rng) = match args.seed {
        Some(seed) => (
            Organism::with_seed(config, seed),
            StdRng::seed_from_u64(seed),
        ),
        None => (Organism::new(config), StdRng::from_entropy()),
    };

    organism.set_descriptor(args.load_descriptor(&mut rng));
    organism.generate_seed()?;
    organism.plant()?;

    if let Some(source) = args.source() {
        if let Err(e) = organism.attach_source(source) {
            warn!("{}, growing without a signal", e);
        }
    }

    // Speakers pull audio from the device callback; otherwise we render it here
    let mut output = None;
    if args.sing {
        organism.set_singing(true);
        if args.speakers {
            match AudioOutput::open(organism.music()) {
                Ok(out) => output = Some(out),
                Err(e) => warn!("{}, rendering music silently", e),
            }
        }
        if args.listen_to_self {
            organism.attach_own_voice()?;
        }
        if args.record && !organism.start_recording() {
            warn!("Recording requested but no music is playing");
        }
    }

    let fps = args.fps.max(1);
    let dt = 1.0 / fps as f32;
    let realtime = output.is_some() || args.wav.is_some() || args.mic;
    let sample_rate = organism.music().sample_rate() as f32;
    let mut pending = 0.0f32;
    let mut block = Vec::new();

    info!(
        "Running {} ticks at {} fps{}",
        args.ticks,
        fps,
        if realtime { " (real time)" } else { "" }
    );

    for tick in 0..args.ticks {
        let started = Instant::now();
        let frame = organism.tick(dt);
        let t = frame.telemetry;
        debug!(
            "tick {}: {} growth={:.2} stress={:.3} energy={:.3} linked={} primitives={}",
            tick,
            t.phase,
            t.growth,
            t.stress,
            t.energy,
            t.linked,
            frame.scene.primitives.len()
        );

        if output.is_none() && organism.is_singing() {
            pending += dt * sample_rate;
            let n = pending as usize;
            pending -= n as f32;
            block.resize(n, 0.0);
            organism.music().render_block(&mut block);
        }

        if (tick + 1) % fps == 0 {
            info!(
                "{:>4.1}s  growth {:>5.1}%  stress {:.2}  energy {:.2}",
                organism.elapsed(),
                t.growth,
                t.stress,
                t.energy
            );
        }

        if realtime {
            let frame_time = Duration::from_secs_f32(dt);
            if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
    }

    if let Some(recording) = &recording {
        if args.record {
            match organism.stop_recording() {
                Some(clip) => {
                    clip.save(&recording.clip_path())?;
                    info!("Clip: {:.1}s", clip.duration_secs());
                }
                None => warn!("No clip was recorded"),
            }
        }
        if args.snapshot {
            organism.snapshot().save(&recording.snapshot_path())?;
        }
    }

    organism.set_singing(false);
    organism.detach_source();
    drop(output);

    let t = organism.telemetry();
    info!(
        "{} finished at {:.1}% growth (stress {:.2}, energy {:.2})",
        organism.descriptor().name,
        t.growth,
        t.stress,
        t.energy
    );
    Ok(())
}
