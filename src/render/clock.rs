//! Animation clock and wind phase.

use noise::{NoiseFn, Perlin};

/// Time and wind phase read by the renderer
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Clock {
    /// Animation time, advances 0.02 per tick
    pub time: f32,
    /// Wind phase, advances only while sound is present
    pub wind: f32,
}

/// Advances the clock; gusts come from a slow Perlin drift
pub struct Weather {
    perlin: Perlin,
    clock: Clock,
}

impl Weather {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            clock: Clock::default(),
        }
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// One tick. `mid` is the mid band level when a source is attached.
    pub fn advance(&mut self, mid: Option<f32>) -> Clock {
        if let Some(mid) = mid {
            let gust = self.perlin.get([self.clock.time as f64 * 0.25, 0.5]) as f32;
            self.clock.wind += 0.02 + mid / 1000.0 + gust * 0.01;
        }
        self.clock.time += 0.02;
        self.clock
    }

    pub fn reset(&mut self) {
        self.clock = Clock::default();
    }
}
