//! Lifecycle phase and the monotonic growth accumulator.

use std::fmt;

use crate::error::{EngineError, Result};
use crate::params::GrowthParams;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Dormant,
    Seeded,
    Alive,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Dormant => "dormant",
            Phase::Seeded => "seeded",
            Phase::Alive => "alive",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrowthState {
    pub phase: Phase,
    /// 0..=100
    pub growth: f32,
}

impl GrowthState {
    /// Growth as a 0..1 fraction
    pub fn progress(&self) -> f32 {
        (self.growth / 100.0).clamp(0.0, 1.0)
    }
}

pub struct GrowthMachine {
    params: GrowthParams,
    state: GrowthState,
}

impl GrowthMachine {
    pub fn new(params: GrowthParams) -> Self {
        Self {
            params,
            state: GrowthState::default(),
        }
    }

    pub fn state(&self) -> GrowthState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    fn transition(&mut self, from: Phase, to: Phase, action: &'static str) -> Result<()> {
        if self.state.phase != from {
            return Err(EngineError::InvalidTransition {
                from: self.state.phase,
                action,
            });
        }
        log::info!("Lifecycle: {} -> {} ({})", from, to, action);
        self.state = GrowthState {
            phase: to,
            growth: 0.0,
        };
        Ok(())
    }

    pub fn generate_seed(&mut self) -> Result<()> {
        self.transition(Phase::Dormant, Phase::Seeded, "generate seed")
    }

    pub fn reject(&mut self) -> Result<()> {
        self.transition(Phase::Seeded, Phase::Dormant, "reject seed")
    }

    pub fn plant(&mut self) -> Result<()> {
        self.transition(Phase::Seeded, Phase::Alive, "plant")
    }

    pub fn compost(&mut self) -> Result<()> {
        self.transition(Phase::Alive, Phase::Dormant, "compost")
    }

    /// Advance growth by one tick. Only feeds while Alive and above the
    /// volume floor.
    pub fn tick(&mut self, volume: f32, growth_speed: f32) -> GrowthState {
        let p = &self.params;
        if self.state.phase == Phase::Alive
            && volume > p.volume_floor
            && self.state.growth < p.max_growth
        {
            let nutrient = (volume / p.nutrient_scale).max(p.min_nutrient);
            let step = (growth_speed * p.rate * nutrient).max(0.0);
            self.state.growth = (self.state.growth + step).min(p.max_growth);
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alive() -> GrowthMachine {
        let mut m = GrowthMachine::new(GrowthParams::default());
        m.generate_seed().unwrap();
        m.plant().unwrap();
        m
    }

    #[test]
    fn test_valid_cycle() {
        let mut m = GrowthMachine::new(GrowthParams::default());
        m.generate_seed().unwrap();
        m.reject().unwrap();
        assert_eq!(m.phase(), Phase::Dormant);
        m.generate_seed().unwrap();
        m.plant().unwrap();
        assert_eq!(m.phase(), Phase::Alive);
        m.compost().unwrap();
        assert_eq!(m.state(), GrowthState::default());
    }

    #[test]
    fn test_invalid_transitions_leave_state() {
        let mut m = GrowthMachine::new(GrowthParams::default());
        assert!(matches!(
            m.plant(),
            Err(EngineError::InvalidTransition {
                from: Phase::Dormant,
                ..
            })
        ));
        assert!(m.compost().is_err());
        assert!(m.reject().is_err());
        assert_eq!(m.phase(), Phase::Dormant);

        let mut m = alive();
        m.tick(120.0, 1.0);
        let before = m.state();
        assert!(m.generate_seed().is_err());
        assert!(m.plant().is_err());
        assert_eq!(m.state(), before);
    }

    #[test]
    fn test_growth_pinned_until_alive() {
        let mut m = GrowthMachine::new(GrowthParams::default());
        assert_eq!(m.tick(200.0, 2.0).growth, 0.0);
        m.generate_seed().unwrap();
        assert_eq!(m.tick(200.0, 2.0).growth, 0.0);
    }

    #[test]
    fn test_growth_step_formula() {
        let mut m = alive();
        // 1.2 * 0.4 * max(0.2, 50/100)
        let g = m.tick(50.0, 1.2).growth;
        assert!((g - 0.24).abs() < 1e-6);
        // Quiet but audible: nutrient floor applies
        let g2 = m.tick(1.0, 1.0).growth;
        assert!((g2 - g - 0.08).abs() < 1e-6);
    }

    #[test]
    fn test_silence_does_not_grow() {
        let mut m = alive();
        for _ in 0..100 {
            m.tick(0.0, 3.0);
        }
        assert_eq!(m.state().growth, 0.0);
    }

    #[test]
    fn test_growth_monotone_and_saturates() {
        let mut m = alive();
        let mut prev = 0.0;
        for i in 0..2000 {
            let g = m.tick((i % 7) as f32 * 40.0, 1.5).growth;
            assert!(g >= prev);
            assert!(g <= 100.0);
            prev = g;
        }
        assert_eq!(prev, 100.0);
    }

    #[test]
    fn test_compost_resets_growth() {
        let mut m = alive();
        for _ in 0..50 {
            m.tick(200.0, 2.0);
        }
        assert!(m.state().growth > 0.0);
        m.compost().unwrap();
        assert_eq!(m.state().growth, 0.0);
        assert_eq!(m.phase(), Phase::Dormant);
    }
}
