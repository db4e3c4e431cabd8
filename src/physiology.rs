//! Physiology model: feature stream to stress and energy.
//!
//! Stress is a leaky accumulator with a fast attack above the loudness
//! threshold and a slower decay below it. Energy is the instantaneous change
//! in volume between consecutive ticks.

use crate::analysis::FeatureFrame;
use crate::params::PhysiologyParams;

/// Derived physiological state, both fields in [0, 1]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhysioState {
    pub stress: f32,
    pub energy: f32,
}

pub struct PhysiologyModel {
    params: PhysiologyParams,
    state: PhysioState,
    last_volume: f32,
}

impl PhysiologyModel {
    pub fn new(params: PhysiologyParams) -> Self {
        Self {
            params,
            state: PhysioState::default(),
            last_volume: 0.0,
        }
    }

    pub fn state(&self) -> PhysioState {
        self.state
    }

    pub fn update(&mut self, frame: &FeatureFrame) -> PhysioState {
        let volume = frame.volume();

        self.state.stress = if volume > self.params.stress_threshold {
            (self.state.stress + self.params.stress_increment).min(1.0)
        } else {
            (self.state.stress - self.params.stress_decrement).max(0.0)
        };

        self.state.energy =
            ((volume - self.last_volume).abs() / self.params.energy_divisor).clamp(0.0, 1.0);
        self.last_volume = volume;

        self.state
    }

    /// Relax toward zero as if a silent frame arrived
    pub fn decay(&mut self) -> PhysioState {
        self.update(&FeatureFrame::default())
    }

    pub fn reset(&mut self) {
        self.state = PhysioState::default();
        self.last_volume = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> PhysiologyModel {
        PhysiologyModel::new(PhysiologyParams::default())
    }

    #[test]
    fn test_loud_input_saturates_stress() {
        let mut m = model();
        let loud = FeatureFrame::bands(200.0, 200.0, 200.0);
        let mut saturated_at = None;
        for tick in 1..=50 {
            let s = m.update(&loud);
            assert!(s.stress <= 1.0);
            if saturated_at.is_none() && s.stress >= 1.0 {
                saturated_at = Some(tick);
            }
        }
        // ceil(1 / 0.04) plus one tick of float rounding
        assert!(saturated_at.unwrap() <= 26);
        assert_eq!(m.state().stress, 1.0);
    }

    #[test]
    fn test_step_is_bounded() {
        let mut m = model();
        let frames = [
            FeatureFrame::bands(255.0, 255.0, 255.0),
            FeatureFrame::bands(0.0, 0.0, 0.0),
            FeatureFrame::bands(151.0, 151.0, 151.0),
            FeatureFrame::bands(150.0, 150.0, 150.0),
        ];
        let mut prev = m.state().stress;
        for f in frames.iter().cycle().take(40) {
            let s = m.update(f).stress;
            assert!((s - prev) <= 0.04 + 1e-6);
            assert!((prev - s) <= 0.02 + 1e-6);
            assert!((0.0..=1.0).contains(&s));
            prev = s;
        }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut m = model();
        m.update(&FeatureFrame::bands(150.0, 150.0, 150.0));
        assert_eq!(m.state().stress, 0.0);
    }

    #[test]
    fn test_energy_tracks_volume_change() {
        let mut m = model();
        assert_eq!(m.update(&FeatureFrame::bands(15.0, 15.0, 15.0)).energy, 0.5);
        assert_eq!(m.update(&FeatureFrame::bands(15.0, 15.0, 15.0)).energy, 0.0);
        assert_eq!(m.update(&FeatureFrame::bands(200.0, 200.0, 200.0)).energy, 1.0);
    }

    #[test]
    fn test_decay_relaxes_to_zero() {
        let mut m = model();
        for _ in 0..10 {
            m.update(&FeatureFrame::bands(220.0, 220.0, 220.0));
        }
        assert!(m.state().stress > 0.3);
        for _ in 0..100 {
            m.decay();
        }
        assert_eq!(m.state(), PhysioState::default());
    }

    #[test]
    fn test_custom_threshold() {
        let mut m = PhysiologyModel::new(PhysiologyParams {
            stress_threshold: 50.0,
            ..Default::default()
        });
        m.update(&FeatureFrame::bands(60.0, 60.0, 60.0));
        assert!(m.state().stress > 0.0);
    }
}
