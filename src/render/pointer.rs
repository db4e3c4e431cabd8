//! Pointer proximity shared by every primitive.

use glam::Vec2;

/// Reach radii (pixels) used by the primitives
pub mod reach {
    pub const NODE: f32 = 120.0;
    pub const STROKE: f32 = 150.0;
    pub const CHAIN: f32 = 150.0;
    pub const CANOPY: f32 = 180.0;
    pub const VINE: f32 = 200.0;
    pub const BRANCH: f32 = 250.0;
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    pub position: Vec2,
    pub active: bool,
}

impl PointerState {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            active: true,
        }
    }

    /// Linear falloff: 1 at the pointer, 0 at `reach` and beyond.
    /// Always 0 while the pointer is inactive.
    pub fn influence(&self, point: Vec2, reach: f32) -> f32 {
        if !self.active || reach <= 0.0 {
            return 0.0;
        }
        (1.0 - point.distance(self.position) / reach).max(0.0)
    }

    /// Move `point` toward the pointer by `influence * strength` of the
    /// distance, never more than `cap`.
    pub fn attract(&self, point: Vec2, influence: f32, strength: f32, cap: f32) -> Vec2 {
        if !self.active {
            return point;
        }
        let pull = (influence * strength).clamp(0.0, cap);
        point + (self.position - point) * pull
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_influence_falloff() {
        let p = PointerState::at(100.0, 100.0);
        assert_eq!(p.influence(Vec2::new(100.0, 100.0), 150.0), 1.0);
        assert!((p.influence(Vec2::new(175.0, 100.0), 150.0) - 0.5).abs() < 1e-6);
        assert_eq!(p.influence(Vec2::new(400.0, 100.0), 150.0), 0.0);
    }

    #[test]
    fn test_inactive_pointer_has_no_effect() {
        let p = PointerState {
            position: Vec2::ZERO,
            active: false,
        };
        assert_eq!(p.influence(Vec2::ZERO, 150.0), 0.0);
        assert_eq!(p.attract(Vec2::ONE, 1.0, 1.0, 0.2), Vec2::ONE);
    }

    #[test]
    fn test_attraction_is_capped() {
        let p = PointerState::at(100.0, 0.0);
        let moved = p.attract(Vec2::ZERO, 1.0, 5.0, 0.2);
        assert!((moved.x - 20.0).abs() < 1e-4);
        let gentle = p.attract(Vec2::ZERO, 0.5, 0.15, 0.2);
        assert!((gentle.x - 7.5).abs() < 1e-4);
    }
}
