//! Physiology and growth tuning.
//!
//! The activation threshold and increments were tuned by ear against one
//! microphone at 5x input gain: normal speech sits around 100-200 on the
//! byte scale, room noise around 20-50.

use serde::{Deserialize, Serialize};

/// Stress/energy filter parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysiologyParams {
    /// Mean band level (0..255) above which stress rises
    pub stress_threshold: f32,

    /// Stress added per loud tick (attack)
    pub stress_increment: f32,

    /// Stress removed per quiet tick (decay, slower than attack)
    pub stress_decrement: f32,

    /// Volume delta that maps to full energy
    pub energy_divisor: f32,
}

impl Default for PhysiologyParams {
    fn default() -> Self {
        Self {
            stress_threshold: 150.0,
            stress_increment: 0.04,
            stress_decrement: 0.02,
            energy_divisor: 30.0,
        }
    }
}

/// Growth accumulator parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    /// Growth units per tick at growth_speed 1 and full nutrient
    pub rate: f32,

    /// Volume below which the organism is considered unfed
    pub volume_floor: f32,

    /// Minimum nutrient factor once fed
    pub min_nutrient: f32,

    /// Volume that maps to nutrient factor 1.0
    pub nutrient_scale: f32,

    /// Growth ceiling
    pub max_growth: f32,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            rate: 0.4,
            volume_floor: 0.1,
            min_nutrient: 0.2,
            nutrient_scale: 100.0,
            max_growth: 100.0,
        }
    }
}
