//! Rendering, snapshot and recording configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canvas width (pixels)
    pub canvas_width: u32,

    /// Canvas height (pixels)
    pub canvas_height: u32,

    /// Ground line as a fraction of canvas height (rooted forms start here)
    pub baseline_fraction: f32,

    /// Upper bound on how far any primitive is pulled toward the pointer
    /// (fraction of the distance to the pointer)
    pub attraction_cap: f32,

    /// Recursion bound for the branching topologies
    pub max_depth: u32,

    /// Off-white paper tone for snapshots (RGB)
    pub paper_rgb: [u8; 3],

    /// Number of paper speckles sprinkled on a snapshot background
    pub paper_speckles: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1280,
            canvas_height: 720,
            baseline_fraction: 0.7,
            attraction_cap: 0.2,
            max_depth: 7,
            paper_rgb: [0xfa, 0xf9, 0xf6],
            paper_speckles: 80,
        }
    }
}

impl RenderConfig {
    /// Canvas center (pixels)
    pub fn center(&self) -> [f32; 2] {
        [
            self.canvas_width as f32 / 2.0,
            self.canvas_height as f32 / 2.0,
        ]
    }

    /// Ground line y coordinate (pixels)
    pub fn baseline_y(&self) -> f32 {
        self.canvas_height as f32 * self.baseline_fraction
    }
}

/// Output locations for artifacts produced by the CLI
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Output directory for the snapshot and the clip
    pub output_dir: PathBuf,
}

impl RecordingConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Snapshot file path
    pub fn snapshot_path(&self) -> PathBuf {
        self.output_dir.join("specimen.png")
    }

    /// Audio clip file path
    pub fn clip_path(&self) -> PathBuf {
        self.output_dir.join("specimen.wav")
    }
}
