//! Per-instance color variation driven by low-frequency noise.

use noise::{NoiseFn, Perlin};

/// Generates smooth world-space tint colors for ground cover instances.
///
/// Samples a single low-frequency Perlin layer so nearby instances share a
/// hue and the variation reads as patches rather than speckle.
pub struct TintField {
    perlin: Perlin,
    frequency: f64,
}

impl TintField {
    /// Default sample frequency in inverse world units.
    pub const DEFAULT_FREQUENCY: f64 = 0.02;

    pub fn new(seed: u32) -> Self {
        Self::with_frequency(seed, Self::DEFAULT_FREQUENCY)
    }

    pub fn with_frequency(seed: u32, frequency: f64) -> Self {
        Self {
            perlin: Perlin::new(seed),
            frequency,
        }
    }

    /// RGBA tint at a world XZ position.
    ///
    /// The noise value in [0, 1] shifts a green base color: red and green
    /// gain up to 0.2, blue up to 0.1. Alpha is always 1.
    pub fn tint_at(&self, world_x: f32, world_z: f32) -> [f32; 4] {
        let n = self
            .perlin
            .get([f64::from(world_x) * self.frequency, f64::from(world_z) * self.frequency]);
        let n = ((n + 1.0) * 0.5).clamp(0.0, 1.0) as f32;
        [0.3 + n * 0.2, 0.8 + n * 0.2, 0.2 + n * 0.1, 1.0]
    }
}
