//! The terrain-query collaborator: world-space height, slope, and extent.

use crate::heightfield::Heightfield;
use std::sync::Arc;

/// Horizontal and vertical extents of the terrain in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainExtent {
    /// World-space size along X.
    pub x_range: f32,
    /// World-space size along Z.
    pub z_range: f32,
    /// World-space vertical scale.
    pub y_range: f32,
}

/// Read-only terrain sampling interface consumed by the spawners.
///
/// Implementations must be safe to sample at any coordinate: queries outside
/// the terrain extent are clamped to the border rather than failing.
pub trait TerrainQuery {
    /// Surface height in world units at `(x, z)`.
    fn height_at(&self, x: f32, z: f32) -> f32;
    /// Local terrain steepness in degrees at `(x, z)`: 0 is flat, 90 is a
    /// vertical cliff.
    fn slope_at(&self, x: f32, z: f32) -> f32;
    /// The terrain's world-space extents.
    fn extent(&self) -> TerrainExtent;
}

/// [`TerrainQuery`] implementation backed by a generated [`Heightfield`].
///
/// One raster cell spans one world unit; heights are interpolated bilinearly
/// between cell values and scaled by the field's vertical range.
pub struct HeightfieldTerrain {
    field: Arc<Heightfield>,
}

impl HeightfieldTerrain {
    /// Wrap a heightfield for world-space sampling.
    pub fn new(field: Arc<Heightfield>) -> Self {
        Self { field }
    }

    /// The underlying raster.
    pub fn field(&self) -> &Heightfield {
        &self.field
    }

    /// Bilinearly interpolated height fraction in [0, 1] at raster-space
    /// `(x, z)`.
    fn fraction_at(&self, x: f32, z: f32) -> f32 {
        let fx = x.clamp(0.0, (self.field.x_range() - 1) as f32);
        let fz = z.clamp(0.0, (self.field.z_range() - 1) as f32);
        let x0 = fx.floor() as usize;
        let z0 = fz.floor() as usize;
        let tx = fx - x0 as f32;
        let tz = fz - z0 as f32;

        let h00 = self.field.get(x0, z0);
        let h10 = self.field.get(x0 + 1, z0);
        let h01 = self.field.get(x0, z0 + 1);
        let h11 = self.field.get(x0 + 1, z0 + 1);

        let a = h00 + (h10 - h00) * tx;
        let b = h01 + (h11 - h01) * tx;
        a + (b - a) * tz
    }
}

impl TerrainQuery for HeightfieldTerrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self.fraction_at(x, z) * self.field.y_range()
    }

    fn slope_at(&self, x: f32, z: f32) -> f32 {
        // Central differences over one raster cell, one-sided at the borders
        // (the fraction sampler clamps).
        let dx = (self.height_at(x + 0.5, z) - self.height_at(x - 0.5, z)).abs();
        let dz = (self.height_at(x, z + 0.5) - self.height_at(x, z - 0.5)).abs();
        let gradient = (dx * dx + dz * dz).sqrt();
        gradient.atan().to_degrees()
    }

    fn extent(&self) -> TerrainExtent {
        TerrainExtent {
            x_range: self.field.x_range() as f32,
            z_range: self.field.z_range() as f32,
            y_range: self.field.y_range(),
        }
    }
}
