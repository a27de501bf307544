//! Multi-octave Perlin heightfield synthesis with island shaping.
//!
//! Composites octaves of 2D Perlin noise into a normalized height raster,
//! applies a redistribution exponent to reshape the valley/peak balance, and
//! optionally multiplies in an island falloff mask before a final
//! re-normalization pass.

use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Island silhouette shaping applied after redistribution.
#[derive(Clone, Debug, PartialEq)]
pub enum IslandMask {
    /// No shaping; the mask is 1 everywhere.
    None,
    /// Radial falloff from the raster center: full height inside
    /// `inner_edge` (a fraction of the max center-to-edge distance),
    /// smoothstep-interpolated down to 0 at the boundary.
    RealCenter { inner_edge: f32 },
    /// `centers` randomly placed mountain centers, each with its own
    /// influence radius and a weight in [0.7, 1]. The mask at a point is the
    /// maximum over all centers of that center's weighted radial falloff.
    MultiCenter { centers: u32, inner_edge: f32 },
}

/// Parameters for one heightfield generation pass.
///
/// All randomness (noise offsets, mountain-center placement) derives from
/// `seed`, so the same parameters always reproduce the same raster
/// bit-for-bit. Callers wanting fresh terrain draw a fresh seed.
#[derive(Clone, Debug)]
pub struct HeightfieldParams {
    /// Seed for noise offsets and island-center placement.
    pub seed: u64,
    /// Raster cells along world X.
    pub x_range: usize,
    /// Raster cells along world Z.
    pub z_range: usize,
    /// Vertical scale in world units; raster values are fractions of this.
    pub y_range: f32,
    /// Spatial scale of the base octave. Larger values zoom the noise out.
    pub noise_scale: f64,
    /// Number of noise octaves to composite. Octave `i` samples at frequency
    /// `2^i` with amplitude `1 / 2^i`. Typical range: 1..=8.
    pub octaves: u32,
    /// Redistribution exponent applied to the normalized height:
    /// `h' = h^e`. Values > 1 sharpen peaks and deepen valleys, values < 1
    /// flatten the terrain toward a plateau.
    pub redistribution: f32,
    /// Island shaping mask.
    pub island_mask: IslandMask,
}

impl Default for HeightfieldParams {
    fn default() -> Self {
        Self {
            seed: 0,
            x_range: 256,
            z_range: 256,
            y_range: 20.0,
            noise_scale: 20.0,
            octaves: 4,
            redistribution: 1.0,
            island_mask: IslandMask::None,
        }
    }
}

/// An immutable normalized height raster.
///
/// Values are in [0, 1] and stored x-major: index `x * z_range + z`, where
/// `x` spans world X and `z` spans world Z. The raster is recreated wholesale
/// on each generation pass; it is never partially mutated.
#[derive(Clone, Debug)]
pub struct Heightfield {
    values: Vec<f32>,
    x_range: usize,
    z_range: usize,
    y_range: f32,
}

/// One randomly placed mountain center for the multi-center island mask.
struct MountainCenter {
    x: f32,
    z: f32,
    radius: f32,
    weight: f32,
}

impl Heightfield {
    /// Generate a heightfield from the given parameters.
    ///
    /// Deterministic: the same parameters (including `seed`) always produce
    /// the same raster.
    pub fn generate(params: &HeightfieldParams) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let perlin = Perlin::new(params.seed as u32);

        // Noise-coordinate offsets, drawn once per generation pass.
        let offset_x: f64 = rng.random_range(0.0..9999.0);
        let offset_z: f64 = rng.random_range(0.0..9999.0);

        let (xr, zr) = (params.x_range, params.z_range);
        let mut values = vec![0.0f32; xr * zr];

        // Pass 1: octave summation.
        for x in 0..xr {
            for z in 0..zr {
                let x_base = x as f64 / xr as f64 * params.noise_scale + offset_x;
                let z_base = z as f64 / zr as f64 * params.noise_scale + offset_z;

                let mut sum = 0.0f64;
                for i in 0..params.octaves {
                    let octave_scale = f64::from(2u32.pow(i));
                    let sample = perlin.get([x_base * octave_scale, z_base * octave_scale]);
                    sum += sample / octave_scale;
                }
                values[x * zr + z] = sum as f32;
            }
        }

        // Pass 2: global min/max normalization into [0, 1].
        normalize_in_place(&mut values);

        // Pass 3: redistribution exponent.
        if (params.redistribution - 1.0).abs() > f32::EPSILON {
            for v in values.iter_mut() {
                *v = v.powf(params.redistribution);
            }
        }

        // Pass 4: island mask multiply, then re-normalize and clamp.
        match &params.island_mask {
            IslandMask::None => {}
            IslandMask::RealCenter { inner_edge } => {
                let cx = xr as f32 * 0.5;
                let cz = zr as f32 * 0.5;
                let max_dist = cx.max(cz);
                for x in 0..xr {
                    for z in 0..zr {
                        let d = ((x as f32 - cx).powi(2) + (z as f32 - cz).powi(2)).sqrt();
                        values[x * zr + z] *= radial_falloff(d, *inner_edge * max_dist, max_dist);
                    }
                }
                normalize_in_place(&mut values);
            }
            IslandMask::MultiCenter { centers, inner_edge } => {
                let max_dist = (xr.max(zr) as f32) * 0.5;
                let mountain_centers: Vec<MountainCenter> = (0..*centers)
                    .map(|_| MountainCenter {
                        x: rng.random_range(0.0..xr as f32),
                        z: rng.random_range(0.0..zr as f32),
                        radius: rng.random_range(0.25..1.0) * max_dist,
                        weight: rng.random_range(0.7..=1.0),
                    })
                    .collect();

                for x in 0..xr {
                    for z in 0..zr {
                        let mut mask = 0.0f32;
                        for c in &mountain_centers {
                            let d = ((x as f32 - c.x).powi(2) + (z as f32 - c.z).powi(2)).sqrt();
                            let falloff =
                                c.weight * radial_falloff(d, *inner_edge * c.radius, c.radius);
                            mask = mask.max(falloff);
                        }
                        values[x * zr + z] *= mask;
                    }
                }
                normalize_in_place(&mut values);
            }
        }

        for v in values.iter_mut() {
            *v = v.clamp(0.0, 1.0);
        }

        tracing::debug!(
            seed = params.seed,
            x_range = xr,
            z_range = zr,
            octaves = params.octaves,
            "heightfield generated"
        );

        Self {
            values,
            x_range: xr,
            z_range: zr,
            y_range: params.y_range,
        }
    }

    /// Build a heightfield from explicit values (clamped to [0, 1]).
    ///
    /// `values.len()` must equal `x_range * z_range`.
    pub fn from_values(values: Vec<f32>, x_range: usize, z_range: usize, y_range: f32) -> Self {
        assert_eq!(values.len(), x_range * z_range, "raster size mismatch");
        let values = values.into_iter().map(|v| v.clamp(0.0, 1.0)).collect();
        Self {
            values,
            x_range,
            z_range,
            y_range,
        }
    }

    /// Normalized height fraction at raster cell `(x, z)`, clamped to the
    /// raster borders.
    pub fn get(&self, x: usize, z: usize) -> f32 {
        let x = x.min(self.x_range - 1);
        let z = z.min(self.z_range - 1);
        self.values[x * self.z_range + z]
    }

    /// Raster cells along world X.
    pub fn x_range(&self) -> usize {
        self.x_range
    }

    /// Raster cells along world Z.
    pub fn z_range(&self) -> usize {
        self.z_range
    }

    /// Vertical scale in world units.
    pub fn y_range(&self) -> f32 {
        self.y_range
    }

    /// The raw raster values, x-major.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Rescale `values` into [0, 1] via inverse-lerp against the global min/max.
///
/// If the raster is degenerate (min == max) every cell becomes 0 rather than
/// dividing by zero; a fully flattened terrain is a valid output.
fn normalize_in_place(values: &mut [f32]) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    let span = max - min;
    if span <= f32::EPSILON {
        values.fill(0.0);
        return;
    }
    for v in values.iter_mut() {
        *v = (*v - min) / span;
    }
}

/// Smoothstep radial falloff: 1 inside `inner`, 0 at `outer` and beyond.
fn radial_falloff(dist: f32, inner: f32, outer: f32) -> f32 {
    if dist <= inner {
        return 1.0;
    }
    if dist >= outer || outer <= inner {
        return 0.0;
    }
    let t = (dist - inner) / (outer - inner);
    1.0 - (t * t * (3.0 - 2.0 * t))
}
