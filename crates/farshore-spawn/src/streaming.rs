//! Anchor-gated chunk streaming for instanced ground cover.
//!
//! Chunks generate lazily as the anchor (player) moves, stay cached once
//! generated, and toggle active per frame from a distance plus view-cone
//! test. The anchor's own chunk and its 8 neighbors are always active so
//! cover never pops out underfoot.

use std::sync::Arc;

use farshore_field::{ScalarField, TintField};
use farshore_render::{
    submit_batched, CameraPose, FovCuller, FrameStats, InstanceTransform, InstancedRenderer,
    MaterialRef, MeshRef,
};
use farshore_terrain::{chunk_rng, TerrainQuery};
use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{ChunkCoord, ObjectChunk};

#[derive(Clone, Debug)]
pub struct StreamingConfig {
    pub world_seed: u64,
    /// Chunk edge length in world units.
    pub chunk_size: f32,
    /// Candidate positions rolled per chunk.
    pub candidates_per_chunk: usize,
    /// Hard cap on accepted instances per chunk.
    pub max_per_chunk: usize,
    pub culling_distance: f32,
    pub fov_degrees: f32,
    pub fov_enabled: bool,
    /// Blue-noise acceptance threshold; candidates keep only where the mask
    /// sample exceeds it.
    pub noise_threshold: f32,
    /// World-to-UV scale for the blue-noise mask.
    pub noise_scale: f32,
    /// Accepted surface height band, as fractions of the vertical scale.
    pub min_height: f32,
    pub max_height: f32,
    pub max_slope_degrees: f32,
    /// Vertical sink applied to accepted positions.
    pub y_offset: f32,
    pub scale_min: f32,
    pub scale_max: f32,
    /// Random tilt range on both horizontal axes, degrees.
    pub tilt_degrees: f32,
    pub mesh: MeshRef,
    pub material: MaterialRef,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            world_seed: 0,
            chunk_size: 32.0,
            candidates_per_chunk: 100,
            max_per_chunk: 1000,
            culling_distance: 200.0,
            fov_degrees: 100.0,
            fov_enabled: true,
            noise_threshold: 0.3,
            noise_scale: 0.01,
            min_height: 0.0,
            max_height: 1.0,
            max_slope_degrees: 45.0,
            y_offset: -0.05,
            scale_min: 0.8,
            scale_max: 1.2,
            tilt_degrees: 5.0,
            mesh: MeshRef(0),
            material: MaterialRef(0),
        }
    }
}

/// What one [`ChunkStreamingSpawner::update`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamTickResult {
    /// The anchor crossed a chunk boundary this tick.
    pub anchor_moved: bool,
    /// Chunks generated this tick.
    pub generated: usize,
    /// Chunks that went inactive -> active.
    pub activated: usize,
    /// Chunks that went active -> inactive.
    pub deactivated: usize,
}

pub struct ChunkStreamingSpawner {
    config: StreamingConfig,
    terrain: Arc<dyn TerrainQuery + Send + Sync>,
    noise_mask: Option<Arc<ScalarField>>,
    tint_field: Option<TintField>,
    chunks: FxHashMap<ChunkCoord, ObjectChunk>,
    last_anchor_chunk: Option<ChunkCoord>,
}

impl ChunkStreamingSpawner {
    pub fn new(config: StreamingConfig, terrain: Arc<dyn TerrainQuery + Send + Sync>) -> Self {
        assert!(config.chunk_size > 0.0, "chunk size must be positive");
        Self {
            config,
            terrain,
            noise_mask: None,
            tint_field: None,
            chunks: FxHashMap::default(),
            last_anchor_chunk: None,
        }
    }

    /// Installs a blue-noise acceptance mask. Without one, the noise test
    /// falls back to a plain RNG roll against the same threshold.
    pub fn with_noise_mask(mut self, mask: Arc<ScalarField>) -> Self {
        self.noise_mask = Some(mask);
        self
    }

    /// Installs per-instance tinting.
    pub fn with_tint_field(mut self, tint: TintField) -> Self {
        self.tint_field = Some(tint);
        self
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn active_count(&self) -> usize {
        self.chunks.values().filter(|c| c.active).count()
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&ObjectChunk> {
        self.chunks.get(&coord)
    }

    /// Drops all cached chunks; they regenerate on the next update.
    pub fn reset(&mut self) {
        self.chunks.clear();
        self.last_anchor_chunk = None;
    }

    /// Advances streaming for one frame. Generation only runs when the
    /// anchor enters a new chunk; the visibility pass runs every call.
    pub fn update(&mut self, anchor: Vec3, camera: &CameraPose) -> StreamTickResult {
        let anchor_chunk = ChunkCoord::from_world(anchor.x, anchor.z, self.config.chunk_size);
        let anchor_moved = self.last_anchor_chunk != Some(anchor_chunk);

        let mut result = StreamTickResult {
            anchor_moved,
            ..StreamTickResult::default()
        };

        if anchor_moved {
            result.generated = self.generate_around(anchor_chunk);
            self.last_anchor_chunk = Some(anchor_chunk);
            debug!(
                chunk_x = anchor_chunk.x,
                chunk_z = anchor_chunk.z,
                generated = result.generated,
                "anchor entered new chunk"
            );
        }

        // Distance is measured from the anchor; the cone test uses the
        // camera. With the toggle off only distance applies.
        let cone = self
            .config
            .fov_enabled
            .then(|| FovCuller::new(self.config.fov_degrees, f32::INFINITY));
        let anchor_2d = glam::Vec2::new(anchor.x, anchor.z);
        let cull_sq = self.config.culling_distance * self.config.culling_distance;

        for (coord, chunk) in &mut self.chunks {
            let center = coord.center(self.config.chunk_size);
            let visible = coord.adjacent_to(anchor_chunk)
                || (center.distance_squared(anchor_2d) <= cull_sq
                    && cone
                        .as_ref()
                        .is_none_or(|c| c.visible(camera, Vec3::new(center.x, 0.0, center.y))));
            if visible && !chunk.active {
                result.activated += 1;
            } else if !visible && chunk.active {
                result.deactivated += 1;
            }
            chunk.active = visible;
        }

        result
    }

    /// Submits one batched draw per active chunk.
    pub fn render(&self, renderer: &mut dyn InstancedRenderer) -> FrameStats {
        let mut stats = FrameStats::default();
        for chunk in self.chunks.values() {
            if !chunk.active || chunk.transforms.is_empty() {
                continue;
            }
            let tints = (!chunk.tints.is_empty()).then_some(chunk.tints.as_slice());
            stats.merge(submit_batched(
                renderer,
                self.config.mesh,
                self.config.material,
                &chunk.transforms,
                tints,
            ));
        }
        stats
    }

    /// Generates every missing chunk within culling range of the anchor
    /// chunk. Returns the number generated.
    fn generate_around(&mut self, anchor_chunk: ChunkCoord) -> usize {
        let radius = (self.config.culling_distance / self.config.chunk_size).ceil() as i32;
        let mut generated = 0;
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                let coord = ChunkCoord::new(anchor_chunk.x + dx, anchor_chunk.z + dz);
                if !self.chunks.contains_key(&coord) {
                    let chunk = self.generate_chunk(coord);
                    self.chunks.insert(coord, chunk);
                    generated += 1;
                }
            }
        }
        generated
    }

    fn generate_chunk(&self, coord: ChunkCoord) -> ObjectChunk {
        let c = &self.config;
        let mut rng = chunk_rng(c.world_seed, coord.x, coord.z);
        let corner = coord.min_corner(c.chunk_size);
        let extent = self.terrain.extent();

        let mut chunk = ObjectChunk::default();
        for _ in 0..c.candidates_per_chunk {
            if chunk.transforms.len() >= c.max_per_chunk {
                break;
            }
            let wx = corner.x + rng.random_range(0.0..c.chunk_size);
            let wz = corner.y + rng.random_range(0.0..c.chunk_size);

            if wx < 0.0 || wz < 0.0 || wx >= extent.x_range || wz >= extent.z_range {
                continue;
            }
            // Blue-noise accept; without a mask a plain RNG roll keeps the
            // same expected density.
            let noise = match &self.noise_mask {
                Some(mask) => {
                    let u = (wx * c.noise_scale).rem_euclid(1.0);
                    let v = (wz * c.noise_scale).rem_euclid(1.0);
                    mask.sample_bilinear(u, v)
                }
                None => rng.random::<f32>(),
            };
            if noise <= c.noise_threshold {
                continue;
            }
            let h = self.terrain.height_at(wx, wz);
            let h_fraction = h / extent.y_range;
            if h_fraction < c.min_height || h_fraction > c.max_height {
                continue;
            }
            if self.terrain.slope_at(wx, wz) > c.max_slope_degrees {
                continue;
            }

            let yaw = rng.random_range(0.0..360.0f32).to_radians();
            let tilt_x = rng
                .random_range(-c.tilt_degrees..=c.tilt_degrees)
                .to_radians();
            let tilt_z = rng
                .random_range(-c.tilt_degrees..=c.tilt_degrees)
                .to_radians();
            let scale = rng.random_range(c.scale_min..=c.scale_max);

            chunk.transforms.push(InstanceTransform::new(
                Vec3::new(wx, h + c.y_offset, wz),
                Quat::from_euler(EulerRot::YXZ, yaw, tilt_x, tilt_z),
                scale,
            ));
            if let Some(tint) = &self.tint_field {
                chunk.tints.push(tint.tint_at(wx, wz));
            }
        }
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farshore_render::RecordingRenderer;
    use farshore_terrain::{Heightfield, HeightfieldTerrain};

    fn flat_terrain(height: f32) -> Arc<HeightfieldTerrain> {
        // 256x256 raster, y_range 10: surface at `height * 10`.
        let field = Heightfield::from_values(vec![height; 256 * 256], 256, 256, 10.0);
        Arc::new(HeightfieldTerrain::new(Arc::new(field)))
    }

    fn test_config() -> StreamingConfig {
        StreamingConfig {
            world_seed: 7,
            chunk_size: 16.0,
            candidates_per_chunk: 50,
            culling_distance: 48.0,
            ..StreamingConfig::default()
        }
    }

    fn camera_at(pos: Vec3) -> CameraPose {
        CameraPose::new(pos, Vec3::X)
    }

    #[test]
    fn test_first_update_generates_chunks() {
        let mut spawner = ChunkStreamingSpawner::new(test_config(), flat_terrain(0.5));
        let anchor = Vec3::new(128.0, 0.0, 128.0);
        let result = spawner.update(anchor, &camera_at(anchor));
        assert!(result.anchor_moved);
        assert!(result.generated > 0);
        assert_eq!(spawner.chunk_count(), result.generated);
    }

    #[test]
    fn test_update_without_anchor_move_generates_nothing() {
        let mut spawner = ChunkStreamingSpawner::new(test_config(), flat_terrain(0.5));
        let anchor = Vec3::new(128.0, 0.0, 128.0);
        spawner.update(anchor, &camera_at(anchor));
        let result = spawner.update(anchor + Vec3::new(1.0, 0.0, 0.0), &camera_at(anchor));
        assert!(!result.anchor_moved);
        assert_eq!(result.generated, 0);
    }

    #[test]
    fn test_chunks_are_deterministic_per_seed() {
        let anchor = Vec3::new(128.0, 0.0, 128.0);
        let coord = ChunkCoord::from_world(anchor.x, anchor.z, 16.0);

        let mut a = ChunkStreamingSpawner::new(test_config(), flat_terrain(0.5));
        let mut b = ChunkStreamingSpawner::new(test_config(), flat_terrain(0.5));
        a.update(anchor, &camera_at(anchor));
        b.update(anchor, &camera_at(anchor));

        let ca = a.chunk(coord).expect("chunk generated");
        let cb = b.chunk(coord).expect("chunk generated");
        assert_eq!(ca.transforms, cb.transforms, "same seed must reproduce chunks");
    }

    #[test]
    fn test_anchor_neighbors_active_even_behind_camera() {
        let mut spawner = ChunkStreamingSpawner::new(test_config(), flat_terrain(0.5));
        let anchor = Vec3::new(128.0, 0.0, 128.0);
        // Camera looking away from everything.
        spawner.update(anchor, &camera_at(anchor));
        let anchor_chunk = ChunkCoord::from_world(anchor.x, anchor.z, 16.0);
        for coord in anchor_chunk.with_neighbors() {
            let chunk = spawner.chunk(coord).expect("neighbor generated");
            assert!(chunk.active, "neighbor chunk {coord:?} must stay active");
        }
    }

    #[test]
    fn test_distant_chunk_goes_inactive() {
        let mut spawner = ChunkStreamingSpawner::new(test_config(), flat_terrain(0.5));
        let first = Vec3::new(40.0, 0.0, 40.0);
        spawner.update(first, &camera_at(first));
        // Move far away; old chunks stay cached but deactivate.
        let second = Vec3::new(240.0, 0.0, 240.0);
        let result = spawner.update(second, &camera_at(second));
        assert!(result.deactivated > 0, "far chunks should deactivate");
        let old = ChunkCoord::from_world(first.x, first.z, 16.0);
        assert!(!spawner.chunk(old).unwrap().active);
    }

    #[test]
    fn test_height_band_rejects_everything() {
        let mut config = test_config();
        config.min_height = 0.6; // surface fraction sits at 0.5
        let mut spawner = ChunkStreamingSpawner::new(config, flat_terrain(0.5));
        let anchor = Vec3::new(128.0, 0.0, 128.0);
        spawner.update(anchor, &camera_at(anchor));
        let total: usize = (0..16)
            .flat_map(|x| (0..16).map(move |z| ChunkCoord::new(x, z)))
            .filter_map(|c| spawner.chunk(c))
            .map(|c| c.transforms.len())
            .sum();
        assert_eq!(total, 0, "no instances outside the height band");
    }

    #[test]
    fn test_steep_slope_rejects_everything() {
        // Ramp rising the full 100 units over 256 cells: ~57 degrees.
        let values: Vec<f32> = (0..256)
            .flat_map(|x| std::iter::repeat_n(x as f32 / 255.0, 256))
            .collect();
        let field = Heightfield::from_values(values, 256, 256, 400.0);
        let terrain = Arc::new(HeightfieldTerrain::new(Arc::new(field)));

        let mut spawner = ChunkStreamingSpawner::new(test_config(), terrain);
        let anchor = Vec3::new(128.0, 0.0, 128.0);
        spawner.update(anchor, &camera_at(anchor));
        let anchor_chunk = ChunkCoord::from_world(anchor.x, anchor.z, 16.0);
        let chunk = spawner.chunk(anchor_chunk).unwrap();
        assert!(chunk.transforms.is_empty(), "steep ground must reject all");
    }

    #[test]
    fn test_noise_mask_gates_acceptance() {
        let anchor = Vec3::new(128.0, 0.0, 128.0);
        let coord = ChunkCoord::from_world(anchor.x, anchor.z, 16.0);

        let dark = Arc::new(ScalarField::from_fn(4, 4, |_, _| 0.0));
        let mut blocked =
            ChunkStreamingSpawner::new(test_config(), flat_terrain(0.5)).with_noise_mask(dark);
        blocked.update(anchor, &camera_at(anchor));
        assert!(blocked.chunk(coord).unwrap().transforms.is_empty());

        let bright = Arc::new(ScalarField::from_fn(4, 4, |_, _| 1.0));
        let mut open =
            ChunkStreamingSpawner::new(test_config(), flat_terrain(0.5)).with_noise_mask(bright);
        open.update(anchor, &camera_at(anchor));
        assert!(!open.chunk(coord).unwrap().transforms.is_empty());
    }

    #[test]
    fn test_max_per_chunk_cap() {
        let mut config = test_config();
        config.candidates_per_chunk = 200;
        config.max_per_chunk = 10;
        let mut spawner = ChunkStreamingSpawner::new(config, flat_terrain(0.5));
        let anchor = Vec3::new(128.0, 0.0, 128.0);
        spawner.update(anchor, &camera_at(anchor));
        for coord in ChunkCoord::from_world(128.0, 128.0, 16.0).with_neighbors() {
            let chunk = spawner.chunk(coord).unwrap();
            assert!(chunk.transforms.len() <= 10, "cap exceeded");
        }
    }

    #[test]
    fn test_render_submits_active_chunks_only() {
        let mut spawner = ChunkStreamingSpawner::new(test_config(), flat_terrain(0.5));
        let anchor = Vec3::new(128.0, 0.0, 128.0);
        spawner.update(anchor, &camera_at(anchor));

        let mut renderer = RecordingRenderer::new();
        let stats = spawner.render(&mut renderer);
        assert!(stats.draw_calls > 0, "active chunks should draw");
        let active_instances: usize = (0..16)
            .flat_map(|x| (0..16).map(move |z| ChunkCoord::new(x, z)))
            .filter_map(|c| spawner.chunk(c))
            .filter(|c| c.active)
            .map(|c| c.transforms.len())
            .sum();
        assert_eq!(stats.instances, active_instances);
    }

    #[test]
    fn test_tints_generated_alongside_transforms() {
        let mut spawner = ChunkStreamingSpawner::new(test_config(), flat_terrain(0.5))
            .with_tint_field(TintField::new(7));
        let anchor = Vec3::new(128.0, 0.0, 128.0);
        spawner.update(anchor, &camera_at(anchor));
        let chunk = spawner
            .chunk(ChunkCoord::from_world(anchor.x, anchor.z, 16.0))
            .unwrap();
        assert_eq!(chunk.transforms.len(), chunk.tints.len());
    }
}
