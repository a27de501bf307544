//! Low-frequency chunk blanket: one overlay object per chunk around the
//! anchor, with hard eviction outside the keep radius.

use farshore_place::{AssetRef, PlacementHandle, Placer};
use farshore_render::InstanceTransform;
use farshore_terrain::TerrainQuery;
use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::ChunkCoord;

#[derive(Clone, Debug)]
pub struct BlanketConfig {
    pub asset: AssetRef,
    pub chunk_size: f32,
    /// Chebyshev radius, in chunks, of the kept square around the anchor.
    pub radius_chunks: i32,
    /// Vertical offset above the terrain surface at the chunk center.
    pub height_offset: f32,
    pub scale: f32,
    /// Minimum seconds between sweeps.
    pub update_interval: f32,
}

impl Default for BlanketConfig {
    fn default() -> Self {
        Self {
            asset: AssetRef(0),
            chunk_size: 32.0,
            radius_chunks: 3,
            height_offset: 8.0,
            scale: 1.0,
            update_interval: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlanketTickResult {
    pub placed: usize,
    pub removed: usize,
}

/// Keeps exactly one placed object per chunk inside the keep radius.
///
/// Unlike the instanced streamer this destroys placements as soon as their
/// chunk leaves the radius; the blanket is cheap to re-place and caching it
/// would pin scene objects forever.
pub struct ChunkBlanketSpawner {
    config: BlanketConfig,
    placed: FxHashMap<ChunkCoord, PlacementHandle>,
    since_sweep: f32,
}

impl ChunkBlanketSpawner {
    pub fn new(config: BlanketConfig) -> Self {
        assert!(config.chunk_size > 0.0, "chunk size must be positive");
        Self {
            config,
            placed: FxHashMap::default(),
            since_sweep: f32::MAX, // first update sweeps immediately
        }
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn covers(&self, coord: ChunkCoord) -> bool {
        self.placed.contains_key(&coord)
    }

    /// Advances the throttle; sweeps when the interval elapsed.
    pub fn update(
        &mut self,
        dt: f32,
        anchor: Vec3,
        terrain: &dyn TerrainQuery,
        placer: &mut dyn Placer,
    ) -> BlanketTickResult {
        self.since_sweep = (self.since_sweep + dt).min(f32::MAX);
        if self.since_sweep < self.config.update_interval {
            return BlanketTickResult::default();
        }
        self.since_sweep = 0.0;
        self.sweep(anchor, terrain, placer)
    }

    /// Destroys every blanket placement.
    pub fn clear(&mut self, placer: &mut dyn Placer) {
        for (_, handle) in self.placed.drain() {
            placer.destroy(handle);
        }
    }

    fn sweep(
        &mut self,
        anchor: Vec3,
        terrain: &dyn TerrainQuery,
        placer: &mut dyn Placer,
    ) -> BlanketTickResult {
        let c = &self.config;
        let anchor_chunk = ChunkCoord::from_world(anchor.x, anchor.z, c.chunk_size);
        let mut result = BlanketTickResult::default();

        // Evict chunks outside the keep square.
        let radius = c.radius_chunks;
        let stale: Vec<ChunkCoord> = self
            .placed
            .keys()
            .filter(|coord| {
                (coord.x - anchor_chunk.x).abs() > radius
                    || (coord.z - anchor_chunk.z).abs() > radius
            })
            .copied()
            .collect();
        for coord in stale {
            if let Some(handle) = self.placed.remove(&coord) {
                placer.destroy(handle);
                result.removed += 1;
            }
        }

        // Fill the gaps.
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                let coord = ChunkCoord::new(anchor_chunk.x + dx, anchor_chunk.z + dz);
                if self.placed.contains_key(&coord) {
                    continue;
                }
                let center = coord.center(c.chunk_size);
                let y = terrain.height_at(center.x, center.y) + c.height_offset;
                let handle = placer.place(
                    c.asset,
                    InstanceTransform::new(
                        Vec3::new(center.x, y, center.y),
                        Quat::IDENTITY,
                        c.scale,
                    ),
                );
                self.placed.insert(coord, handle);
                result.placed += 1;
            }
        }

        if result.placed > 0 || result.removed > 0 {
            trace!(
                placed = result.placed,
                removed = result.removed,
                total = self.placed.len(),
                "blanket sweep"
            );
        }
        result
    }
}
