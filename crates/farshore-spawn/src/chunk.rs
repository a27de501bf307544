//! Chunk addressing on the ground plane.

use farshore_render::InstanceTransform;
use glam::Vec2;

/// Integer chunk address, from flooring world XZ by the chunk size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn from_world(world_x: f32, world_z: f32, chunk_size: f32) -> Self {
        Self {
            x: (world_x / chunk_size).floor() as i32,
            z: (world_z / chunk_size).floor() as i32,
        }
    }

    /// World-space center of the chunk.
    pub fn center(&self, chunk_size: f32) -> Vec2 {
        Vec2::new(
            (self.x as f32 + 0.5) * chunk_size,
            (self.z as f32 + 0.5) * chunk_size,
        )
    }

    /// World-space minimum corner of the chunk.
    pub fn min_corner(&self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_size, self.z as f32 * chunk_size)
    }

    /// This chunk and its 8 surrounding neighbors.
    pub fn with_neighbors(self) -> impl Iterator<Item = ChunkCoord> {
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dz| ChunkCoord::new(self.x + dx, self.z + dz)))
    }

    /// True when `other` is this chunk or one of its 8 neighbors.
    pub fn adjacent_to(&self, other: ChunkCoord) -> bool {
        (self.x - other.x).abs() <= 1 && (self.z - other.z).abs() <= 1
    }
}

/// Generated instance data for one chunk. Instances are immutable after
/// generation; only the activation flag changes per frame.
#[derive(Clone, Debug, Default)]
pub struct ObjectChunk {
    pub transforms: Vec<InstanceTransform>,
    pub tints: Vec<[f32; 4]>,
    pub active: bool,
}
