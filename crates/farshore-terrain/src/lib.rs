//! Terrain synthesis for Farshore.
//!
//! Generates the normalized heightfield raster the rest of the world pipeline
//! samples from, and exposes the [`TerrainQuery`] collaborator trait used by
//! the spawners.

mod heightfield;
mod query;
mod seed;

pub use heightfield::{Heightfield, HeightfieldParams, IslandMask};
pub use query::{HeightfieldTerrain, TerrainExtent, TerrainQuery};
pub use seed::{chunk_rng, derive_chunk_seed};
