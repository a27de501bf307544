//! World population: streamed instanced cover, discrete objects, and the
//! chunk blanket overlay.

mod blanket;
mod chunk;
mod discrete;
mod streaming;

pub use blanket::{BlanketConfig, BlanketTickResult, ChunkBlanketSpawner};
pub use chunk::{ChunkCoord, ObjectChunk};
pub use discrete::{DiscreteConfig, DiscreteSpawner, SpawnObjectType, SpawnProgress, SpawnStatus};
pub use streaming::{ChunkStreamingSpawner, StreamTickResult, StreamingConfig};
