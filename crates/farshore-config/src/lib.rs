//! Configuration for the world generator.
//!
//! Runtime-tunable settings that persist to disk as RON files, with
//! hot-reload detection and forward/backward compatible serialization.

mod config;

pub use config::{
    BlanketSection, Config, ConfigError, DebugSection, DiscreteSection, IslandMaskMode,
    SpawnTypeSection, StreamingSection, TerrainSection, WaterSection, CONFIG_FILE,
};
