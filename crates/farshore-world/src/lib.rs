//! Top-level world assembly: terrain, water, and population wired together
//! behind a single per-frame tick.

mod world;

pub use world::{FarshoreWorld, WorldAssets, WorldTickResult};
