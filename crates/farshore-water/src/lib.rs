//! Coarse region grid over the heightfield and enclosed water detection.

mod detector;
mod grid;

pub use detector::{CellState, WaterBodyDetector, WaterCluster, WaterDetectConfig};
pub use grid::{GridBounds, RegionGrid};
