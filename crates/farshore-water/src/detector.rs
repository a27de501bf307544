//! Enclosed land cluster detection over the coarse region grid.

use farshore_terrain::Heightfield;
use glam::Vec3;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::grid::RegionGrid;

/// Per-cell classification derived from the height at the cell center.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellState {
    /// Outside the skip band, or a degenerate grid cell. Never clustered
    /// and never counts toward enclosure.
    Skip,
    Land,
    Water,
}

#[derive(Clone, Debug)]
pub struct WaterDetectConfig {
    pub grid_x: usize,
    pub grid_z: usize,
    /// Heights outside `[skip_low, skip_high]` are ignored entirely.
    pub skip_low: f32,
    pub skip_high: f32,
    /// Heights inside `[water_low, water_high]` classify as water.
    pub water_low: f32,
    pub water_high: f32,
    /// Water surface height as a fraction of the vertical scale.
    pub water_height: f32,
}

impl Default for WaterDetectConfig {
    fn default() -> Self {
        Self {
            grid_x: 64,
            grid_z: 64,
            skip_low: 0.0,
            skip_high: 1.0,
            water_low: 0.1,
            water_high: 0.3,
            water_height: 0.25,
        }
    }
}

/// One connected component of land cells fully surrounded by water, plus the
/// surrounding shoreline cells collected after the enclosure test.
#[derive(Clone, Debug)]
pub struct WaterCluster {
    /// Member cells of the connected component, as `(grid_x, grid_z)`.
    pub cells: Vec<(usize, usize)>,
    /// Adjacent non-member cells, for shoreline coverage.
    pub border: Vec<(usize, usize)>,
}

/// Classifies coarse grid cells from the heightfield and flood-fills land
/// components, keeping only those whose entire 8-neighborhood is water or
/// in-component.
pub struct WaterBodyDetector {
    config: WaterDetectConfig,
}

const NEIGHBORS_4: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const NEIGHBORS_8: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

impl WaterBodyDetector {
    pub fn new(config: WaterDetectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WaterDetectConfig {
        &self.config
    }

    /// Runs one full detection pass over the heightfield.
    pub fn process(&self, field: &Heightfield) -> Vec<WaterCluster> {
        let grid = self.grid_for(field);
        let states = self.classify(field, &grid);
        let clusters = self.find_enclosed(&grid, &states);
        debug!(
            grid_x = self.config.grid_x,
            grid_z = self.config.grid_z,
            clusters = clusters.len(),
            "water detection pass complete"
        );
        clusters
    }

    /// World-space positions for water surface instances, one per cluster
    /// cell (members and border), at the configured water height.
    pub fn water_plane_positions(
        &self,
        field: &Heightfield,
        clusters: &[WaterCluster],
    ) -> Vec<Vec3> {
        let grid = self.grid_for(field);
        let y = self.config.water_height * field.y_range();
        let mut positions = Vec::new();
        for cluster in clusters {
            for &(gx, gz) in cluster.cells.iter().chain(cluster.border.iter()) {
                let bounds = grid.bounds(gx, gz);
                if !bounds.is_valid() {
                    continue;
                }
                let (cx, cz) = bounds.center();
                positions.push(Vec3::new(cx, y, cz));
            }
        }
        positions
    }

    fn grid_for(&self, field: &Heightfield) -> RegionGrid {
        RegionGrid::new(
            field.x_range(),
            field.z_range(),
            self.config.grid_x,
            self.config.grid_z,
        )
    }

    /// Classification raster, indexed `gx * grid_z + gz` to match the
    /// heightfield's x-major layout.
    fn classify(&self, field: &Heightfield, grid: &RegionGrid) -> Vec<CellState> {
        let c = &self.config;
        let mut states = Vec::with_capacity(c.grid_x * c.grid_z);
        for gx in 0..c.grid_x {
            for gz in 0..c.grid_z {
                let bounds = grid.bounds(gx, gz);
                if !bounds.is_valid() {
                    states.push(CellState::Skip);
                    continue;
                }
                let (sx, sz) = bounds.center_sample();
                let h = field.get(sx, sz);
                let state = if h < c.skip_low || h > c.skip_high {
                    CellState::Skip
                } else if h >= c.water_low && h <= c.water_high {
                    CellState::Water
                } else {
                    CellState::Land
                };
                states.push(state);
            }
        }
        states
    }

    fn find_enclosed(&self, grid: &RegionGrid, states: &[CellState]) -> Vec<WaterCluster> {
        let grid_z = self.config.grid_z;
        let state_at = |gx: i32, gz: i32| -> Option<CellState> {
            grid.in_bounds(gx, gz)
                .then(|| states[gx as usize * grid_z + gz as usize])
        };

        let (components, _) = self.fill_components(grid, states);
        components
            .into_iter()
            .filter_map(|members| self.close_off(&members, &state_at))
            .collect()
    }

    /// Iterative 4-connected fill over land cells. Returns the connected
    /// components and how many times each cell was pushed by the fill; every
    /// land cell is pushed exactly once.
    fn fill_components(
        &self,
        grid: &RegionGrid,
        states: &[CellState],
    ) -> (Vec<Vec<(usize, usize)>>, Vec<u32>) {
        let grid_z = self.config.grid_z;
        let state_at = |gx: i32, gz: i32| -> Option<CellState> {
            grid.in_bounds(gx, gz)
                .then(|| states[gx as usize * grid_z + gz as usize])
        };

        let mut visits = vec![0u32; states.len()];
        let mut components = Vec::new();

        for gx in 0..self.config.grid_x {
            for gz in 0..grid_z {
                let idx = gx * grid_z + gz;
                if visits[idx] > 0 || states[idx] != CellState::Land {
                    continue;
                }

                let mut members = Vec::new();
                let mut stack = vec![(gx, gz)];
                visits[idx] += 1;
                while let Some((cx, cz)) = stack.pop() {
                    members.push((cx, cz));
                    for (dx, dz) in NEIGHBORS_4 {
                        let (nx, nz) = (cx as i32 + dx, cz as i32 + dz);
                        if state_at(nx, nz) != Some(CellState::Land) {
                            continue;
                        }
                        let nidx = nx as usize * grid_z + nz as usize;
                        if visits[nidx] == 0 {
                            visits[nidx] += 1;
                            stack.push((nx as usize, nz as usize));
                        }
                    }
                }
                components.push(members);
            }
        }
        (components, visits)
    }

    /// Enclosure test plus border augmentation. Any neighbor that is Skip,
    /// out of bounds, or land outside the component rejects the cluster.
    fn close_off(
        &self,
        members: &[(usize, usize)],
        state_at: &impl Fn(i32, i32) -> Option<CellState>,
    ) -> Option<WaterCluster> {
        let member_set: FxHashSet<(usize, usize)> = members.iter().copied().collect();
        let mut border = Vec::new();
        let mut border_set = FxHashSet::default();

        for &(cx, cz) in members {
            for (dx, dz) in NEIGHBORS_8 {
                let (nx, nz) = (cx as i32 + dx, cz as i32 + dz);
                match state_at(nx, nz) {
                    Some(CellState::Water) => {
                        let cell = (nx as usize, nz as usize);
                        if border_set.insert(cell) {
                            border.push(cell);
                        }
                    }
                    Some(CellState::Land) if member_set.contains(&(nx as usize, nz as usize)) => {}
                    // Skip, out of bounds, or foreign land: not enclosed.
                    _ => return None,
                }
            }
        }

        Some(WaterCluster {
            cells: members.to_vec(),
            border,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 8x8 raster where a rectangular patch gets `inside` and everything
    /// else gets `outside`.
    fn patch_field(x0: usize, z0: usize, w: usize, inside: f32, outside: f32) -> Heightfield {
        let mut values = vec![outside; 64];
        for x in x0..x0 + w {
            for z in z0..z0 + w {
                values[x * 8 + z] = inside;
            }
        }
        Heightfield::from_values(values, 8, 8, 10.0)
    }

    fn detector() -> WaterBodyDetector {
        WaterBodyDetector::new(WaterDetectConfig {
            grid_x: 8,
            grid_z: 8,
            skip_low: 0.0,
            skip_high: 1.0,
            water_low: 0.1,
            water_high: 0.3,
            water_height: 0.25,
        })
    }

    #[test]
    fn test_enclosed_island_detected() {
        // 3x3 land patch in the middle of water.
        let field = patch_field(2, 2, 3, 0.5, 0.2);
        let clusters = detector().process(&field);
        assert_eq!(clusters.len(), 1, "expected exactly one cluster");
        assert_eq!(clusters[0].cells.len(), 9, "expected 9 member cells");
        assert_eq!(clusters[0].border.len(), 16, "expected 16 border cells");
    }

    #[test]
    fn test_border_excludes_members() {
        let field = patch_field(2, 2, 3, 0.5, 0.2);
        let clusters = detector().process(&field);
        let members: FxHashSet<_> = clusters[0].cells.iter().copied().collect();
        for cell in &clusters[0].border {
            assert!(!members.contains(cell), "border cell {cell:?} is a member");
        }
    }

    #[test]
    fn test_patch_touching_edge_not_enclosed() {
        // Land patch in the corner: neighbors fall out of the grid.
        let field = patch_field(0, 0, 3, 0.5, 0.2);
        let clusters = detector().process(&field);
        assert!(clusters.is_empty(), "edge-touching patch must not be enclosed");
    }

    #[test]
    fn test_skip_neighbor_rejects_enclosure() {
        let mut values = vec![0.2f32; 64];
        for x in 2..5 {
            for z in 2..5 {
                values[x * 8 + z] = 0.5;
            }
        }
        // Diagonal neighbor (1, 1) outside the skip band.
        values[9] = 0.95;
        let field = Heightfield::from_values(values, 8, 8, 10.0);
        let mut det = detector();
        det.config.skip_high = 0.9;
        let clusters = det.process(&field);
        assert!(clusters.is_empty(), "skip neighbor must reject enclosure");
    }

    #[test]
    fn test_two_separate_islands() {
        let mut values = vec![0.2f32; 256];
        // Two single-cell land patches on a 16x16 raster with a 16x16 grid.
        values[3 * 16 + 3] = 0.5;
        values[10 * 16 + 10] = 0.5;
        let field = Heightfield::from_values(values, 16, 16, 10.0);
        let det = WaterBodyDetector::new(WaterDetectConfig {
            grid_x: 16,
            grid_z: 16,
            ..WaterDetectConfig::default()
        });
        let clusters = det.process(&field);
        assert_eq!(clusters.len(), 2, "expected two independent clusters");
        for cluster in &clusters {
            assert_eq!(cluster.cells.len(), 1);
            assert_eq!(cluster.border.len(), 8);
        }
    }

    #[test]
    fn test_water_plane_height_and_count() {
        let field = patch_field(2, 2, 3, 0.5, 0.2);
        let det = detector();
        let clusters = det.process(&field);
        let planes = det.water_plane_positions(&field, &clusters);
        assert_eq!(planes.len(), 25, "one plane per member and border cell");
        for p in &planes {
            assert!((p.y - 2.5).abs() < 1e-6, "water plane at 0.25 * y_range");
        }
    }

    #[test]
    fn test_fill_visits_each_land_cell_once() {
        // Two disconnected land regions in open water.
        let mut values = vec![0.2f32; 64];
        for x in 1..4 {
            for z in 1..4 {
                values[x * 8 + z] = 0.5;
            }
        }
        values[6 * 8 + 6] = 0.5;
        let field = Heightfield::from_values(values, 8, 8, 10.0);

        let det = detector();
        let grid = det.grid_for(&field);
        let states = det.classify(&field, &grid);
        let (components, visits) = det.fill_components(&grid, &states);

        assert_eq!(components.len(), 2);
        for (idx, state) in states.iter().enumerate() {
            match state {
                CellState::Land => {
                    assert_eq!(visits[idx], 1, "land cell {idx} must be filled exactly once")
                }
                _ => assert_eq!(visits[idx], 0, "cell {idx} is not land, fill must skip it"),
            }
        }
        let total: usize = components.iter().map(Vec::len).sum();
        assert_eq!(visits.iter().map(|&v| v as usize).sum::<usize>(), total);
    }

    #[test]
    fn test_open_land_produces_no_clusters() {
        // All land, no water anywhere.
        let field = Heightfield::from_values(vec![0.5; 64], 8, 8, 10.0);
        let clusters = detector().process(&field);
        assert!(clusters.is_empty());
    }
}
