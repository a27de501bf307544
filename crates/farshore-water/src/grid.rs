//! Coarse cell grid laid over a heightfield raster.

/// Raster-space bounds of one coarse cell, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBounds {
    pub start_x: i32,
    pub end_x: i32,
    pub start_z: i32,
    pub end_z: i32,
}

impl GridBounds {
    /// Sentinel for a degenerate cell that covers no raster samples.
    pub const INVALID: Self = Self {
        start_x: -1,
        end_x: -1,
        start_z: -1,
        end_z: -1,
    };

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Center of the cell in raster coordinates.
    pub fn center(&self) -> (f32, f32) {
        (
            (self.start_x + self.end_x + 1) as f32 * 0.5,
            (self.start_z + self.end_z + 1) as f32 * 0.5,
        )
    }

    /// Raster sample closest to the cell center, by truncation.
    pub fn center_sample(&self) -> (usize, usize) {
        let (cx, cz) = self.center();
        (cx as usize, cz as usize)
    }
}

/// Partition of an `x_range` x `z_range` raster into a coarse grid.
///
/// Each coarse cell maps to an inclusive raster span. When the grid is finer
/// than the raster some cells collapse to [`GridBounds::INVALID`] and are
/// skipped by consumers.
pub struct RegionGrid {
    grid_x: usize,
    grid_z: usize,
    bounds: Vec<GridBounds>,
}

impl RegionGrid {
    pub fn new(x_range: usize, z_range: usize, grid_x: usize, grid_z: usize) -> Self {
        assert!(grid_x > 0 && grid_z > 0, "grid dimensions must be non-zero");
        let cell_x = x_range as f32 / grid_x as f32;
        let cell_z = z_range as f32 / grid_z as f32;

        let mut bounds = Vec::with_capacity(grid_x * grid_z);
        for gx in 0..grid_x {
            for gz in 0..grid_z {
                bounds.push(cell_bounds(gx, gz, cell_x, cell_z, x_range, z_range));
            }
        }
        Self {
            grid_x,
            grid_z,
            bounds,
        }
    }

    pub fn grid_x(&self) -> usize {
        self.grid_x
    }

    pub fn grid_z(&self) -> usize {
        self.grid_z
    }

    /// Bounds for a coarse cell. Out-of-range coordinates yield
    /// [`GridBounds::INVALID`] rather than panicking.
    pub fn bounds(&self, gx: usize, gz: usize) -> GridBounds {
        if gx >= self.grid_x || gz >= self.grid_z {
            return GridBounds::INVALID;
        }
        self.bounds[gx * self.grid_z + gz]
    }

    pub fn in_bounds(&self, gx: i32, gz: i32) -> bool {
        gx >= 0 && gz >= 0 && (gx as usize) < self.grid_x && (gz as usize) < self.grid_z
    }
}

fn cell_bounds(
    gx: usize,
    gz: usize,
    cell_x: f32,
    cell_z: f32,
    x_range: usize,
    z_range: usize,
) -> GridBounds {
    let start_x = (gx as f32 * cell_x).floor() as i32;
    let end_x = (((gx + 1) as f32 * cell_x).floor() as i32 - 1).min(x_range as i32 - 1);
    let start_z = (gz as f32 * cell_z).floor() as i32;
    let end_z = (((gz + 1) as f32 * cell_z).floor() as i32 - 1).min(z_range as i32 - 1);

    if start_x > end_x || start_z > end_z {
        GridBounds::INVALID
    } else {
        GridBounds {
            start_x,
            end_x,
            start_z,
            end_z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_partition() {
        // 8 samples over 4 cells: every cell spans exactly 2 samples.
        let grid = RegionGrid::new(8, 8, 4, 4);
        let b = grid.bounds(0, 0);
        assert_eq!((b.start_x, b.end_x), (0, 1));
        let b = grid.bounds(3, 3);
        assert_eq!((b.start_x, b.end_x), (6, 7));
        assert_eq!((b.start_z, b.end_z), (6, 7));
    }

    #[test]
    fn test_uneven_partition_covers_raster() {
        // 10 samples over 3 cells: spans 0..=2, 3..=5, 6..=9.
        let grid = RegionGrid::new(10, 10, 3, 3);
        assert_eq!(grid.bounds(0, 0).end_x, 2);
        assert_eq!(grid.bounds(1, 0).start_x, 3);
        assert_eq!(grid.bounds(2, 0).end_x, 9);
    }

    #[test]
    fn test_degenerate_cells_are_invalid() {
        // Grid finer than the raster: some cells cover no samples.
        let grid = RegionGrid::new(2, 2, 4, 4);
        let invalid = (0..4)
            .flat_map(|gx| (0..4).map(move |gz| (gx, gz)))
            .filter(|&(gx, gz)| !grid.bounds(gx, gz).is_valid())
            .count();
        assert!(invalid > 0, "expected degenerate cells on over-fine grid");
    }

    #[test]
    fn test_out_of_range_coords_are_invalid() {
        let grid = RegionGrid::new(8, 8, 4, 4);
        assert_eq!(grid.bounds(4, 0), GridBounds::INVALID);
        assert_eq!(grid.bounds(0, 99), GridBounds::INVALID);
    }

    #[test]
    fn test_center_sample_inside_span() {
        let grid = RegionGrid::new(9, 9, 3, 3);
        let b = grid.bounds(1, 1);
        let (cx, cz) = b.center_sample();
        assert!(cx as i32 >= b.start_x && cx as i32 <= b.end_x);
        assert!(cz as i32 >= b.start_z && cz as i32 <= b.end_z);
    }

    #[test]
    fn test_center_of_odd_span() {
        let b = GridBounds {
            start_x: 0,
            end_x: 2,
            start_z: 0,
            end_z: 2,
        };
        assert_eq!(b.center(), (1.5, 1.5));
        assert_eq!(b.center_sample(), (1, 1));
    }
}
