//! # Map
//!
//! Raster maps of the local frame used while evaluating candidates. Both the occupancy grid and
//! the terrain segmentation map are based upon the generic [`GridMap`] type.

// ------------------------------------------------------------------------------------------------
// MODS
// ------------------------------------------------------------------------------------------------

/// Main [`GridMap`] implementation
mod grid_map;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use grid_map::{GridMap, GridMapError};

use nalgebra::Vector2;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Occupancy grid, each cell holds the percentage probability that it is occupied, or
/// [`OCCUPANCY_UNKNOWN`].
pub type OccupancyGrid = GridMap<i8>;

/// Terrain segmentation map, each cell holds the traversal cost of the terrain class detected in
/// that cell.
pub type SegmentationMap = GridMap<f64>;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Value of a cell that has never been observed.
pub const OCCUPANCY_UNKNOWN: i8 = -1;

/// Value of a cell known to be free.
pub const OCCUPANCY_FREE: i8 = 0;

/// Value of a cell known to be occupied.
pub const OCCUPANCY_OCCUPIED: i8 = 100;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OccupancyGrid {
    /// Distance from the position to the centre of the nearest cell within `radius_m` whose
    /// occupancy is at least `threshold`. Unknown cells are never considered occupied.
    pub fn nearest_occupied(
        &self,
        position_m: &Vector2<f64>,
        radius_m: f64,
        threshold: i8,
    ) -> Option<f64> {
        self.cells_within(position_m, radius_m)
            .filter(|(&v, _)| v != OCCUPANCY_UNKNOWN && v >= threshold)
            .map(|(_, d)| d)
            .fold(None, |min: Option<f64>, d| match min {
                Some(m) if m <= d => Some(m),
                _ => Some(d),
            })
    }

    /// Mark every cell whose centre is within `radius_m` of `centre_m` as occupied.
    pub fn add_disc_obstacle(&mut self, centre_m: &Vector2<f64>, radius_m: f64) -> usize {
        let centre = *centre_m;
        self.fill_where(OCCUPANCY_OCCUPIED, |p| (p - centre).norm() <= radius_m)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_nearest_occupied() {
        let mut grid = OccupancyGrid::new(1.0, (10, 10), Vector2::zeros(), OCCUPANCY_FREE).unwrap();
        grid.set((5, 5), OCCUPANCY_OCCUPIED).unwrap();
        grid.set((5, 7), 40).unwrap();
        grid.set((2, 2), OCCUPANCY_UNKNOWN).unwrap();

        let pos = Vector2::new(5.5, 8.5);

        // The lightly occupied cell is closer but below threshold
        assert_eq!(grid.nearest_occupied(&pos, 5.0, 50), Some(3.0));
        assert_eq!(grid.nearest_occupied(&pos, 5.0, 30), Some(1.0));
        assert_eq!(grid.nearest_occupied(&pos, 0.5, 30), None);

        // Unknown cells never count, even with a negative threshold
        assert_eq!(grid.nearest_occupied(&Vector2::new(2.5, 2.5), 0.1, -1), None);
    }

    #[test]
    fn test_add_disc_obstacle() {
        let mut grid = OccupancyGrid::new(1.0, (10, 10), Vector2::zeros(), OCCUPANCY_FREE).unwrap();

        let num = grid.add_disc_obstacle(&Vector2::new(5.0, 5.0), 1.0);

        // Four cells have centres ~0.71 m from a cell corner
        assert_eq!(num, 4);
        assert_eq!(grid.get((4, 4)), Some(&OCCUPANCY_OCCUPIED));
        assert_eq!(grid.get((3, 3)), Some(&OCCUPANCY_FREE));
    }
}
