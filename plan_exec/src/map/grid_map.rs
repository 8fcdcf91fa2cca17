//! # Grid Map
//!
//! A single layer raster over the local frame. Cell `(0, 0)` has its lower-left corner at the map
//! origin, the first index increases along +x and the second along +y.

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A grid-based map holding one value per cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridMap<T> {
    /// The size of each (square) grid cell in meters per cell
    cell_size_m: f64,

    /// Position of the lower-left corner of cell (0, 0)
    origin_m: Vector2<f64>,

    /// Raw map data, indexed by x cell then y cell
    data: Array2<T>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridMapError {
    #[error("Requested position or cell outside map bounds")]
    OutsideMap,

    #[error("Cell size must be positive and finite, got {0}")]
    InvalidCellSize(f64),

    #[error("Grid map is empty")]
    Empty,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: Clone> GridMap<T> {
    /// Create a new GridMap with the given cell size, number of cells along each axis, origin,
    /// and initial value for every cell.
    pub fn new(
        cell_size_m: f64,
        num_cells: (usize, usize),
        origin_m: Vector2<f64>,
        empty_value: T,
    ) -> Result<Self, GridMapError> {
        Self::from_array(cell_size_m, origin_m, Array2::from_elem(num_cells, empty_value))
    }

    /// Create a GridMap around existing data.
    pub fn from_array(
        cell_size_m: f64,
        origin_m: Vector2<f64>,
        data: Array2<T>,
    ) -> Result<Self, GridMapError> {
        if !(cell_size_m > 0.0 && cell_size_m.is_finite()) {
            return Err(GridMapError::InvalidCellSize(cell_size_m));
        }

        if data.is_empty() {
            return Err(GridMapError::Empty);
        }

        Ok(Self {
            cell_size_m,
            origin_m,
            data,
        })
    }

    /// Get the value of a cell.
    pub fn get(&self, cell: (usize, usize)) -> Option<&T> {
        self.data.get(cell)
    }

    /// Get the value of the cell containing the position.
    pub fn get_position(&self, position_m: &Vector2<f64>) -> Option<&T> {
        self.position_to_cell(position_m).and_then(|c| self.get(c))
    }

    /// Set the value of a cell.
    pub fn set(&mut self, cell: (usize, usize), value: T) -> Result<(), GridMapError> {
        match self.data.get_mut(cell) {
            Some(v) => {
                *v = value;
                Ok(())
            }
            None => Err(GridMapError::OutsideMap),
        }
    }

    /// Set every cell whose centre satisfies the predicate to the given value.
    ///
    /// Returns the number of cells modified.
    pub fn fill_where<F>(&mut self, value: T, pred: F) -> usize
    where
        F: Fn(&Vector2<f64>) -> bool,
    {
        let cell_size_m = self.cell_size_m;
        let origin_m = self.origin_m;
        let mut num_set = 0;

        for ((x, y), v) in self.data.indexed_iter_mut() {
            let centre = cell_centre(origin_m, cell_size_m, (x, y));
            if pred(&centre) {
                *v = value.clone();
                num_set += 1;
            }
        }

        num_set
    }
}

impl<T> GridMap<T> {
    /// The number of cells along each axis.
    pub fn num_cells(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// The size of each cell in meters.
    pub fn cell_size_m(&self) -> f64 {
        self.cell_size_m
    }

    /// Position of the lower-left corner of the map.
    pub fn origin_m(&self) -> Vector2<f64> {
        self.origin_m
    }

    /// Position of the upper-right corner of the map.
    pub fn extent_m(&self) -> Vector2<f64> {
        let (nx, ny) = self.num_cells();
        self.origin_m + Vector2::new(nx as f64, ny as f64) * self.cell_size_m
    }

    /// Find the cell containing the given position, or `None` if the position is outside the
    /// map.
    pub fn position_to_cell(&self, position_m: &Vector2<f64>) -> Option<(usize, usize)> {
        let rel = (position_m - self.origin_m) / self.cell_size_m;

        if !(rel.x >= 0.0 && rel.y >= 0.0) {
            return None;
        }

        let cell = (rel.x.floor() as usize, rel.y.floor() as usize);
        let (nx, ny) = self.num_cells();

        if cell.0 < nx && cell.1 < ny {
            Some(cell)
        } else {
            None
        }
    }

    /// The position of the centre of the given cell.
    pub fn cell_position(&self, cell: (usize, usize)) -> Result<Vector2<f64>, GridMapError> {
        let (nx, ny) = self.num_cells();

        if cell.0 >= nx || cell.1 >= ny {
            return Err(GridMapError::OutsideMap);
        }

        Ok(cell_centre(self.origin_m, self.cell_size_m, cell))
    }

    /// Iterate over every cell whose centre lies within `radius_m` of the position, yielding the
    /// cell value and the distance from the position to the cell centre.
    pub fn cells_within<'a>(
        &'a self,
        position_m: &Vector2<f64>,
        radius_m: f64,
    ) -> impl Iterator<Item = (&'a T, f64)> + 'a {
        let (nx, ny) = self.num_cells();
        let centre = *position_m;
        let origin = self.origin_m;
        let size = self.cell_size_m;

        // Bounding box of the search circle, clamped to the map
        let to_idx = |v: f64, n: usize| -> usize { (v.max(0.0).floor() as usize).min(n) };
        let lo = (centre - origin - Vector2::repeat(radius_m)) / size;
        let hi = (centre - origin + Vector2::repeat(radius_m)) / size;
        let (x0, x1) = (to_idx(lo.x, nx), to_idx(hi.x + 1.0, nx));
        let (y0, y1) = (to_idx(lo.y, ny), to_idx(hi.y + 1.0, ny));

        (x0..x1)
            .flat_map(move |x| (y0..y1).map(move |y| (x, y)))
            .filter_map(move |cell| {
                let dist = (cell_centre(origin, size, cell) - centre).norm();
                if dist <= radius_m {
                    self.data.get(cell).map(|v| (v, dist))
                } else {
                    None
                }
            })
    }

    /// Iterate over every cell index and value.
    pub fn indexed_iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        self.data.indexed_iter()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn cell_centre(origin_m: Vector2<f64>, cell_size_m: f64, cell: (usize, usize)) -> Vector2<f64> {
    origin_m + Vector2::new(cell.0 as f64 + 0.5, cell.1 as f64 + 0.5) * cell_size_m
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn map() -> GridMap<i8> {
        GridMap::new(0.5, (20, 10), Vector2::new(-5.0, -2.0), 0).unwrap()
    }

    #[test]
    fn test_grid_map_bounds() {
        let map = map();

        assert_eq!(map.num_cells(), (20, 10));
        assert_eq!(map.extent_m(), Vector2::new(5.0, 3.0));

        assert_eq!(map.position_to_cell(&Vector2::new(-5.0, -2.0)), Some((0, 0)));
        assert_eq!(map.position_to_cell(&Vector2::new(0.0, 0.0)), Some((10, 4)));
        assert_eq!(map.position_to_cell(&Vector2::new(4.99, 2.99)), Some((19, 9)));
        assert_eq!(map.position_to_cell(&Vector2::new(5.0, 0.0)), None);
        assert_eq!(map.position_to_cell(&Vector2::new(-5.1, 0.0)), None);
        assert_eq!(map.position_to_cell(&Vector2::new(f64::NAN, 0.0)), None);

        assert_eq!(map.cell_position((0, 0)), Ok(Vector2::new(-4.75, -1.75)));
        assert_eq!(map.cell_position((10, 4)), Ok(Vector2::new(0.25, 0.25)));
        assert_eq!(map.cell_position((20, 0)), Err(GridMapError::OutsideMap));
    }

    #[test]
    fn test_grid_map_set_get() {
        let mut map = map();

        map.set((3, 4), 100).unwrap();
        assert_eq!(map.get((3, 4)), Some(&100));
        assert_eq!(map.get_position(&map.cell_position((3, 4)).unwrap()), Some(&100));
        assert_eq!(map.set((30, 4), 100), Err(GridMapError::OutsideMap));

        // Fill a 1 m wide column
        let num = map.fill_where(-1, |p| p.x >= 1.0 && p.x < 2.0);
        assert_eq!(num, 2 * 10);
        assert_eq!(map.get_position(&Vector2::new(1.5, 0.0)), Some(&-1));
    }

    #[test]
    fn test_cells_within() {
        let mut map = map();
        map.set((10, 4), 100).unwrap();

        // Searching around the centre of the set cell finds it at zero distance
        let centre = map.cell_position((10, 4)).unwrap();
        let hits: Vec<_> = map
            .cells_within(&centre, 0.1)
            .collect();
        assert_eq!(hits, vec![(&100, 0.0)]);

        // Radius of one cell reaches the four neighbours too
        assert_eq!(map.cells_within(&centre, 0.5).count(), 5);

        // Searching outside the map yields nothing
        assert_eq!(map.cells_within(&Vector2::new(50.0, 50.0), 1.0).count(), 0);
    }

    #[test]
    fn test_invalid_maps() {
        assert_eq!(
            GridMap::new(0.0, (2, 2), Vector2::zeros(), 0i8).err(),
            Some(GridMapError::InvalidCellSize(0.0))
        );
        assert_eq!(
            GridMap::new(1.0, (0, 2), Vector2::zeros(), 0i8).err(),
            Some(GridMapError::Empty)
        );
    }
}
