// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell keys and the point-to-cell mapping.

/// Integer coordinates of a grid cell.
///
/// A point `(x, y)` belongs to the cell `(floor(x / cell_size), floor(y / cell_size))`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    /// Column index.
    pub x: i64,
    /// Row index.
    pub y: i64,
}

impl CellKey {
    /// Create a cell key from column and row.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Map a world-space point to its cell.
    ///
    /// Coordinates are assumed finite. Debug builds assert.
    pub fn containing(x: f64, y: f64, cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        debug_assert!(x.is_finite() && y.is_finite(), "grid points must be finite");
        Self {
            x: floor_to_i64(x / cell_size),
            y: floor_to_i64(y / cell_size),
        }
    }

    /// The 3x3 block of cells centered on this one, row by row.
    pub fn neighborhood(self) -> impl Iterator<Item = Self> {
        (-1_i64..=1).flat_map(move |dy| {
            (-1_i64..=1).map(move |dx| Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy)))
        })
    }

    /// World-space origin (top-left corner) of the cell.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Cell indices far beyond 2^53 are not meaningful for world coordinates."
    )]
    pub fn origin(self, cell_size: f64) -> (f64, f64) {
        (self.x as f64 * cell_size, self.y as f64 * cell_size)
    }
}

#[inline]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "Saturating float to int cast is the intended cell mapping."
)]
fn floor_to_i64(v: f64) -> i64 {
    let i = v as i64;
    if (i as f64) > v { i - 1 } else { i }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_floor_toward_negative_infinity() {
        assert_eq!(CellKey::containing(-0.5, -10.0, 10.0), CellKey::new(-1, -1));
        assert_eq!(CellKey::containing(-10.5, 0.0, 10.0), CellKey::new(-2, 0));
        assert_eq!(CellKey::containing(9.999, 10.0, 10.0), CellKey::new(0, 1));
    }

    #[test]
    fn neighborhood_is_three_by_three() {
        let cells: Vec<_> = CellKey::new(4, -2).neighborhood().collect();
        assert_eq!(cells.len(), 9, "3x3 block");
        assert_eq!(cells[0], CellKey::new(3, -3));
        assert_eq!(cells[4], CellKey::new(4, -2));
        assert_eq!(cells[8], CellKey::new(5, -1));
    }

    #[test]
    fn origin_round_trips_through_containing() {
        let key = CellKey::new(-3, 7);
        let (x, y) = key.origin(25.0);
        assert_eq!(CellKey::containing(x, y, 25.0), key);
    }
}
