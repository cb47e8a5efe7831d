// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Grid: a uniform bucket grid for point hit-testing.
//!
//! - Register ids at a representative world-space point with [`SpatialGrid::insert`].
//! - Keep them in sync with [`SpatialGrid::move_entity`] / [`SpatialGrid::relocate`] when they move.
//! - Ask for candidates around a point with [`SpatialGrid::query`], which returns the
//!   ids of the 3x3 block of cells around the point.
//!
//! Insert, remove, and move are O(1) expected; a query touches nine buckets.
//!
//! ## Cell size contract
//!
//! The cell size must be larger than the largest footprint of anything registered.
//! A shape whose extent exceeds one cell can be missed by a neighborhood query when
//! the query point lies more than one cell away from its registration point.
//! The grid does not widen its search to compensate; callers are expected to flag
//! oversized footprints instead.
//!
//! Like the other index crates, this crate does not depend on any geometry crate:
//! points are plain `(x, y)` pairs of `f64`.
//!
//! # Example
//!
//! ```rust
//! use canopy_grid::SpatialGrid;
//!
//! let mut grid: SpatialGrid<u32> = SpatialGrid::new(128.0);
//! let cell = grid.insert(1, 10.0, 10.0);
//! grid.insert(2, 500.0, 500.0);
//!
//! // A point in a neighboring cell still sees id 1 but not id 2.
//! let hits: Vec<_> = grid.query(140.0, 20.0).collect();
//! assert_eq!(hits, vec![1]);
//!
//! // Move id 1 far away.
//! let new_cell = grid.cell_of(900.0, 900.0);
//! grid.move_entity(1, cell, new_cell);
//! assert_eq!(grid.query(140.0, 20.0).count(), 0);
//! ```

mod cell;
mod grid;

pub use cell::CellKey;
pub use grid::SpatialGrid;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Rng(u64);

    impl Rng {
        fn next_u64(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }
        #[allow(clippy::cast_precision_loss, reason = "test-only uniform sampling")]
        fn next_f64(&mut self) -> f64 {
            let v = self.next_u64() >> 11;
            (v as f64) / ((1_u64 << 53) as f64)
        }
    }

    #[test]
    fn points_inside_small_shapes_hit_their_owner() {
        const CELL: f64 = 100.0;
        let mut rng = Rng(0x9e37_79b9_7f4a_7c15);
        let mut grid = SpatialGrid::new(CELL);
        let mut shapes = Vec::new();
        for id in 0..500_u32 {
            let x = rng.next_f64() * 5000.0 - 2500.0;
            let y = rng.next_f64() * 5000.0 - 2500.0;
            let w = 1.0 + rng.next_f64() * (CELL - 1.0);
            let h = 1.0 + rng.next_f64() * (CELL - 1.0);
            grid.insert(id, x, y);
            shapes.push((id, x, y, w, h));
        }
        for &(id, x, y, w, h) in &shapes {
            for _ in 0..4 {
                let px = x + rng.next_f64() * w;
                let py = y + rng.next_f64() * h;
                assert!(
                    grid.query(px, py).any(|k| k == id),
                    "id {id} registered at ({x}, {y}) should be a candidate at ({px}, {py})"
                );
            }
        }
    }

    #[test]
    fn moves_preserve_single_cell_membership() {
        let mut rng = Rng(42);
        let mut grid = SpatialGrid::new(32.0);
        for id in 0..64_u32 {
            grid.insert(id, 0.0, 0.0);
        }
        for step in 0..2000_u32 {
            let id = step % 64;
            let x = rng.next_f64() * 1000.0;
            let y = rng.next_f64() * 1000.0;
            let old = grid.locate(id).unwrap();
            let new = grid.cell_of(x, y);
            grid.move_entity(id, old, new);
        }
        assert_eq!(grid.len(), 64);
        for id in 0..64_u32 {
            let cell = grid.locate(id).unwrap();
            let count = grid.bucket(cell).iter().filter(|k| **k == id).count();
            assert_eq!(count, 1, "id {id} must be present exactly once");
        }
    }
}
