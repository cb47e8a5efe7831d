// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform bucket grid keyed by representative points.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Debug;
use std::hash::Hash;

use crate::cell::CellKey;

/// Uniform grid of buckets over world-space points.
///
/// Every id is registered at exactly one representative point and lives in the
/// single cell containing that point. Queries return the ids of the 3x3 block
/// of cells around the query point, so a shape is found by any point inside it
/// as long as its footprint does not exceed one cell.
#[derive(Clone)]
pub struct SpatialGrid<K> {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<K>>,
    locations: HashMap<K, CellKey>,
}

impl<K: Copy + Eq + Hash> SpatialGrid<K> {
    /// Create an empty grid with square cells of `cell_size` world units.
    ///
    /// Panics if `cell_size` is not a positive finite number.
    pub fn new(cell_size: f64) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell size must be positive and finite"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
            locations: HashMap::new(),
        }
    }

    /// Side length of a cell.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing the point.
    pub fn cell_of(&self, x: f64, y: f64) -> CellKey {
        CellKey::containing(x, y, self.cell_size)
    }

    /// Cell an id is currently registered in.
    pub fn locate(&self, id: K) -> Option<CellKey> {
        self.locations.get(&id).copied()
    }

    /// Number of registered ids.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// True if no id is registered.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of non-empty cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Register `id` at a point and return its cell.
    ///
    /// Inserting an id that is already registered moves it, so an id is never
    /// present in two cells.
    pub fn insert(&mut self, id: K, x: f64, y: f64) -> CellKey {
        let cell = self.cell_of(x, y);
        match self.locations.get(&id).copied() {
            Some(old) => self.move_entity(id, old, cell),
            None => {
                self.cells.entry(cell).or_default().push(id);
                self.locations.insert(id, cell);
            }
        }
        cell
    }

    /// Remove `id` from `cell`. Returns false if it was not registered there.
    pub fn remove(&mut self, id: K, cell: CellKey) -> bool {
        if !self.take_from_bucket(id, cell) {
            return false;
        }
        if self.locations.get(&id) == Some(&cell) {
            self.locations.remove(&id);
        }
        true
    }

    /// Move `id` from `old` to `new`. No-op when both cells are equal.
    ///
    /// If `id` turns out to live elsewhere than `old`, it is taken out of its
    /// actual cell so the one-cell invariant still holds afterwards.
    pub fn move_entity(&mut self, id: K, old: CellKey, new: CellKey) {
        if old == new {
            return;
        }
        if !self.take_from_bucket(id, old) {
            if let Some(actual) = self.locations.get(&id).copied() {
                if actual == new {
                    return;
                }
                self.take_from_bucket(id, actual);
            }
        }
        self.cells.entry(new).or_default().push(id);
        self.locations.insert(id, new);
    }

    /// Move `id` to the cell containing the point, registering it if needed.
    ///
    /// Returns true if the id changed cells (or was newly registered).
    pub fn relocate(&mut self, id: K, x: f64, y: f64) -> bool {
        let cell = self.cell_of(x, y);
        match self.locations.get(&id).copied() {
            Some(old) if old == cell => false,
            Some(old) => {
                self.move_entity(id, old, cell);
                true
            }
            None => {
                self.insert(id, x, y);
                true
            }
        }
    }

    /// Forget `id` wherever it is registered.
    pub fn forget(&mut self, id: K) -> bool {
        match self.locations.remove(&id) {
            Some(cell) => self.take_from_bucket(id, cell),
            None => false,
        }
    }

    /// Candidate ids registered in the 3x3 neighborhood of the point.
    ///
    /// Order follows the neighborhood rows and then bucket order, which is
    /// not stable across removals. Callers needing a deterministic winner
    /// must apply their own ordering.
    pub fn query(&self, x: f64, y: f64) -> impl Iterator<Item = K> + '_ {
        self.cell_of(x, y)
            .neighborhood()
            .filter_map(|key| self.cells.get(&key))
            .flat_map(|bucket| bucket.iter().copied())
    }

    /// Ids registered in exactly one cell.
    pub fn bucket(&self, cell: CellKey) -> &[K] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove every id.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.locations.clear();
    }

    fn take_from_bucket(&mut self, id: K, cell: CellKey) -> bool {
        let Entry::Occupied(mut bucket) = self.cells.entry(cell) else {
            return false;
        };
        let Some(pos) = bucket.get().iter().position(|k| *k == id) else {
            return false;
        };
        bucket.get_mut().swap_remove(pos);
        if bucket.get().is_empty() {
            bucket.remove();
        }
        true
    }
}

impl<K> Debug for SpatialGrid<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpatialGrid")
            .field("cell_size", &self.cell_size)
            .field("cells", &self.cells.len())
            .field("ids", &self.locations.len())
            .finish_non_exhaustive()
    }
}
