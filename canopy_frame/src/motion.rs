// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Target animation: nodes glide toward new positions with sine-in-out easing.

use std::collections::HashMap;
use std::f64::consts::PI;

use canopy_grid::SpatialGrid;
use canopy_tree::{NodeId, Tree};
use kurbo::Point;

use crate::context::sync_grid;

/// Ticks an animated move takes unless configured otherwise.
pub const DEFAULT_TICKS: u32 = 30;

/// Sine-in-out easing of `t` in `[0, 1]`.
pub fn sine_in_out(t: f64) -> f64 {
    -((PI * t.clamp(0.0, 1.0)).cos() - 1.0) / 2.0
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Target {
    from: Point,
    to: Point,
    elapsed: u32,
    ticks: u32,
}

impl Target {
    fn at(&self) -> Point {
        if self.elapsed >= self.ticks {
            return self.to;
        }
        let t = sine_in_out(f64::from(self.elapsed) / f64::from(self.ticks));
        self.from.lerp(self.to, t)
    }
}

/// Pending moves, advanced one tick per frame.
#[derive(Clone, Debug)]
pub struct Motion {
    ticks: u32,
    targets: HashMap<NodeId, Target>,
}

impl Default for Motion {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS)
    }
}

impl Motion {
    /// Animated moves take `ticks` ticks.
    pub fn new(ticks: u32) -> Self {
        Self {
            ticks,
            targets: HashMap::new(),
        }
    }

    /// Start (or restart) a move from `from` to `to`.
    ///
    /// Without `animate` the node lands on the next tick.
    pub fn set_target(&mut self, id: NodeId, from: Point, to: Point, animate: bool) {
        let ticks = if animate { self.ticks } else { 0 };
        self.targets.insert(
            id,
            Target {
                from,
                to,
                elapsed: 0,
                ticks,
            },
        );
    }

    /// Drop a pending move. Returns whether there was one.
    pub fn cancel(&mut self, id: NodeId) -> bool {
        self.targets.remove(&id).is_some()
    }

    /// Final position of a pending move.
    pub fn target_of(&self, id: NodeId) -> Option<Point> {
        self.targets.get(&id).map(|t| t.to)
    }

    /// Drop every pending move.
    pub fn clear(&mut self) {
        self.targets.clear();
    }

    /// Number of pending moves.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if nothing is moving.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Advance every move by one tick, updating positions, bounds and the grid.
    ///
    /// Returns how many nodes actually changed position. Finished moves and moves of
    /// removed nodes are dropped.
    pub fn step(&mut self, tree: &mut Tree, grid: &mut SpatialGrid<NodeId>) -> usize {
        let mut moved = 0;
        self.targets.retain(|&id, target| {
            if !tree.is_alive(id) {
                return false;
            }
            target.elapsed = target.elapsed.saturating_add(1);
            if tree.set_position(id, target.at()) {
                moved += 1;
                if let Some(node) = tree.get(id) {
                    sync_grid(grid, id, node);
                }
            }
            target.elapsed < target.ticks
        });
        moved
    }
}
