// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Level-of-detail selection by on-screen coverage.

/// How much work goes into drawing one node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Lod {
    /// Small on screen: blit the node's baked tile.
    Tile,
    /// Medium: blit per-shape tiles, redraw highlighted shapes as vectors.
    Mixed,
    /// Large: redraw every shape as vectors.
    Vector,
}

/// Coverage thresholds separating the [`Lod`] tiers.
///
/// Coverage is node area divided by the visible viewport area.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LodPolicy {
    /// Below this coverage a node is drawn from its tile.
    pub tile_below: f64,
    /// Below this coverage (and at or above `tile_below`) a node is drawn mixed.
    pub mixed_below: f64,
}

impl Default for LodPolicy {
    fn default() -> Self {
        Self {
            tile_below: 1.0 / 40.0,
            mixed_below: 1.0 / 10.0,
        }
    }
}

impl LodPolicy {
    /// Pick a tier. A viewport with no area selects [`Lod::Vector`].
    pub fn choose(&self, node_area: f64, viewport_area: f64) -> Lod {
        if viewport_area <= 0.0 {
            return Lod::Vector;
        }
        let coverage = node_area / viewport_area;
        if coverage < self.tile_below {
            Lod::Tile
        } else if coverage < self.mixed_below {
            Lod::Mixed
        } else {
            Lod::Vector
        }
    }
}
