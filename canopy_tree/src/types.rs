// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the tree: node identifiers, flags, shape placements, and node data.

use alloc::vec::Vec;
use kurbo::{Point, Rect, Size, Vec2};

/// Identifier for a node in the tree.
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// ### Newer
///
/// A `NodeId` is newer than another when it has a higher generation.
/// If generations are equal, the one with the higher slot index is newer.
/// This total order is used for deterministic tie-breaks in hit testing.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index of this id. Slots are dense, so this is handy for side tables.
    pub const fn slot(self) -> u32 {
        self.0
    }

    /// True if `self` is newer than `other` (see the type docs).
    pub const fn is_newer_than(self, other: Self) -> bool {
        (self.1 > other.1) || (self.1 == other.1 && self.0 > other.0)
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility and picking.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible (drawn, aggregated into ancestor bounds, and navigable).
        const VISIBLE  = 0b0000_0001;
        /// Node is pickable (participates in hit testing).
        const PICKABLE = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE
    }
}

/// Identifier of a shape definition in the shape catalog.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u32);

impl ShapeId {
    /// Index into the catalog.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Placement of one catalog shape inside a node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShapeTransform {
    /// Catalog shape drawn at this placement.
    pub shape: ShapeId,
    /// Offset of the shape in shape space.
    pub offset: Vec2,
    /// Highlighted placements use the highlighted color pair and are always drawn as vectors
    /// at medium detail.
    pub highlight: bool,
}

impl ShapeTransform {
    /// Place `shape` at `offset`, not highlighted.
    pub const fn new(shape: ShapeId, offset: Vec2) -> Self {
        Self {
            shape,
            offset,
            highlight: false,
        }
    }

    /// Same placement with the highlight flag set.
    pub const fn highlighted(self) -> Self {
        Self {
            highlight: true,
            ..self
        }
    }
}

/// Data carried by each node.
#[derive(Clone, Debug)]
pub struct NodeData {
    /// World-space top-left corner.
    pub position: Point,
    /// World-space size.
    pub size: Size,
    /// Shapes drawn inside the node.
    pub shapes: Vec<ShapeTransform>,
    /// Visibility and picking flags.
    pub flags: NodeFlags,
    /// Key of the node in the external data source (used by position providers).
    pub key: Option<u64>,
}

impl NodeData {
    /// A visible node with no shapes.
    pub fn new(position: Point, size: Size) -> Self {
        Self {
            position,
            size,
            ..Default::default()
        }
    }

    /// Builder-style setter for the external key.
    pub fn with_key(mut self, key: u64) -> Self {
        self.key = Some(key);
        self
    }

    /// Builder-style setter for the shapes.
    pub fn with_shapes(mut self, shapes: Vec<ShapeTransform>) -> Self {
        self.shapes = shapes;
        self
    }

    /// The node's own world-space rectangle.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// True if the node's own `VISIBLE` flag is set.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            size: Size::ZERO,
            shapes: Vec::new(),
            flags: NodeFlags::default(),
            key: None,
        }
    }
}
