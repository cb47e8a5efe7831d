// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard-style movement between related nodes.

use crate::tree::Tree;
use crate::types::{NodeData, NodeId};

/// Direction of a navigation step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// To the parent.
    Up,
    /// To the leftmost visible child.
    Down,
    /// To the nearest visible sibling on the left.
    Left,
    /// To the nearest visible sibling on the right.
    Right,
}

/// The node reached from `from` by one step in `direction`, if any.
///
/// Siblings are ordered by the x coordinate of their position; roots count as siblings of
/// each other. Hidden nodes are never returned.
pub fn navigate(tree: &Tree, from: NodeId, direction: Direction) -> Option<NodeId> {
    let me = tree.get(from)?;
    let visible = |id: &&NodeId| tree.get(**id).is_some_and(NodeData::is_visible);
    let x_of = |id: NodeId| tree.get(id).map_or(0.0, |n| n.position.x);

    match direction {
        Direction::Up => tree.parent(from),
        Direction::Down => tree
            .children(from)
            .iter()
            .filter(visible)
            .copied()
            .min_by(|a, b| x_of(*a).total_cmp(&x_of(*b))),
        Direction::Left | Direction::Right => {
            let siblings = match tree.parent(from) {
                Some(p) => tree.children(p),
                None => tree.roots(),
            };
            let here = me.position.x;
            let candidates = siblings
                .iter()
                .filter(visible)
                .copied()
                .filter(|s| *s != from);
            if direction == Direction::Left {
                candidates
                    .filter(|s| x_of(*s) < here)
                    .max_by(|a, b| x_of(*a).total_cmp(&x_of(*b)))
            } else {
                candidates
                    .filter(|s| x_of(*s) > here)
                    .min_by(|a, b| x_of(*a).total_cmp(&x_of(*b)))
            }
        }
    }
}
