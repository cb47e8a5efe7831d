// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Tree: a Kurbo-native node tree with incremental subtree bounds.
//!
//! Canopy Tree holds very large rooted trees whose nodes move independently (for example
//! while a layout animates) and keeps, for every node, the bounding box of its visible
//! subtree without ever recomputing it from scratch.
//!
//! - [`Tree`] stores nodes in generational slots and owns a [`BoundsCache`].
//! - Mutations ([`Tree::set_position`], [`Tree::hide`], ...) mark the affected chain dirty.
//! - [`Tree::refresh`] folds dirty entries bottom-up, polling a [`Budget`] so a frame can
//!   stop halfway and resume on the next one.
//! - [`Culler`] walks the tree top-down and discards subtrees whose clean bounds miss the
//!   viewport, reporting nodes and connector edges to a [`CullVisitor`].
//! - [`navigate`] steps between parent, children, and siblings.
//!
//! ## Not a layout engine
//!
//! Positions come from elsewhere. Upstream code computes them and pushes them in with
//! [`Tree::set_position`]; this crate only tracks extents.
//!
//! ## Budgets
//!
//! [`Unbounded`] never runs out, [`PollLimit`] allows a fixed number of polls (handy for
//! deterministic tests), and `Deadline` (with the `std` feature) compares against a
//! wall-clock instant. A refresh interrupted by its budget leaves the cache valid: every
//! node it did not fold is still dirty.
//!
//! ### Minimal usage
//!
//! ```
//! use canopy_tree::{Culler, CullVisitor, EdgeSegment, NodeData, NodeId, Tree, Unbounded};
//! use kurbo::{Point, Rect, Size};
//!
//! let mut tree = Tree::new();
//! let root = tree.insert(None, NodeData::new(Point::new(0.0, 0.0), Size::new(10.0, 10.0)));
//! let child = tree.insert(
//!     Some(root),
//!     NodeData::new(Point::new(40.0, 40.0), Size::new(10.0, 10.0)),
//! );
//! tree.refresh(&Unbounded);
//! assert_eq!(tree.visible_bounding_box(root), Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
//!
//! // Moving the child dirties it and its ancestors only.
//! tree.set_position(child, Point::new(100.0, 40.0));
//! let stats = tree.refresh(&Unbounded);
//! assert_eq!(stats.folded, 2);
//!
//! struct Count(usize);
//! impl CullVisitor for Count {
//!     fn draw_node(&mut self, _: NodeId, _: &NodeData, _: bool) {
//!         self.0 += 1;
//!     }
//!     fn draw_edge(&mut self, _: EdgeSegment) {}
//! }
//!
//! let mut count = Count(0);
//! Culler::new().cull(&tree, Rect::new(90.0, 30.0, 120.0, 60.0), &mut count, &Unbounded);
//! assert_eq!(count.0, 1);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod bounds;
mod budget;
mod cull;
mod navigate;
mod tree;
mod types;

pub use bounds::{BoundsCache, RefreshStats, Topology};
#[cfg(feature = "std")]
pub use budget::Deadline;
pub use budget::{Budget, PollLimit, Unbounded};
pub use cull::{CullStats, CullVisitor, Culler, EDGE_GAP, EdgeKind, EdgeSegment};
pub use navigate::{Direction, navigate};
pub use tree::Tree;
pub use types::{NodeData, NodeFlags, NodeId, ShapeId, ShapeTransform};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use alloc::vec::Vec;
    use kurbo::{Point, Rect, Size};

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
        #[allow(clippy::cast_possible_truncation, reason = "test-only index sampling")]
        fn below(&mut self, n: usize) -> usize {
            (self.next_u64() % n as u64) as usize
        }
    }

    fn random_tree(rng: &mut Rng, n: usize) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new();
        let mut ids = Vec::with_capacity(n);
        for i in 0..n {
            let parent = (i > 0).then(|| ids[rng.below(i)]);
            let data = NodeData::new(
                Point::new(rng.next_f64() * 2000.0, rng.next_f64() * 2000.0),
                Size::new(1.0 + rng.next_f64() * 40.0, 1.0 + rng.next_f64() * 40.0),
            );
            ids.push(tree.insert(parent, data));
        }
        (tree, ids)
    }

    /// Union of own rectangles over the visible subtree, computed from scratch.
    fn brute_bounds(tree: &Tree, id: NodeId) -> Rect {
        let mut rect = tree.get(id).unwrap().rect();
        let mut stack: Vec<NodeId> = tree.children(id).to_vec();
        while let Some(n) = stack.pop() {
            let node = tree.get(n).unwrap();
            if !node.is_visible() {
                continue;
            }
            rect = rect.union(node.rect());
            stack.extend_from_slice(tree.children(n));
        }
        rect
    }

    fn assert_matches_brute_force(tree: &Tree) {
        for (id, node) in tree.iter() {
            if !node.is_visible() {
                continue;
            }
            assert!(!tree.bounds().is_dirty(id), "{id:?} should be clean");
            assert_eq!(
                tree.bounds().rect(id),
                Some(brute_bounds(tree, id)),
                "cached bounds of {id:?} differ from brute force"
            );
        }
    }

    fn assert_dirty_chain(tree: &Tree) {
        for (id, node) in tree.iter() {
            if !node.is_visible() || !tree.bounds().is_dirty(id) {
                continue;
            }
            if let Some(p) = tree.parent(id) {
                assert!(
                    tree.bounds().is_dirty(p),
                    "dirty {id:?} has clean parent {p:?}"
                );
            }
        }
    }

    #[test]
    fn random_moves_match_brute_force() {
        let mut rng = Rng(0x2545_f491_4f6c_dd1d);
        let (mut tree, ids) = random_tree(&mut rng, 400);
        tree.refresh(&Unbounded);
        assert_matches_brute_force(&tree);

        for round in 0..20 {
            for _ in 0..25 {
                let id = ids[rng.below(ids.len())];
                let p = Point::new(rng.next_f64() * 3000.0, rng.next_f64() * 3000.0);
                tree.set_position(id, p);
            }
            if round % 5 == 4 {
                tree.hide(ids[rng.below(ids.len())]);
            }
            let stats = tree.refresh(&Unbounded);
            assert!(stats.complete);
            assert_matches_brute_force(&tree);
            assert_eq!(tree.refresh(&Unbounded).folded, 0, "second refresh is idle");
        }
    }

    #[test]
    fn interrupted_refresh_keeps_invariant_and_converges() {
        for limit in [1_usize, 2, 3, 5, 8, 13, 40] {
            let mut rng = Rng(0x9e37_79b9_7f4a_7c15 ^ limit as u64);
            let (mut tree, ids) = random_tree(&mut rng, 200);
            tree.refresh(&Unbounded);
            let mut reference = tree.clone();

            for _ in 0..30 {
                let id = ids[rng.below(ids.len())];
                let p = Point::new(rng.next_f64() * 2500.0, rng.next_f64() * 2500.0);
                tree.set_position(id, p);
                reference.set_position(id, p);
            }
            reference.refresh(&Unbounded);

            let mut rounds = 0;
            loop {
                let stats = tree.refresh(&PollLimit::new(limit));
                assert_dirty_chain(&tree);
                rounds += 1;
                if stats.complete {
                    break;
                }
                assert!(rounds < 10_000, "refresh with limit {limit} never converged");
            }
            assert_matches_brute_force(&tree);
            for &id in &ids {
                assert_eq!(tree.bounds().rect(id), reference.bounds().rect(id));
            }
        }
    }

    #[derive(Default)]
    struct Drawn(BTreeSet<(u32, u32)>);

    impl CullVisitor for Drawn {
        fn draw_node(&mut self, id: NodeId, _: &NodeData, _: bool) {
            self.0.insert((id.0, id.1));
        }
        fn draw_edge(&mut self, _: EdgeSegment) {}
    }

    #[test]
    fn culling_draws_exactly_the_intersecting_nodes() {
        let mut rng = Rng(7);
        let (mut tree, ids) = random_tree(&mut rng, 600);
        for _ in 0..15 {
            tree.hide(ids[rng.below(ids.len())]);
        }
        tree.refresh(&Unbounded);
        // Leave some entries stale: the culler must still find them.
        for _ in 0..20 {
            let id = ids[rng.below(ids.len())];
            tree.set_position(id, Point::new(rng.next_f64() * 2000.0, rng.next_f64() * 2000.0));
        }

        let mut culler = Culler::new();
        for _ in 0..50 {
            let x = rng.next_f64() * 2000.0;
            let y = rng.next_f64() * 2000.0;
            let viewport = Rect::new(x, y, x + 50.0 + rng.next_f64() * 400.0, y + 300.0);

            let expected: BTreeSet<_> = tree
                .iter()
                .filter(|(_, n)| n.is_visible())
                .filter(|(_, n)| {
                    let r = n.rect();
                    r.x0 <= viewport.x1
                        && viewport.x0 <= r.x1
                        && r.y0 <= viewport.y1
                        && viewport.y0 <= r.y1
                })
                .map(|(id, _)| (id.0, id.1))
                .collect();

            let mut drawn = Drawn::default();
            let stats = culler.cull(&tree, viewport, &mut drawn, &Unbounded);
            assert_eq!(drawn.0, expected);
            assert!(stats.visited <= tree.len());
        }
    }
}
