// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental subtree bounding boxes.
//!
//! Each node owns one entry holding the union of its own rectangle and the rectangles of all
//! its visible descendants. Entries are recomputed lazily: movers call
//! [`BoundsCache::mark_dirty`], which dirties the node and its ancestor chain, and
//! [`BoundsCache::refresh`] later folds dirty entries bottom-up.
//!
//! ## Invariants
//!
//! - A clean entry equals the union of the node's own rectangle and its visible children's
//!   (clean) entries.
//! - A dirty visible node has a dirty parent, all the way to its root or to the root of the
//!   hidden subtree it belongs to.
//!
//! A refresh that runs out of budget stops between two nodes. Everything it did not fold is
//! still dirty, so both invariants survive, and the next refresh of the same root picks up
//! where it left off.

use alloc::vec::Vec;
use kurbo::Rect;

use crate::budget::Budget;
use crate::types::NodeId;

/// Read-only view of tree structure needed to fold bounds.
pub trait Topology {
    /// Children of `id`, in order. Empty for unknown ids.
    fn children(&self, id: NodeId) -> &[NodeId];

    /// The node's own world-space rectangle.
    fn own_rect(&self, id: NodeId) -> Rect;

    /// True if the node's own `VISIBLE` flag is set.
    fn is_visible(&self, id: NodeId) -> bool;
}

/// Counters reported by [`BoundsCache::refresh`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Dirty nodes entered by the traversal.
    pub discovered: usize,
    /// Dirty nodes whose rectangle was recomputed and cleared.
    pub folded: usize,
    /// Clean children skipped together with their whole subtrees.
    pub skipped_clean: usize,
    /// False if the budget ran out before every dirty node was folded.
    pub complete: bool,
}

impl RefreshStats {
    /// Stats of a pass that had nothing to do.
    pub const IDLE: Self = Self {
        discovered: 0,
        folded: 0,
        skipped_clean: 0,
        complete: true,
    };

    /// Accumulate another pass into this one.
    pub fn merge(&mut self, other: Self) {
        self.discovered += other.discovered;
        self.folded += other.folded;
        self.skipped_clean += other.skipped_clean;
        self.complete &= other.complete;
    }
}

#[derive(Clone, Debug)]
struct BoundsEntry {
    generation: u32,
    parent: Option<NodeId>,
    rect: Rect,
    dirty: bool,
}

#[derive(Copy, Clone, Debug)]
enum Visit {
    Enter(NodeId),
    Fold(NodeId),
}

/// Per-node cache of subtree bounds with dirty propagation.
#[derive(Clone, Debug, Default)]
pub struct BoundsCache {
    entries: Vec<Option<BoundsEntry>>,
    stack: Vec<Visit>,
    // root of the interrupted pass `stack` belongs to
    resume: Option<NodeId>,
}

impl BoundsCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached rectangle of a node, or `None` for unknown ids.
    ///
    /// The value may be stale while the entry is dirty; check [`BoundsCache::is_dirty`].
    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.entry(id).map(|e| e.rect)
    }

    /// True if the entry exists and needs recomputation.
    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.entry(id).is_some_and(|e| e.dirty)
    }

    /// Parent recorded for the entry.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).and_then(|e| e.parent)
    }

    /// Root of the interrupted pass that the next refresh of that root will resume.
    pub fn pending_root(&self) -> Option<NodeId> {
        self.resume
    }

    /// Number of dirty entries. Linear in the number of slots.
    pub fn dirty_count(&self) -> usize {
        self.entries.iter().flatten().filter(|e| e.dirty).count()
    }

    /// Mark a node stale, together with its ancestors.
    ///
    /// The ancestor walk stops at the first ancestor that is already dirty: by the
    /// invariant, everything above it is dirty too.
    pub fn mark_dirty(&mut self, id: NodeId) {
        let Some(entry) = self.entry_mut(id) else {
            return;
        };
        entry.dirty = true;
        let mut cursor = entry.parent;
        while let Some(p) = cursor {
            let Some(parent) = self.entry_mut(p) else {
                break;
            };
            if parent.dirty {
                break;
            }
            parent.dirty = true;
            cursor = parent.parent;
        }
    }

    /// Recompute dirty entries under `root`, bottom-up, until the budget runs out.
    ///
    /// The traversal uses an explicit stack: a dirty node is entered, its dirty visible
    /// children are pushed above a pending fold for the node itself, so every node folds
    /// after all its children. Clean children are never pushed; their subtrees are clean
    /// by the invariant. The budget is polled before every stack pop.
    ///
    /// An interrupted pass keeps its stack, and the next call for the same root resumes it,
    /// so repeated calls converge even when each one only affords a few nodes. Nodes dirtied
    /// in between are picked up when their parent's fold finds them. Calling with another
    /// root drops the saved stack; the nodes it held simply stay dirty.
    ///
    /// A hidden or clean root is left untouched.
    pub fn refresh<T, B>(&mut self, topo: &T, root: NodeId, budget: &B) -> RefreshStats
    where
        T: Topology + ?Sized,
        B: Budget + ?Sized,
    {
        let mut stats = RefreshStats::IDLE;
        let mut stack = core::mem::take(&mut self.stack);
        if self.resume != Some(root) {
            stack.clear();
        }
        self.resume = None;
        if !topo.is_visible(root) || !self.is_dirty(root) {
            stack.clear();
            self.stack = stack;
            return stats;
        }
        if stack.is_empty() {
            stack.push(Visit::Enter(root));
        }

        while let Some(&visit) = stack.last() {
            if budget.exhausted() {
                stats.complete = false;
                break;
            }
            stack.pop();
            match visit {
                Visit::Enter(id) => {
                    if !self.is_dirty(id) || !topo.is_visible(id) {
                        continue;
                    }
                    stats.discovered += 1;
                    stack.push(Visit::Fold(id));
                    stats.skipped_clean += self.push_dirty_children(topo, id, &mut stack);
                }
                Visit::Fold(id) => {
                    if !self.is_dirty(id) {
                        continue;
                    }
                    if self.fold(topo, id) {
                        stats.folded += 1;
                    } else {
                        // A child was dirtied after this node was entered.
                        stack.push(Visit::Fold(id));
                        let _ = self.push_dirty_children(topo, id, &mut stack);
                    }
                }
            }
        }

        if stats.complete {
            stack.clear();
        } else {
            self.resume = Some(root);
            log::debug!(
                "bounds refresh stopped early: {} folded, {} pending",
                stats.folded,
                stack.len()
            );
        }
        self.stack = stack;
        stats
    }

    /// Push `Enter` for dirty visible children; returns how many visible children were clean.
    fn push_dirty_children<T: Topology + ?Sized>(
        &self,
        topo: &T,
        id: NodeId,
        stack: &mut Vec<Visit>,
    ) -> usize {
        let mut clean = 0;
        for &child in topo.children(id) {
            if !topo.is_visible(child) {
                continue;
            }
            if self.is_dirty(child) {
                stack.push(Visit::Enter(child));
            } else {
                clean += 1;
            }
        }
        clean
    }

    /// Fold children into `id`. Returns false (leaving it dirty) if a visible child is dirty.
    fn fold<T: Topology + ?Sized>(&mut self, topo: &T, id: NodeId) -> bool {
        let mut rect = topo.own_rect(id);
        for &child in topo.children(id) {
            if !topo.is_visible(child) {
                continue;
            }
            match self.entry(child) {
                Some(e) if e.dirty => return false,
                Some(e) => rect = rect.union(e.rect),
                None => {}
            }
        }
        match self.entry_mut(id) {
            Some(entry) => {
                entry.rect = rect;
                entry.dirty = false;
                true
            }
            None => false,
        }
    }

    // --- lifecycle, driven by the tree ---

    pub(crate) fn create(&mut self, id: NodeId, parent: Option<NodeId>, rect: Rect) {
        if self.entries.len() <= id.idx() {
            self.entries.resize_with(id.idx() + 1, || None);
        }
        self.entries[id.idx()] = Some(BoundsEntry {
            generation: id.1,
            parent,
            rect,
            dirty: true,
        });
    }

    pub(crate) fn destroy(&mut self, id: NodeId) {
        if self.entry(id).is_some() {
            self.entries[id.idx()] = None;
        }
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(e) = self.entry_mut(id) {
            e.parent = parent;
        }
    }

    /// Dirty a single entry without touching its ancestors.
    pub(crate) fn mark_local(&mut self, id: NodeId) {
        if let Some(e) = self.entry_mut(id) {
            e.dirty = true;
        }
    }

    fn entry(&self, id: NodeId) -> Option<&BoundsEntry> {
        self.entries
            .get(id.idx())?
            .as_ref()
            .filter(|e| e.generation == id.1)
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut BoundsEntry> {
        self.entries
            .get_mut(id.idx())?
            .as_mut()
            .filter(|e| e.generation == id.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{PollLimit, Unbounded};
    use crate::tree::Tree;
    use crate::types::NodeData;
    use kurbo::{Point, Size};

    fn node(x: f64, y: f64) -> NodeData {
        NodeData::new(Point::new(x, y), Size::new(10.0, 10.0))
    }

    /// Root R with children A, B, C in a row.
    fn abc() -> (Tree, [NodeId; 4]) {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(100.0, 0.0));
        let a = tree.insert(Some(r), node(0.0, 50.0));
        let b = tree.insert(Some(r), node(100.0, 50.0));
        let c = tree.insert(Some(r), node(200.0, 50.0));
        let stats = tree.refresh(&Unbounded);
        assert!(stats.complete);
        (tree, [r, a, b, c])
    }

    #[test]
    fn clean_root_covers_children() {
        let (tree, [r, ..]) = abc();
        assert_eq!(tree.bounds().rect(r), Some(Rect::new(0.0, 0.0, 210.0, 60.0)));
        assert_eq!(tree.bounds().dirty_count(), 0);
    }

    #[test]
    fn moving_one_child_dirties_only_its_chain() {
        let (mut tree, [r, a, b, c]) = abc();
        let before_b = tree.bounds().rect(b);
        let before_c = tree.bounds().rect(c);

        tree.set_position(a, Point::new(-50.0, 80.0));
        assert!(tree.bounds().is_dirty(a));
        assert!(tree.bounds().is_dirty(r));
        assert!(!tree.bounds().is_dirty(b));
        assert!(!tree.bounds().is_dirty(c));

        let stats = tree.refresh(&Unbounded);
        assert_eq!(stats.folded, 2, "only R and A are folded");
        assert_eq!(stats.skipped_clean, 2, "B and C are skipped");
        assert_eq!(tree.bounds().rect(b), before_b);
        assert_eq!(tree.bounds().rect(c), before_c);
        assert_eq!(tree.bounds().rect(r), Some(Rect::new(-50.0, 0.0, 210.0, 90.0)));
    }

    #[test]
    fn second_refresh_is_idle() {
        let (mut tree, [_, a, ..]) = abc();
        tree.set_position(a, Point::new(5.0, 5.0));
        let first = tree.refresh(&Unbounded);
        assert!(first.folded > 0);
        let second = tree.refresh(&Unbounded);
        assert_eq!(second, RefreshStats::IDLE);
    }

    #[test]
    fn mark_dirty_short_circuits_at_dirty_ancestor() {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(0.0, 0.0));
        let a = tree.insert(Some(r), node(0.0, 20.0));
        let b = tree.insert(Some(a), node(0.0, 40.0));
        let _ = tree.refresh(&Unbounded);

        // Dirty the middle of the chain by hand, then mark the leaf.
        tree.bounds_mut().mark_local(a);
        tree.mark_dirty(b);
        assert!(tree.bounds().is_dirty(b));
        assert!(tree.bounds().is_dirty(a));
        assert!(
            !tree.bounds().is_dirty(r),
            "walk stops at the first dirty ancestor"
        );
    }

    #[test]
    fn exhausted_budget_leaves_everything_dirty() {
        let (mut tree, [r, a, ..]) = abc();
        tree.set_position(a, Point::new(1.0, 1.0));
        let stats = tree.refresh(&PollLimit::new(0));
        assert!(!stats.complete);
        assert_eq!(stats.folded, 0);
        assert!(tree.bounds().is_dirty(a));
        assert!(tree.bounds().is_dirty(r));
    }

    #[test]
    fn partial_refresh_folds_leaves_first() {
        let (mut tree, [r, a, ..]) = abc();
        tree.set_position(a, Point::new(1.0, 1.0));
        // Enter R, enter A, fold A, then stop before folding R.
        let stats = tree.refresh(&PollLimit::new(3));
        assert!(!stats.complete);
        assert_eq!(stats.folded, 1);
        assert!(!tree.bounds().is_dirty(a));
        assert!(tree.bounds().is_dirty(r));
        let rest = tree.refresh(&Unbounded);
        assert!(rest.complete);
        assert_eq!(rest.folded, 1, "only R was left");
    }

    #[test]
    fn resumed_pass_sees_nodes_dirtied_in_between() {
        let (mut tree, [r, a, b, _]) = abc();
        tree.set_position(a, Point::new(1.0, 1.0));
        // Enter R, enter A, then stop with both folds pending.
        let first = tree.refresh(&PollLimit::new(2));
        assert!(!first.complete);
        assert_eq!(tree.bounds().pending_root(), Some(r));

        tree.set_position(b, Point::new(300.0, 300.0));
        let rest = tree.refresh(&Unbounded);
        assert!(rest.complete);
        assert_eq!(rest.folded, 3);
        assert_eq!(tree.bounds().pending_root(), None);
        assert_eq!(
            tree.bounds().rect(r),
            Some(Rect::new(1.0, 0.0, 310.0, 310.0))
        );
    }

    #[test]
    fn hidden_children_are_excluded() {
        let (mut tree, [r, a, b, c]) = abc();
        tree.hide(c);
        let _ = tree.refresh(&Unbounded);
        assert_eq!(tree.bounds().rect(r), Some(Rect::new(0.0, 0.0, 110.0, 60.0)));

        // A hidden subtree is not refreshed while hidden.
        tree.set_position(c, Point::new(500.0, 500.0));
        let stats = tree.refresh(&Unbounded);
        assert!(tree.bounds().is_dirty(c));
        assert_eq!(tree.bounds().rect(r), Some(Rect::new(0.0, 0.0, 110.0, 60.0)));
        assert!(!tree.bounds().is_dirty(r));
        assert!(stats.complete);

        tree.show(c);
        let _ = tree.refresh(&Unbounded);
        assert!(!tree.bounds().is_dirty(c));
        assert_eq!(
            tree.bounds().rect(r),
            Some(Rect::new(0.0, 0.0, 510.0, 510.0))
        );
        let _ = (a, b);
    }
}
