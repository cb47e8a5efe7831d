// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, updates, visibility.

use alloc::vec::Vec;
use kurbo::{Point, Rect, Size};

use crate::bounds::{BoundsCache, RefreshStats, Topology};
use crate::budget::Budget;
use crate::types::{NodeData, NodeFlags, NodeId};

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Slot storage, kept apart from the bounds cache so a refresh can borrow both.
#[derive(Clone, Debug, Default)]
struct Slots {
    nodes: Vec<Option<Node>>,
    // last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl Slots {
    fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())?
            .as_ref()
            .filter(|n| n.generation == id.1)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())?
            .as_mut()
            .filter(|n| n.generation == id.1)
    }

    fn alloc(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.nodes.push(None);
            self.generations.push(1);
            (self.nodes.len() - 1, 1)
        };
        self.nodes[idx] = Some(Node {
            generation,
            parent,
            children: Vec::new(),
            data,
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        NodeId::new(idx as u32, generation)
    }

    fn free(&mut self, id: NodeId) {
        if self.get(id).is_some() {
            self.nodes[id.idx()] = None;
            self.free_list.push(id.idx());
        }
    }
}

impl Topology for Slots {
    fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn own_rect(&self, id: NodeId) -> Rect {
        self.get(id).map(|n| n.data.rect()).unwrap_or(Rect::ZERO)
    }

    fn is_visible(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.data.is_visible())
    }
}

/// A forest of nodes with cached subtree bounds.
///
/// Every mutation that can change a subtree's extent dirties the bounds cache; call
/// [`Tree::refresh`] before reading bounds for culling or framing.
#[derive(Clone, Default)]
pub struct Tree {
    slots: Slots,
    bounds: BoundsCache,
    roots: Vec<NodeId>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.slots.nodes.len();
        let alive = self.slots.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.slots.free_list.len())
            .field("roots", &self.roots.len())
            .finish_non_exhaustive()
    }
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new node as the last child of `parent` (or as a root if `None`).
    ///
    /// A node inserted under a hidden parent starts hidden. A stale `parent` inserts a root.
    pub fn insert(&mut self, parent: Option<NodeId>, mut data: NodeData) -> NodeId {
        let parent = parent.filter(|p| self.is_alive(*p));
        if let Some(p) = parent {
            if !self.slots.is_visible(p) {
                data.flags.remove(NodeFlags::VISIBLE);
            }
        }
        let rect = data.rect();
        let id = self.slots.alloc(parent, data);
        self.bounds.create(id, parent, rect);
        match parent {
            Some(p) => {
                if let Some(node) = self.slots.get_mut(p) {
                    node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.bounds.mark_dirty(id);
        id
    }

    /// Remove a node and its whole subtree. Returns the removed ids, `id` first.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.slots.get(id).map(|n| n.parent) else {
            return Vec::new();
        };
        match parent {
            Some(p) => {
                self.unlink(id, p);
                self.bounds.mark_dirty(p);
            }
            None => self.roots.retain(|r| *r != id),
        }

        let mut removed = Vec::new();
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.slots.get(n) {
                stack.extend(node.children.iter().rev().copied());
            }
            self.bounds.destroy(n);
            self.slots.free(n);
            removed.push(n);
        }
        removed
    }

    /// Move `id` under `new_parent` (or make it a root).
    ///
    /// Returns false, changing nothing, if either id is stale or if `new_parent` lies inside
    /// the subtree of `id`.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        let Some(old_parent) = self.slots.get(id).map(|n| n.parent) else {
            return false;
        };
        if let Some(p) = new_parent {
            if !self.is_alive(p) || self.is_ancestor_or_self(id, p) {
                return false;
            }
        }
        if old_parent == new_parent {
            return true;
        }
        match old_parent {
            Some(p) => {
                self.unlink(id, p);
                self.bounds.mark_dirty(p);
            }
            None => self.roots.retain(|r| *r != id),
        }
        match new_parent {
            Some(p) => {
                if let Some(node) = self.slots.get_mut(p) {
                    node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        if let Some(node) = self.slots.get_mut(id) {
            node.parent = new_parent;
        }
        self.bounds.set_parent(id, new_parent);
        if new_parent.is_some_and(|p| !self.slots.is_visible(p)) {
            self.hide(id);
        } else {
            self.bounds.mark_dirty(id);
        }
        true
    }

    /// Set the node's world-space top-left corner. Returns true if it changed.
    ///
    /// Moving a hidden node leaves its visible ancestors clean; [`Tree::show`] dirties
    /// them when the node comes back.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> bool {
        match self.slots.get_mut(id) {
            Some(node) if node.data.position != position => {
                node.data.position = position;
                self.mark_changed(id);
                true
            }
            _ => false,
        }
    }

    /// Set the node's world-space size. Returns true if it changed.
    pub fn set_size(&mut self, id: NodeId, size: Size) -> bool {
        match self.slots.get_mut(id) {
            Some(node) if node.data.size != size => {
                node.data.size = size;
                self.mark_changed(id);
                true
            }
            _ => false,
        }
    }

    fn mark_changed(&mut self, id: NodeId) {
        if self.slots.is_visible(id) {
            self.bounds.mark_dirty(id);
        } else {
            self.bounds.mark_local(id);
        }
    }

    /// Toggle whether the node takes part in hit testing.
    pub fn set_pickable(&mut self, id: NodeId, pickable: bool) {
        if let Some(node) = self.slots.get_mut(id) {
            node.data.flags.set(NodeFlags::PICKABLE, pickable);
        }
    }

    /// Hide a node and its subtree.
    ///
    /// The parent's bounds shrink on the next refresh. Hidden entries keep their last
    /// rectangle and are neither refreshed nor drawn until shown again.
    pub fn hide(&mut self, id: NodeId) {
        let Some(parent) = self.slots.get(id).map(|n| n.parent) else {
            return;
        };
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.slots.get_mut(n) {
                node.data.flags.remove(NodeFlags::VISIBLE);
                stack.extend_from_slice(&node.children);
            }
        }
        if let Some(p) = parent {
            self.bounds.mark_dirty(p);
        }
    }

    /// Show a node and its subtree again.
    ///
    /// Every entry in the subtree is dirtied, since descendants may have moved while hidden.
    /// Does nothing under a hidden parent: show the topmost hidden node instead.
    pub fn show(&mut self, id: NodeId) {
        if !self.is_alive(id) || self.parent(id).is_some_and(|p| !self.slots.is_visible(p)) {
            return;
        }
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.slots.get_mut(n) {
                node.data.flags.insert(NodeFlags::VISIBLE);
                stack.extend_from_slice(&node.children);
            }
            self.bounds.mark_local(n);
        }
        self.bounds.mark_dirty(id);
    }

    /// Show every hidden node. Returns the number of hidden subtrees restored.
    pub fn show_all(&mut self) -> usize {
        let tops: Vec<NodeId> = self
            .iter()
            .filter(|(_, node)| !node.is_visible())
            .map(|(id, _)| id)
            .filter(|id| self.parent(*id).is_none_or(|p| self.slots.is_visible(p)))
            .collect();
        for &id in &tops {
            self.show(id);
        }
        tops.len()
    }

    /// Mark a node's bounds stale, together with its ancestors.
    pub fn mark_dirty(&mut self, id: NodeId) {
        self.bounds.mark_dirty(id);
    }

    /// Refresh dirty bounds under every visible root until the budget runs out.
    ///
    /// Roots are refreshed in order; an interrupted root is resumed first on the next call.
    pub fn refresh<B: Budget + ?Sized>(&mut self, budget: &B) -> RefreshStats {
        let mut stats = RefreshStats::IDLE;
        if let Some(pending) = self.bounds.pending_root() {
            stats.merge(self.bounds.refresh(&self.slots, pending, budget));
            if !stats.complete {
                return stats;
            }
        }
        for &root in &self.roots {
            stats.merge(self.bounds.refresh(&self.slots, root, budget));
            if !stats.complete {
                break;
            }
        }
        stats
    }

    /// Refresh dirty bounds under one node until the budget runs out.
    ///
    /// An interrupted pass of another root is finished first, so its progress is kept.
    pub fn refresh_subtree<B: Budget + ?Sized>(&mut self, id: NodeId, budget: &B) -> RefreshStats {
        let mut stats = RefreshStats::IDLE;
        if let Some(pending) = self.bounds.pending_root().filter(|p| *p != id) {
            stats.merge(self.bounds.refresh(&self.slots, pending, budget));
            if !stats.complete {
                return stats;
            }
        }
        stats.merge(self.bounds.refresh(&self.slots, id, budget));
        stats
    }

    /// Cached bounds of the node's visible subtree.
    ///
    /// `None` for stale ids and hidden nodes. While the entry is dirty this is the
    /// last refreshed value.
    pub fn visible_bounding_box(&self, id: NodeId) -> Option<Rect> {
        if !self.slots.is_visible(id) {
            return None;
        }
        self.bounds.rect(id)
    }

    /// The bounds cache, read-only.
    pub fn bounds(&self) -> &BoundsCache {
        &self.bounds
    }

    #[cfg(test)]
    pub(crate) fn bounds_mut(&mut self) -> &mut BoundsCache {
        &mut self.bounds
    }

    /// Node data for a live id.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.slots.get(id).map(|n| &n.data)
    }

    /// Parent of a live node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(id).and_then(|n| n.parent)
    }

    /// Children of a node in insertion order. Empty for stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slots.children(id)
    }

    /// Root nodes in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.slots.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.nodes.len() - self.slots.free_list.len()
    }

    /// True if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every live node in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeData)> + '_ {
        self.slots.nodes.iter().enumerate().filter_map(|(i, slot)| {
            let node = slot.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            Some((NodeId::new(i as u32, node.generation), &node.data))
        })
    }

    // --- internals ---

    fn unlink(&mut self, id: NodeId, parent: NodeId) {
        if let Some(p) = self.slots.get_mut(parent) {
            p.children.retain(|c| *c != id);
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent(id) {
                Some(p) => id = p,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use crate::budget::Unbounded;

    fn node(x: f64, y: f64) -> NodeData {
        NodeData::new(Point::new(x, y), Size::new(10.0, 10.0))
    }

    #[test]
    fn insert_builds_structure_and_dirty_bounds() {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(0.0, 0.0));
        let a = tree.insert(Some(r), node(0.0, 20.0));
        let b = tree.insert(Some(r), node(20.0, 20.0));
        assert_eq!(tree.roots(), &[r]);
        assert_eq!(tree.children(r), &[a, b]);
        assert_eq!(tree.parent(a), Some(r));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.bounds().dirty_count(), 3);
        let stats = tree.refresh(&Unbounded);
        assert_eq!(stats.folded, 3);
        assert_eq!(tree.visible_bounding_box(r), Some(Rect::new(0.0, 0.0, 30.0, 30.0)));
    }

    #[test]
    fn remove_frees_subtree_and_bumps_generation() {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(0.0, 0.0));
        let a = tree.insert(Some(r), node(0.0, 20.0));
        let a1 = tree.insert(Some(a), node(0.0, 40.0));
        let _ = tree.refresh(&Unbounded);

        let removed = tree.remove(a);
        assert_eq!(removed, vec![a, a1]);
        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(a1));
        assert!(tree.children(r).is_empty());
        assert!(tree.bounds().is_dirty(r));
        let _ = tree.refresh(&Unbounded);
        assert_eq!(tree.visible_bounding_box(r), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));

        let b = tree.insert(Some(r), node(5.0, 5.0));
        assert!(b.is_newer_than(a) || b.slot() != a.slot());
        assert!(tree.get(a).is_none(), "stale id stays stale after slot reuse");
    }

    #[test]
    fn reparent_moves_bounds_and_rejects_cycles() {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(0.0, 0.0));
        let a = tree.insert(Some(r), node(100.0, 0.0));
        let b = tree.insert(Some(a), node(200.0, 0.0));
        let _ = tree.refresh(&Unbounded);

        assert!(!tree.reparent(a, Some(b)), "cannot move under own descendant");
        assert!(tree.reparent(b, Some(r)));
        assert_eq!(tree.children(r), &[a, b]);
        let _ = tree.refresh(&Unbounded);
        assert_eq!(
            tree.visible_bounding_box(a),
            Some(Rect::new(100.0, 0.0, 110.0, 10.0))
        );
        assert_eq!(
            tree.visible_bounding_box(r),
            Some(Rect::new(0.0, 0.0, 210.0, 10.0))
        );

        assert!(tree.reparent(b, None));
        assert_eq!(tree.roots(), &[r, b]);
    }

    #[test]
    fn insert_under_hidden_parent_starts_hidden() {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(0.0, 0.0));
        let a = tree.insert(Some(r), node(0.0, 20.0));
        tree.hide(a);
        let a1 = tree.insert(Some(a), node(0.0, 40.0));
        assert!(!tree.get(a1).unwrap().is_visible());
        assert_eq!(tree.visible_bounding_box(a1), None);
        tree.show(a);
        assert!(tree.get(a1).unwrap().is_visible());
    }

    #[test]
    fn show_all_restores_topmost_hidden_subtrees() {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(0.0, 0.0));
        let a = tree.insert(Some(r), node(0.0, 20.0));
        let a1 = tree.insert(Some(a), node(0.0, 40.0));
        let b = tree.insert(Some(r), node(20.0, 20.0));
        tree.hide(a);
        tree.hide(b);
        let _ = tree.refresh(&Unbounded);
        assert_eq!(tree.visible_bounding_box(r), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));

        assert_eq!(tree.show_all(), 2);
        assert!(tree.iter().all(|(_, n)| n.is_visible()));
        let _ = tree.refresh(&Unbounded);
        assert_eq!(tree.visible_bounding_box(r), Some(Rect::new(0.0, 0.0, 30.0, 50.0)));
        assert!(!tree.bounds().is_dirty(a1));
    }

    #[test]
    fn set_position_reports_changes() {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(0.0, 0.0));
        let _ = tree.refresh(&Unbounded);
        assert!(!tree.set_position(r, Point::new(0.0, 0.0)));
        assert!(!tree.bounds().is_dirty(r));
        assert!(tree.set_position(r, Point::new(1.0, 0.0)));
        assert!(tree.bounds().is_dirty(r));
        assert!(tree.set_size(r, Size::new(5.0, 5.0)));
        let _ = tree.refresh(&Unbounded);
        assert_eq!(tree.visible_bounding_box(r), Some(Rect::new(1.0, 0.0, 6.0, 5.0)));
    }

    #[test]
    fn moving_hidden_nodes_keeps_visible_ancestors_clean() {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(0.0, 0.0));
        let a = tree.insert(Some(r), node(0.0, 20.0));
        let a1 = tree.insert(Some(a), node(0.0, 40.0));
        tree.hide(a);
        let _ = tree.refresh(&Unbounded);

        assert!(tree.set_position(a1, Point::new(500.0, 40.0)));
        assert!(tree.set_size(a, Size::new(20.0, 20.0)));
        assert!(!tree.bounds().is_dirty(r));
        assert_eq!(tree.refresh(&Unbounded).folded, 0);

        tree.show(a);
        let _ = tree.refresh(&Unbounded);
        assert_eq!(
            tree.visible_bounding_box(r),
            Some(Rect::new(0.0, 0.0, 510.0, 50.0))
        );
    }

    #[test]
    fn show_under_a_hidden_parent_does_nothing() {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(0.0, 0.0));
        let a = tree.insert(Some(r), node(0.0, 20.0));
        let a1 = tree.insert(Some(a), node(0.0, 40.0));
        tree.hide(a);
        let _ = tree.refresh(&Unbounded);

        tree.show(a1);
        assert!(!tree.get(a1).unwrap().is_visible());
        assert!(!tree.bounds().is_dirty(r));
        tree.show(a);
        assert!(tree.get(a1).unwrap().is_visible());
    }

    #[test]
    fn subtree_refresh_finishes_an_interrupted_root_first() {
        let mut tree = Tree::new();
        let r = tree.insert(None, node(0.0, 0.0));
        let mut last = r;
        for i in 1..20 {
            last = tree.insert(Some(last), node(0.0, f64::from(i) * 20.0));
        }
        let other = tree.insert(None, node(100.0, 0.0));
        let partial = tree.refresh(&crate::budget::PollLimit::new(5));
        assert!(!partial.complete);
        assert_eq!(tree.bounds().pending_root(), Some(r));

        let stats = tree.refresh_subtree(other, &Unbounded);
        assert!(stats.complete);
        assert_eq!(stats.folded, 21, "the chain of 20 and the other root");
        assert_eq!(tree.bounds().pending_root(), None);
        assert_eq!(tree.bounds().dirty_count(), 0);
        assert_eq!(
            tree.visible_bounding_box(r),
            Some(Rect::new(0.0, 0.0, 10.0, 390.0))
        );
    }
}
