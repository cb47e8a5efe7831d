// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical visibility culling over cached subtree bounds.

use alloc::vec::Vec;
use kurbo::{Point, Rect};

use crate::budget::Budget;
use crate::tree::Tree;
use crate::types::{NodeData, NodeId};

/// Vertical gap between a node and the end of an edge attached to it.
pub const EDGE_GAP: f64 = 8.0;

/// Which part of a parent/child connector a segment is.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    /// Vertical segment from under the parent down to the connector row.
    ParentStub,
    /// Vertical segment from the connector row down to above a child.
    ChildStub,
    /// Horizontal segment joining the stubs of one row, clipped to the viewport.
    Connector,
}

/// One straight edge segment in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeSegment {
    /// Segment kind.
    pub kind: EdgeKind,
    /// Start point.
    pub from: Point,
    /// End point.
    pub to: Point,
    /// Parent node the segment belongs to.
    pub parent: NodeId,
}

/// Receives the output of a culling pass.
pub trait CullVisitor {
    /// A visible node whose own rectangle intersects the viewport.
    ///
    /// `over_budget` is true once the frame budget is exhausted; the node must still be
    /// drawn, as cheaply as possible.
    fn draw_node(&mut self, id: NodeId, node: &NodeData, over_budget: bool);

    /// An edge segment that intersects the viewport.
    fn draw_edge(&mut self, edge: EdgeSegment);

    /// A node that was walked through (its subtree reaches the viewport) but is not itself
    /// on screen.
    fn offscreen(&mut self, id: NodeId, node: &NodeData) {
        let _ = (id, node);
    }
}

/// Counters reported by [`Culler::cull`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Nodes popped from the walk stack.
    pub visited: usize,
    /// Nodes handed to [`CullVisitor::draw_node`].
    pub drawn: usize,
    /// Subtrees discarded because their clean bounds miss the viewport.
    pub pruned: usize,
    /// Edge segments emitted.
    pub edges: usize,
    /// Nodes reported through [`CullVisitor::offscreen`].
    pub offscreen: usize,
}

#[derive(Copy, Clone, Debug)]
struct Stub {
    row_y: f64,
    x: f64,
    y: f64,
}

/// Reusable state for culling walks.
#[derive(Clone, Debug, Default)]
pub struct Culler {
    stack: Vec<NodeId>,
    stubs: Vec<Stub>,
}

impl Culler {
    /// Create a culler with empty scratch buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk every visible root top-down, drawing what intersects `viewport`.
    ///
    /// A subtree is discarded only when its entry is clean and misses the viewport; stale
    /// entries are always descended. The walk never stops early: the budget only tells the
    /// visitor to draw cheaply.
    pub fn cull<V, B>(
        &mut self,
        tree: &Tree,
        viewport: Rect,
        visitor: &mut V,
        budget: &B,
    ) -> CullStats
    where
        V: CullVisitor + ?Sized,
        B: Budget + ?Sized,
    {
        let mut stats = CullStats::default();
        let mut over_budget = false;
        self.stack.clear();
        self.stack.extend(
            tree.roots()
                .iter()
                .rev()
                .filter(|r| tree.get(**r).is_some_and(NodeData::is_visible)),
        );

        while let Some(id) = self.stack.pop() {
            let Some(node) = tree.get(id) else {
                continue;
            };
            stats.visited += 1;
            let bounds = tree.bounds();
            if !bounds.is_dirty(id) {
                if let Some(rect) = bounds.rect(id) {
                    if !overlaps(rect, viewport) {
                        stats.pruned += 1;
                        continue;
                    }
                }
            }

            over_budget = over_budget || budget.exhausted();
            if overlaps(node.rect(), viewport) {
                visitor.draw_node(id, node, over_budget);
                stats.drawn += 1;
            } else {
                visitor.offscreen(id, node);
                stats.offscreen += 1;
            }

            stats.edges += self.emit_edges(tree, id, node, viewport, visitor);

            let start = self.stack.len();
            self.stack.extend(
                tree.children(id)
                    .iter()
                    .filter(|c| tree.get(**c).is_some_and(NodeData::is_visible)),
            );
            self.stack[start..].reverse();
        }
        stats
    }

    fn emit_edges<V: CullVisitor + ?Sized>(
        &mut self,
        tree: &Tree,
        parent: NodeId,
        node: &NodeData,
        viewport: Rect,
        visitor: &mut V,
    ) -> usize {
        let rect = node.rect();
        let x1 = rect.center().x;
        let y1 = rect.y1 + EDGE_GAP;

        self.stubs.clear();
        for &child in tree.children(parent) {
            let Some(c) = tree.get(child).filter(|c| c.is_visible()) else {
                continue;
            };
            let cr = c.rect();
            let y2 = cr.y0 - EDGE_GAP;
            self.stubs.push(Stub {
                row_y: (y1 + y2) / 2.0,
                x: cr.center().x,
                y: y2,
            });
        }
        self.stubs.sort_by(|a, b| a.row_y.total_cmp(&b.row_y));

        let mut emitted = 0;
        let mut emit = |kind, from, to| {
            visitor.draw_edge(EdgeSegment {
                kind,
                from,
                to,
                parent,
            });
            emitted += 1;
        };

        let mut i = 0;
        while i < self.stubs.len() {
            let row_y = self.stubs[i].row_y;
            let mut j = i;
            let (mut min_x, mut max_x) = (x1, x1);
            while j < self.stubs.len() && self.stubs[j].row_y == row_y {
                let s = self.stubs[j];
                min_x = min_x.min(s.x);
                max_x = max_x.max(s.x);
                if vertical_in_view(s.x, row_y, s.y, viewport) {
                    emit(
                        EdgeKind::ChildStub,
                        Point::new(s.x, row_y),
                        Point::new(s.x, s.y),
                    );
                }
                j += 1;
            }
            if vertical_in_view(x1, y1, row_y, viewport) {
                emit(
                    EdgeKind::ParentStub,
                    Point::new(x1, y1),
                    Point::new(x1, row_y),
                );
            }
            if min_x < max_x && row_y >= viewport.y0 && row_y <= viewport.y1 {
                let lo = min_x.max(viewport.x0);
                let hi = max_x.min(viewport.x1);
                if lo <= hi {
                    emit(
                        EdgeKind::Connector,
                        Point::new(lo, row_y),
                        Point::new(hi, row_y),
                    );
                }
            }
            i = j;
        }
        emitted
    }
}

/// Closed-interval rectangle overlap; touching edges count.
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

fn vertical_in_view(x: f64, ya: f64, yb: f64, viewport: Rect) -> bool {
    let (top, bottom) = if ya <= yb { (ya, yb) } else { (yb, ya) };
    x >= viewport.x0 && x <= viewport.x1 && bottom >= viewport.y0 && top <= viewport.y1
}
