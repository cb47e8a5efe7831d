// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene facade: one owner for the tree, grid, caches and scheduler.

use canopy_render::{Canvas, ShapeCatalog, Triangulator};
use canopy_tree::{Direction, NodeData, NodeFlags, NodeId, Tree, Unbounded, navigate};
use crossbeam_channel::Sender;
use kurbo::{Point, Rect, Size};

use crate::camera::{Camera, FRAME_MARGIN};
use crate::context::{FrameContext, PositionUpdate, SceneConfig, sync_grid};
use crate::scheduler::{FrameReport, FrameScheduler, Stage};

/// A tree scene driven one frame at a time.
///
/// Every mutation keeps the bounds cache, the hit-test grid and the tile cache
/// consistent with the tree.
pub struct Scene<C: Canvas + 'static> {
    ctx: FrameContext<C>,
    scheduler: FrameScheduler<C>,
    closed: bool,
}

impl<C: Canvas + 'static> core::fmt::Debug for Scene<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("ctx", &self.ctx)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl<C: Canvas + 'static> Scene<C> {
    /// Build an empty scene and bake every shape of `catalog` into tiles.
    ///
    /// Shapes that fail to bake are logged; nodes using them draw as outlines.
    pub fn new<T: Triangulator + ?Sized>(
        catalog: ShapeCatalog,
        canvas: C,
        triangulator: &mut T,
        config: SceneConfig,
    ) -> Self {
        let mut ctx = FrameContext::new(catalog, canvas, &config);
        let failed = ctx.tiles.prepare(&ctx.catalog, &mut ctx.canvas, triangulator);
        if failed > 0 {
            log::warn!("{failed} shapes failed to bake and will draw as outlines");
        }
        let mut scheduler = FrameScheduler::with_default_stages(config.frame);
        scheduler.initialize(&mut ctx);
        Self {
            ctx,
            scheduler,
            closed: false,
        }
    }

    /// Append a stage after the built-in ones. It is initialized right away.
    pub fn push_stage(&mut self, mut stage: impl Stage<C> + 'static) {
        stage.initialize(&mut self.ctx);
        self.scheduler.push(stage);
    }

    /// Shared state, for stages and inspection.
    pub fn context(&self) -> &FrameContext<C> {
        &self.ctx
    }

    /// Mutable shared state. Direct edits bypass grid and key bookkeeping.
    pub fn context_mut(&mut self) -> &mut FrameContext<C> {
        &mut self.ctx
    }

    /// The node tree.
    pub fn tree(&self) -> &Tree {
        &self.ctx.tree
    }

    /// The drawing backend.
    pub fn canvas(&self) -> &C {
        &self.ctx.canvas
    }

    /// The drawing backend, mutably.
    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.ctx.canvas
    }

    /// Add a node, registering its key and grid point.
    pub fn insert(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let key = data.key;
        let id = self.ctx.tree.insert(parent, data);
        if let Some(key) = key {
            if let Some(old) = self.ctx.keys.insert(key, id) {
                log::warn!("key {key} moved from {old:?} to {id:?}");
            }
        }
        self.move_entity(id);
        id
    }

    /// Remove a node and its subtree. Returns how many nodes went away.
    pub fn remove(&mut self, id: NodeId) -> usize {
        let keyed = self.keys_in_subtree(id);
        self.release_pointers(id);
        let removed = self.ctx.tree.remove(id);
        for &gone in &removed {
            self.ctx.grid.forget(gone);
            self.ctx.tiles.forget_node(gone);
            self.ctx.motion.cancel(gone);
        }
        for (key, owner) in keyed {
            if self.ctx.keys.get(&key) == Some(&owner) {
                self.ctx.keys.remove(&key);
            }
        }
        removed.len()
    }

    /// External keys registered in the subtree of `id`, with their nodes.
    fn keys_in_subtree(&self, id: NodeId) -> Vec<(u64, NodeId)> {
        let tree = &self.ctx.tree;
        let mut keyed = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = tree.get(n) else {
                continue;
            };
            if let Some(key) = node.key {
                keyed.push((key, n));
            }
            stack.extend_from_slice(tree.children(n));
        }
        keyed
    }

    /// Clear the selection and hover if they lie in the subtree of `id`.
    fn release_pointers(&mut self, id: NodeId) {
        let tree = &self.ctx.tree;
        let inside = |n: Option<NodeId>| n.is_some_and(|n| is_in_subtree(tree, id, n));
        if inside(self.ctx.selected) {
            self.ctx.selected = None;
        }
        if inside(self.ctx.hovered) {
            self.ctx.hovered = None;
        }
    }

    /// Move a subtree under another parent (or make it a root).
    pub fn reparent(&mut self, id: NodeId, parent: Option<NodeId>) -> bool {
        self.ctx.tree.reparent(id, parent)
    }

    /// Mark a node's bounds stale after an external change.
    pub fn mark_dirty(&mut self, id: NodeId) {
        self.ctx.tree.mark_dirty(id);
    }

    /// Re-register a node in the grid from its current position.
    pub fn move_entity(&mut self, id: NodeId) -> bool {
        self.ctx.move_entity(id)
    }

    /// Jump a node to `position` now, cancelling any animation.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> bool {
        self.ctx.motion.cancel(id);
        let changed = self.ctx.tree.set_position(id, position);
        if changed {
            self.move_entity(id);
        }
        changed
    }

    /// Move a node toward `position` over the following frames.
    pub fn set_target(&mut self, id: NodeId, position: Point, animate: bool) {
        if let Some(node) = self.ctx.tree.get(id) {
            self.ctx
                .motion
                .set_target(id, node.position, position, animate);
        }
    }

    /// Hide a node and its subtree. Selection and hover inside it are cleared.
    pub fn hide(&mut self, id: NodeId) {
        self.release_pointers(id);
        self.ctx.tree.hide(id);
    }

    /// Hide several subtrees.
    pub fn hide_set(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            self.hide(id);
        }
    }

    /// Show a hidden node and its subtree.
    pub fn show(&mut self, id: NodeId) {
        self.ctx.tree.show(id);
    }

    /// Show every hidden node. Returns how many hidden subtrees were restored.
    pub fn show_all(&mut self) -> usize {
        self.ctx.tree.show_all()
    }

    /// Node registered under an external key.
    pub fn node_for_key(&self, key: u64) -> Option<NodeId> {
        self.ctx.keys.get(&key).copied()
    }

    /// Sender for layout positions, applied at the start of each frame.
    pub fn position_sender(&self) -> Sender<PositionUpdate> {
        self.ctx.position_sender()
    }

    /// The visible, pickable node under a world point. The newest node wins ties.
    pub fn query_point(&self, point: Point) -> Option<NodeId> {
        let tree = &self.ctx.tree;
        self.ctx
            .grid
            .query(point.x, point.y)
            .filter(|&id| {
                tree.get(id).is_some_and(|n| {
                    n.flags.contains(NodeFlags::VISIBLE | NodeFlags::PICKABLE)
                        && n.rect().contains(point)
                })
            })
            .reduce(|a, b| if b.is_newer_than(a) { b } else { a })
    }

    /// Set the selected node.
    pub fn select(&mut self, id: Option<NodeId>) {
        self.ctx.selected = id.filter(|&id| self.ctx.tree.is_alive(id));
    }

    /// Selected node.
    pub fn selected(&self) -> Option<NodeId> {
        self.ctx.selected
    }

    /// Update the hovered node from a world point.
    pub fn hover(&mut self, point: Point) -> Option<NodeId> {
        self.ctx.hovered = self.query_point(point);
        self.ctx.hovered
    }

    /// Hovered node.
    pub fn hovered(&self) -> Option<NodeId> {
        self.ctx.hovered
    }

    /// Move the selection one step. With nothing selected, selects the first root.
    pub fn navigate(&mut self, direction: Direction) -> Option<NodeId> {
        let next = match self.ctx.selected {
            Some(from) => navigate(&self.ctx.tree, from, direction),
            None => self.ctx.tree.roots().first().copied(),
        };
        if next.is_some() {
            self.ctx.selected = next;
        }
        next
    }

    /// Bounding box of a node's visible subtree as of the last refresh.
    pub fn visible_bounding_box(&self, id: NodeId) -> Option<Rect> {
        self.ctx.tree.visible_bounding_box(id)
    }

    /// A camera fitting a node's visible subtree on a `screen`-sized view.
    ///
    /// Refreshes the subtree's bounds first, so the result is exact even mid-animation.
    pub fn frame_node(&mut self, id: NodeId, screen: Size) -> Option<Camera> {
        let _ = self.ctx.tree.refresh_subtree(id, &Unbounded);
        let rect = self.ctx.tree.visible_bounding_box(id)?;
        Camera::frame_rect(rect, screen, FRAME_MARGIN)
    }

    /// Run one frame for the given visible world rectangle.
    pub fn run_frame(&mut self, viewport: Rect) -> FrameReport {
        self.ctx.viewport = viewport;
        self.scheduler.run_frame(&mut self.ctx)
    }

    /// Close every stage and free every texture. Further calls do nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.scheduler.close(&mut self.ctx);
        self.ctx.tiles.release(&mut self.ctx.canvas);
    }

    /// Replace the scene's tree, rebuilding keys, grid and node tiles.
    pub fn load_tree(&mut self, tree: Tree) {
        let ctx = &mut self.ctx;
        for (id, _) in ctx.tree.iter() {
            ctx.tiles.forget_node(id);
        }
        ctx.tree = tree;
        ctx.grid.clear();
        ctx.keys.clear();
        ctx.motion.clear();
        ctx.selected = None;
        ctx.hovered = None;
        for (id, node) in ctx.tree.iter() {
            sync_grid(&mut ctx.grid, id, node);
            if let Some(key) = node.key {
                ctx.keys.insert(key, id);
            }
        }
    }
}

/// True if `node` is `root` or one of its descendants.
fn is_in_subtree(tree: &Tree, root: NodeId, node: NodeId) -> bool {
    let mut cursor = Some(node);
    while let Some(n) = cursor {
        if n == root {
            return true;
        }
        cursor = tree.parent(n);
    }
    false
}
