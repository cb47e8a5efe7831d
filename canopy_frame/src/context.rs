// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared per-scene state handed to every stage.

use std::collections::HashMap;

use canopy_grid::SpatialGrid;
use canopy_render::{Canvas, LodPolicy, Palette, RenderTileCache, ShapeCatalog, TileConfig};
use canopy_tree::{CullStats, NodeData, NodeId, RefreshStats, Tree};
use crossbeam_channel::{Receiver, Sender};
use kurbo::{Point, Rect};

use crate::motion::{DEFAULT_TICKS, Motion};
use crate::scheduler::FrameConfig;

/// A position pushed by the layout provider, keyed by the node's external key.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PositionUpdate {
    /// External node key.
    pub key: u64,
    /// New top-left corner.
    pub position: Point,
    /// Glide there instead of jumping.
    pub animate: bool,
}

/// Everything a scene can be configured with.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SceneConfig {
    /// Frame budget and bake cap.
    pub frame: FrameConfig,
    /// Tile and atlas sizes.
    pub tiles: TileConfig,
    /// LOD thresholds.
    pub lod: LodPolicy,
    /// Hit-test grid cell size; must exceed the largest node footprint.
    pub cell_size: f64,
    /// Node background and edge colors.
    pub palette: Palette,
    /// Ticks an animated move takes.
    pub motion_ticks: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            tiles: TileConfig::default(),
            lod: LodPolicy::default(),
            cell_size: 256.0,
            palette: Palette::default(),
            motion_ticks: DEFAULT_TICKS,
        }
    }
}

/// State shared by the stages of a [`FrameScheduler`](crate::FrameScheduler).
///
/// Fields are public: stages are free to reach into whichever caches they drive.
pub struct FrameContext<C> {
    /// Node storage and bounds cache.
    pub tree: Tree,
    /// Hit-test index, one registered point (the node center) per node.
    pub grid: SpatialGrid<NodeId>,
    /// Baked shapes and node tiles.
    pub tiles: RenderTileCache,
    /// Shape definitions.
    pub catalog: ShapeCatalog,
    /// Drawing backend.
    pub canvas: C,
    /// Visible world rectangle for the current frame.
    pub viewport: Rect,
    /// Node background and edge colors.
    pub palette: Palette,
    /// Selected node.
    pub selected: Option<NodeId>,
    /// Hovered node.
    pub hovered: Option<NodeId>,
    /// Pending animated moves.
    pub motion: Motion,
    /// External key to node lookup.
    pub keys: HashMap<u64, NodeId>,
    /// Outcome of the last bounds refresh.
    pub last_refresh: RefreshStats,
    /// Outcome of the last draw walk.
    pub last_cull: CullStats,
    sender: Sender<PositionUpdate>,
    updates: Receiver<PositionUpdate>,
}

impl<C> core::fmt::Debug for FrameContext<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameContext")
            .field("tree", &self.tree)
            .field("grid_len", &self.grid.len())
            .field("tiles", &self.tiles)
            .field("viewport", &self.viewport)
            .field("selected", &self.selected)
            .field("hovered", &self.hovered)
            .field("moving", &self.motion.len())
            .finish_non_exhaustive()
    }
}

impl<C: Canvas> FrameContext<C> {
    /// An empty scene over `catalog`, drawing into `canvas`. Shape tiles are not baked yet.
    pub fn new(catalog: ShapeCatalog, canvas: C, config: &SceneConfig) -> Self {
        let (sender, updates) = crossbeam_channel::unbounded();
        Self {
            tree: Tree::new(),
            grid: SpatialGrid::new(config.cell_size),
            tiles: RenderTileCache::new(config.tiles, config.lod),
            catalog,
            canvas,
            viewport: Rect::ZERO,
            palette: config.palette,
            selected: None,
            hovered: None,
            motion: Motion::new(config.motion_ticks),
            keys: HashMap::new(),
            last_refresh: RefreshStats::default(),
            last_cull: CullStats::default(),
            sender,
            updates,
        }
    }

    /// A sender for the layout provider. Updates are applied at the start of a frame.
    pub fn position_sender(&self) -> Sender<PositionUpdate> {
        self.sender.clone()
    }

    /// Retarget every node named by the queued position updates. Returns how many
    /// updates were applied; unknown keys are skipped.
    pub fn drain_updates(&mut self) -> usize {
        let mut applied = 0;
        for update in self.updates.try_iter() {
            let Some(&id) = self.keys.get(&update.key) else {
                log::debug!("position update for unknown key {}", update.key);
                continue;
            };
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            self.motion
                .set_target(id, node.position, update.position, update.animate);
            applied += 1;
        }
        applied
    }

    /// Re-register a node in the grid from its current position.
    ///
    /// Returns true if the node changed cells.
    pub fn move_entity(&mut self, id: NodeId) -> bool {
        match self.tree.get(id) {
            Some(node) => sync_grid(&mut self.grid, id, node),
            None => self.grid.forget(id),
        }
    }
}

/// Register `node` at its center, flagging footprints the grid cannot guarantee to find.
pub(crate) fn sync_grid(grid: &mut SpatialGrid<NodeId>, id: NodeId, node: &NodeData) -> bool {
    let cell = grid.cell_size();
    if node.size.width > cell || node.size.height > cell {
        log::warn!(
            "node {id:?} is {}x{}, larger than the {cell} hit-test cell",
            node.size.width,
            node.size.height
        );
        debug_assert!(
            node.size.width <= 2.0 * cell && node.size.height <= 2.0 * cell,
            "node footprint far exceeds the hit-test cell size"
        );
    }
    let center = node.rect().center();
    grid.relocate(id, center.x, center.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_render::{ColorTable, RecordingCanvas};
    use kurbo::Size;

    fn context() -> FrameContext<RecordingCanvas> {
        let catalog = ShapeCatalog::new(Vec::new(), ColorTable::default()).unwrap();
        FrameContext::new(catalog, RecordingCanvas::new(), &SceneConfig::default())
    }

    #[test]
    fn updates_retarget_known_keys() {
        let mut ctx = context();
        let id = ctx.tree.insert(
            None,
            NodeData::new(Point::ZERO, Size::new(10.0, 10.0)).with_key(7),
        );
        ctx.keys.insert(7, id);
        let tx = ctx.position_sender();
        for key in [7, 8] {
            tx.send(PositionUpdate {
                key,
                position: Point::new(50.0, 0.0),
                animate: true,
            })
            .unwrap();
        }
        assert_eq!(ctx.drain_updates(), 1);
        assert_eq!(ctx.motion.target_of(id), Some(Point::new(50.0, 0.0)));
        assert_eq!(ctx.drain_updates(), 0, "queue is drained");
    }

    #[test]
    fn move_entity_follows_the_center() {
        let mut ctx = context();
        let id = ctx
            .tree
            .insert(None, NodeData::new(Point::new(250.0, 0.0), Size::new(10.0, 10.0)));
        assert!(ctx.move_entity(id));
        assert_eq!(ctx.grid.locate(id), Some(ctx.grid.cell_of(255.0, 5.0)));
        assert!(!ctx.move_entity(id), "same cell");
        ctx.tree.set_position(id, Point::new(260.0, 0.0));
        assert!(ctx.move_entity(id), "center crossed into the next cell");
        let _ = ctx.tree.remove(id);
        assert!(ctx.move_entity(id), "removed nodes leave the grid");
        assert!(ctx.grid.is_empty());
    }
}
