// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render tile cache: baked shape tiles, baked node tiles, and per-node LOD drawing.

use std::collections::{HashMap, HashSet, VecDeque};

use canopy_tree::{Budget, NodeData, NodeId, ShapeId, ShapeTransform, Tree};
use kurbo::{Point, Rect, Size};

use crate::atlas::{AtlasSlot, MAX_TEXTURE_SIZE, ShelfAtlas, SlotAtlas, SlotIndex};
use crate::canvas::{Canvas, Triangle, Triangulator};
use crate::color::{ColorTable, Rgba8, ShapeColors};
use crate::error::BakeError;
use crate::lod::{Lod, LodPolicy};
use crate::shape::{NodeLayout, ShapeCatalog, ShapeDef};

/// Sizes and limits of a [`RenderTileCache`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TileConfig {
    /// Pixels on the longer axis of a baked shape tile.
    pub tile_extent: f64,
    /// Transparent margin around each shape tile, in pixels.
    pub tile_margin: u32,
    /// Side of a node slot in the node atlas, in pixels.
    pub node_slot: u32,
    /// Side of an atlas page, in pixels.
    pub page_size: u32,
    /// Minimum border between node content and the node edge.
    pub min_border: f64,
    /// Width of outlines.
    pub line_width: f64,
    /// Placeholder outline color.
    pub outline: Rgba8,
    /// Most off-screen nodes queued for baking per frame.
    pub offscreen_cap: usize,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            tile_extent: 800.0,
            tile_margin: 2,
            node_slot: 100,
            page_size: MAX_TEXTURE_SIZE,
            min_border: 5.0,
            line_width: 1.0,
            outline: Rgba8::LIGHT_GRAY,
            offscreen_cap: 100,
        }
    }
}

/// Bake state of one shape tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum TileState {
    /// Not baked yet.
    #[default]
    Missing,
    /// Baked and drawable.
    Baked,
    /// Baking failed; the tile is never retried.
    Failed,
}

/// How [`RenderTileCache::draw_node`] drew a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DrawPath {
    /// Blitted from the node's baked tile.
    Tile,
    /// Shape tiles blitted, highlighted shapes redrawn as vectors.
    Mixed,
    /// Every shape redrawn as vectors.
    Vector,
    /// Placeholder outline.
    Outline,
    /// Nothing to draw.
    Empty,
}

/// Result of [`RenderTileCache::bake_pending`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BakeStats {
    /// Node tiles baked.
    pub baked: usize,
    /// Queued nodes dropped (removed, or nothing bakeable).
    pub skipped: usize,
    /// Nodes still queued.
    pub remaining: usize,
}

#[derive(Clone, Debug)]
struct BakedPart {
    colors: ShapeColors,
    triangles: Vec<Triangle>,
}

#[derive(Clone, Debug, Default)]
struct ShapeTile {
    state: TileState,
    slot: Option<AtlasSlot>,
    parts: Vec<BakedPart>,
}

#[derive(Copy, Clone, Debug)]
enum NodeBake {
    Baked { index: SlotIndex, region: Rect },
    Unbakeable,
}

/// Caches triangulated shapes, shape tiles and node tiles, and draws nodes at the
/// level of detail their on-screen size calls for.
///
/// Shape tiles are baked once per scene and live until [`RenderTileCache::release`].
/// Node tiles are baked lazily from a queue and never invalidated by movement.
pub struct RenderTileCache {
    config: TileConfig,
    lod: LodPolicy,
    shapes: Vec<ShapeTile>,
    shape_atlas: ShelfAtlas,
    node_atlas: SlotAtlas,
    nodes: HashMap<NodeId, NodeBake>,
    queue: VecDeque<NodeId>,
    queued: HashSet<NodeId>,
    later: Vec<NodeId>,
}

impl core::fmt::Debug for RenderTileCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderTileCache")
            .field("config", &self.config)
            .field("shapes", &self.shapes.len())
            .field("nodes", &self.nodes.len())
            .field("queued", &self.queued.len())
            .field("later", &self.later.len())
            .finish_non_exhaustive()
    }
}

impl Default for RenderTileCache {
    fn default() -> Self {
        Self::new(TileConfig::default(), LodPolicy::default())
    }
}

impl RenderTileCache {
    /// An empty cache.
    pub fn new(config: TileConfig, lod: LodPolicy) -> Self {
        Self {
            config,
            lod,
            shapes: Vec::new(),
            shape_atlas: ShelfAtlas::new(config.page_size),
            node_atlas: SlotAtlas::new(config.node_slot, config.page_size),
            nodes: HashMap::new(),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            later: Vec::new(),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &TileConfig {
        &self.config
    }

    /// LOD thresholds in use.
    pub fn lod(&self) -> &LodPolicy {
        &self.lod
    }

    /// Bake every shape of the catalog. Returns how many failed.
    ///
    /// Failures are logged and recorded; nodes using a failed shape draw as outlines.
    pub fn prepare<C, T>(
        &mut self,
        catalog: &ShapeCatalog,
        canvas: &mut C,
        triangulator: &mut T,
    ) -> usize
    where
        C: Canvas + ?Sized,
        T: Triangulator + ?Sized,
    {
        let mut failed = 0;
        for id in catalog.ids() {
            if self.ensure_baked(id, catalog, canvas, triangulator).is_err() {
                failed += 1;
            }
        }
        log::debug!(
            "baked {} shape tiles on {} pages, {failed} failed",
            catalog.len() - failed,
            self.shape_atlas.page_count()
        );
        failed
    }

    /// Bake one shape tile unless it already is. Failures are recorded and not retried.
    pub fn ensure_baked<C, T>(
        &mut self,
        shape: ShapeId,
        catalog: &ShapeCatalog,
        canvas: &mut C,
        triangulator: &mut T,
    ) -> Result<(), BakeError>
    where
        C: Canvas + ?Sized,
        T: Triangulator + ?Sized,
    {
        let def = catalog.get(shape).ok_or(BakeError::UnknownShape(shape))?;
        if self.shapes.len() < catalog.len() {
            self.shapes.resize_with(catalog.len(), ShapeTile::default);
        }
        match self.shapes[shape.index()].state {
            TileState::Baked => return Ok(()),
            TileState::Failed => return Err(BakeError::Failed(shape)),
            TileState::Missing => {}
        }
        match self.bake_shape(shape, def, catalog.colors(), canvas, triangulator) {
            Ok(tile) => {
                self.shapes[shape.index()] = tile;
                Ok(())
            }
            Err(err) => {
                match &err {
                    BakeError::Color { .. } => log::error!("{err}"),
                    _ => log::warn!("{err}"),
                }
                self.shapes[shape.index()].state = TileState::Failed;
                Err(err)
            }
        }
    }

    fn bake_shape<C, T>(
        &mut self,
        shape: ShapeId,
        def: &ShapeDef,
        colors: &ColorTable,
        canvas: &mut C,
        triangulator: &mut T,
    ) -> Result<ShapeTile, BakeError>
    where
        C: Canvas + ?Sized,
        T: Triangulator + ?Sized,
    {
        let mut parts = Vec::with_capacity(def.parts().len());
        for part in def.parts() {
            let c = colors
                .resolve(&part.color)
                .map_err(|source| BakeError::Color { shape, source })?;
            parts.push(c);
        }
        let parts = parts
            .into_iter()
            .zip(def.parts())
            .enumerate()
            .map(|(i, (colors, part))| {
                let triangles = match triangulator.triangulate(&part.polygon) {
                    Ok(t) => t,
                    Err(source) => triangulator
                        .triangulate(&part.polygon.reversed())
                        .map_err(|_| BakeError::Triangulate {
                            shape,
                            part: i,
                            source,
                        })?,
                };
                Ok(BakedPart { colors, triangles })
            })
            .collect::<Result<Vec<_>, BakeError>>()?;

        let b = def.bounds();
        let scale = self.config.tile_extent / b.width().max(b.height());
        let m = self.config.tile_margin;
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "Tile extents are small positive pixel counts."
        )]
        let (width, height) = (
            (scale * b.width()).ceil() as u32 + 2 * m,
            (scale * b.height()).ceil() as u32 + 2 * m,
        );
        let slot = self
            .shape_atlas
            .allocate(canvas, width, height)
            .ok_or(BakeError::TooLarge {
                shape,
                width,
                height,
            })?;

        let inner = f64::from(m);
        let map = |p: Point| {
            Point::new(
                slot.rect.x0 + inner + scale * (p.x - b.x0),
                slot.rect.y0 + inner + scale * (b.y1 - p.y),
            )
        };
        canvas.begin_offscreen(slot.texture, slot.rect);
        for (part, baked) in def.parts().iter().zip(&parts) {
            let pair = baked.colors.normal;
            for t in &baked.triangles {
                canvas.draw_triangle(t.map(&map), pair.fill);
            }
            let outline: Vec<Point> = part.polygon.points.iter().map(|p| map(*p)).collect();
            canvas.stroke_closed(&outline, self.config.line_width, pair.border);
        }
        canvas.end_offscreen();

        Ok(ShapeTile {
            state: TileState::Baked,
            slot: Some(slot),
            parts,
        })
    }

    /// Bake state of a shape tile.
    pub fn tile_state(&self, shape: ShapeId) -> TileState {
        self.shapes
            .get(shape.index())
            .map_or(TileState::Missing, |t| t.state)
    }

    fn baked_tile(&self, shape: ShapeId) -> Option<&ShapeTile> {
        self.shapes
            .get(shape.index())
            .filter(|t| t.state == TileState::Baked)
    }

    fn shapes_ready(&self, placements: &[ShapeTransform]) -> bool {
        placements.iter().all(|t| self.baked_tile(t.shape).is_some())
    }

    /// True if the node has a baked tile.
    pub fn is_node_baked(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(&id), Some(NodeBake::Baked { .. }))
    }

    fn node_tile(&self, id: NodeId) -> Option<(AtlasSlot, Rect)> {
        match self.nodes.get(&id)? {
            NodeBake::Baked { index, region } => {
                let slot = self.node_atlas.slot(*index)?;
                Some((slot, *region))
            }
            NodeBake::Unbakeable => None,
        }
    }

    /// Draw one node (without its background).
    ///
    /// `viewport_area` is the visible world area used for LOD selection. When
    /// `over_budget` is set the cheapest path is taken whatever the node's size: its baked
    /// tile, else an outline. Nodes without a baked tile are queued for baking.
    pub fn draw_node<C: Canvas + ?Sized>(
        &mut self,
        id: NodeId,
        node: &NodeData,
        viewport_area: f64,
        catalog: &ShapeCatalog,
        canvas: &mut C,
        over_budget: bool,
    ) -> DrawPath {
        let rect = node.rect();
        if !self.shapes_ready(&node.shapes) {
            canvas.stroke_rect(rect, self.config.line_width, self.config.outline);
            return DrawPath::Outline;
        }
        let Some(content) = catalog.content_bounds(&node.shapes) else {
            return DrawPath::Empty;
        };
        let lod = if over_budget {
            Lod::Tile
        } else {
            self.lod.choose(rect.area(), viewport_area)
        };
        if lod == Lod::Tile {
            return match self.node_tile(id) {
                Some((slot, region)) => {
                    canvas.blit(slot.texture, region, rect);
                    DrawPath::Tile
                }
                None => {
                    canvas.stroke_rect(rect, self.config.line_width, self.config.outline);
                    self.enqueue_bake(id);
                    DrawPath::Outline
                }
            };
        }
        let Some(layout) = NodeLayout::fit(content, node.size, self.config.min_border) else {
            return DrawPath::Empty;
        };
        let at = node.position;
        for placement in &node.shapes {
            if lod == Lod::Mixed && !placement.highlight {
                self.blit_shape(canvas, catalog, &layout, at, placement);
            } else {
                self.draw_shape(canvas, catalog, &layout, at, placement);
            }
        }
        self.enqueue_bake(id);
        if lod == Lod::Mixed {
            DrawPath::Mixed
        } else {
            DrawPath::Vector
        }
    }

    fn blit_shape<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        catalog: &ShapeCatalog,
        layout: &NodeLayout,
        at: Point,
        placement: &ShapeTransform,
    ) {
        let (Some(def), Some(tile)) = (catalog.get(placement.shape), self.baked_tile(placement.shape))
        else {
            return;
        };
        let Some(slot) = tile.slot else {
            return;
        };
        let src = slot.rect.inset(-f64::from(self.config.tile_margin));
        let dst = layout.map_rect(at, def.bounds() + placement.offset);
        canvas.blit(slot.texture, src, dst);
    }

    fn draw_shape<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        catalog: &ShapeCatalog,
        layout: &NodeLayout,
        at: Point,
        placement: &ShapeTransform,
    ) {
        let (Some(def), Some(tile)) = (catalog.get(placement.shape), self.baked_tile(placement.shape))
        else {
            return;
        };
        let map = |p: Point| layout.map(at, p + placement.offset);
        for (part, baked) in def.parts().iter().zip(&tile.parts) {
            let pair = baked.colors.pick(placement.highlight);
            for t in &baked.triangles {
                canvas.draw_triangle(t.map(&map), pair.fill);
            }
            let outline: Vec<Point> = part.polygon.points.iter().map(|p| map(*p)).collect();
            canvas.stroke_closed(&outline, self.config.line_width, pair.border);
        }
    }

    /// Queue a node for baking. Returns `false` if it is already queued, baked, or
    /// known to be unbakeable.
    pub fn enqueue_bake(&mut self, id: NodeId) -> bool {
        if self.nodes.contains_key(&id) || !self.queued.insert(id) {
            return false;
        }
        self.queue.push_back(id);
        true
    }

    /// Queue an off-screen node for baking after every on-screen one.
    ///
    /// At most `offscreen_cap` nodes are held; the list is dropped at the end of each
    /// [`RenderTileCache::bake_pending`]. Returns `false` if the node was not queued.
    pub fn enqueue_offscreen(&mut self, id: NodeId) -> bool {
        if self.later.len() >= self.config.offscreen_cap
            || self.nodes.contains_key(&id)
            || self.queued.contains(&id)
            || self.later.contains(&id)
        {
            return false;
        }
        self.later.push(id);
        true
    }

    /// Nodes waiting for a bake, on-screen and off-screen.
    pub fn pending_bakes(&self) -> usize {
        self.queued.len() + self.later.len()
    }

    /// Next on-screen request. Entries forgotten since they were queued are skipped.
    fn pop_queued(&mut self) -> Option<NodeId> {
        while let Some(id) = self.queue.pop_front() {
            if self.queued.remove(&id) {
                return Some(id);
            }
        }
        None
    }

    /// Bake up to `max` queued node tiles while `budget` lasts, on-screen nodes first.
    pub fn bake_pending<C, B>(
        &mut self,
        max: usize,
        budget: &B,
        tree: &Tree,
        catalog: &ShapeCatalog,
        canvas: &mut C,
    ) -> BakeStats
    where
        C: Canvas + ?Sized,
        B: Budget + ?Sized,
    {
        let mut stats = BakeStats::default();
        let mut later = core::mem::take(&mut self.later).into_iter();
        while stats.baked < max && !budget.exhausted() {
            let id = match self.pop_queued() {
                Some(id) => id,
                None => match later.next() {
                    Some(id) => id,
                    None => break,
                },
            };
            match tree.get(id) {
                Some(node) if self.bake_node(id, node, catalog, canvas) => stats.baked += 1,
                _ => stats.skipped += 1,
            }
        }
        stats.remaining = self.queued.len();
        if stats.remaining > 0 {
            log::debug!("{} node bakes deferred to the next frame", stats.remaining);
        }
        stats
    }

    /// Bake one node tile now. Returns `true` if the node has a tile afterwards.
    pub fn bake_node<C: Canvas + ?Sized>(
        &mut self,
        id: NodeId,
        node: &NodeData,
        catalog: &ShapeCatalog,
        canvas: &mut C,
    ) -> bool {
        match self.nodes.get(&id) {
            Some(NodeBake::Baked { .. }) => return true,
            Some(NodeBake::Unbakeable) => return false,
            None => {}
        }
        let side = f64::from(self.config.node_slot);
        let longer = node.size.width.max(node.size.height);
        let content = catalog
            .content_bounds(&node.shapes)
            .filter(|_| longer > 0.0 && self.shapes_ready(&node.shapes));
        let Some(content) = content else {
            self.nodes.insert(id, NodeBake::Unbakeable);
            return false;
        };
        // Same aspect as the node, longer axis filling the slot.
        let size = Size::new(side * node.size.width / longer, side * node.size.height / longer);
        let Some(layout) = NodeLayout::fit(content, size, self.config.min_border) else {
            self.nodes.insert(id, NodeBake::Unbakeable);
            return false;
        };
        let index = self.node_atlas.assign(canvas);
        let Some(slot) = self.node_atlas.slot(index) else {
            self.node_atlas.free(index);
            return false;
        };
        let region = Rect::from_origin_size(slot.rect.origin(), size);
        canvas.begin_offscreen(slot.texture, region);
        for placement in &node.shapes {
            if placement.highlight {
                self.draw_shape(canvas, catalog, &layout, region.origin(), placement);
            } else {
                self.blit_shape(canvas, catalog, &layout, region.origin(), placement);
            }
        }
        canvas.end_offscreen();
        self.nodes.insert(id, NodeBake::Baked { index, region });
        true
    }

    /// Drop everything cached for a node, freeing its slot.
    pub fn forget_node(&mut self, id: NodeId) {
        if let Some(NodeBake::Baked { index, .. }) = self.nodes.remove(&id) {
            self.node_atlas.free(index);
        }
        self.queued.remove(&id);
        self.later.retain(|n| *n != id);
        // Stale queue entries are skipped when popped; compact once they dominate.
        if self.queue.len() > 2 * self.queued.len() + 64 {
            let queued = &self.queued;
            self.queue.retain(|n| queued.contains(n));
        }
    }

    /// Free every texture and forget every tile.
    pub fn release<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.shape_atlas.release(canvas);
        self.node_atlas.release(canvas);
        self.shapes.clear();
        self.nodes.clear();
        self.queue.clear();
        self.queued.clear();
        self.later.clear();
    }
}
