// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Render: level-of-detail node drawing over a pluggable canvas.
//!
//! Nodes of a [`canopy_tree::Tree`] carry lists of placed shapes. This crate turns those
//! into draw calls, choosing per node how much work to spend:
//!
//! - [`ShapeCatalog`] validates shape geometry once and resolves part colors through a
//!   [`ColorTable`].
//! - [`RenderTileCache::prepare`] triangulates every shape and bakes it into a tile of a
//!   [`ShelfAtlas`] page. A shape that cannot be baked is recorded as failed and the
//!   nodes using it draw as outlines; nothing is fatal.
//! - [`RenderTileCache::draw_node`] picks a [`Lod`] from the node's share of the
//!   visible area: tiny nodes blit a baked node tile, medium nodes blit shape tiles and
//!   redraw highlighted shapes, large nodes redraw everything as vectors.
//! - Node tiles are baked from a queue by [`RenderTileCache::bake_pending`], bounded by a
//!   count and a [`canopy_tree::Budget`].
//!
//! The backend is anything implementing [`Canvas`]; triangulation is a [`Triangulator`].
//! [`RecordingCanvas`] and [`FanTriangulator`] are small built-in implementations for
//! tests and headless runs.
//!
//! ## Example
//!
//! ```
//! use canopy_render::{
//!     ColorTable, DrawPath, FanTriangulator, Polygon, RecordingCanvas, RenderTileCache,
//!     ShapeCatalog, ShapePart,
//! };
//! use canopy_tree::{NodeData, ShapeId, ShapeTransform, Tree};
//! use kurbo::{Point, Size, Vec2};
//!
//! let square = Polygon::new(vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 0.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(0.0, 1.0),
//! ]);
//! let catalog =
//!     ShapeCatalog::new(vec![vec![ShapePart::new("blue", square)]], ColorTable::default())
//!         .unwrap();
//!
//! let mut canvas = RecordingCanvas::new();
//! let mut tiles = RenderTileCache::default();
//! assert_eq!(tiles.prepare(&catalog, &mut canvas, &mut FanTriangulator::default()), 0);
//!
//! let mut tree = Tree::new();
//! let node = NodeData::new(Point::ZERO, Size::new(50.0, 50.0))
//!     .with_shapes(vec![ShapeTransform::new(ShapeId(0), Vec2::ZERO)]);
//! let id = tree.insert(None, node);
//!
//! // The node covers the whole view: drawn as vectors, and queued for a tile bake.
//! let path = tiles.draw_node(id, tree.get(id).unwrap(), 2500.0, &catalog, &mut canvas, false);
//! assert_eq!(path, DrawPath::Vector);
//! assert_eq!(tiles.pending_bakes(), 1);
//! ```

mod atlas;
mod canvas;
mod color;
mod error;
mod lod;
mod record;
mod shape;
mod tiles;

pub use atlas::{AtlasSlot, MAX_TEXTURE_SIZE, ShelfAtlas, SlotAtlas, SlotIndex};
pub use canvas::{Canvas, FanTriangulator, TextureId, Triangle, Triangulator};
pub use color::{ColorPair, ColorTable, Palette, Rgba8, ShapeColors};
pub use error::{BakeError, CatalogError, ColorError, TriangulateError};
pub use lod::{Lod, LodPolicy};
pub use record::{DrawCommand, RecordingCanvas};
pub use shape::{NodeLayout, Polygon, ShapeCatalog, ShapeDef, ShapePart};
pub use tiles::{BakeStats, DrawPath, RenderTileCache, TileConfig, TileState};
