// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Frame: frame-budget scheduling for large animated trees.
//!
//! A [`Scene`] owns a [`canopy_tree::Tree`], a [`canopy_grid::SpatialGrid`] for hit
//! testing and a [`canopy_render::RenderTileCache`], and runs them once per displayed
//! frame through a [`FrameScheduler`]:
//!
//! 1. [`ApplyPositions`] drains [`PositionUpdate`]s sent by the layout provider.
//! 2. [`Animate`] advances target animation; nodes that move are marked dirty and
//!    re-registered in the grid.
//! 3. [`RefreshBounds`] folds dirty subtree bounds until the deadline.
//! 4. [`DrawScene`] walks the visible tree and draws every on-screen node at its LOD.
//! 5. The scheduler bakes queued node tiles with whatever time is left.
//!
//! All stages share one deadline computed at frame start. Running out of time never
//! fails a frame: refresh resumes next frame, drawing falls back to tiles and outlines,
//! and bakes wait.
//!
//! ## Example
//!
//! ```
//! use canopy_frame::{PositionUpdate, Scene, SceneConfig};
//! use canopy_render::{ColorTable, FanTriangulator, RecordingCanvas, ShapeCatalog};
//! use canopy_tree::NodeData;
//! use kurbo::{Point, Rect, Size};
//!
//! let catalog = ShapeCatalog::new(Vec::new(), ColorTable::default()).unwrap();
//! let mut scene = Scene::new(
//!     catalog,
//!     RecordingCanvas::new(),
//!     &mut FanTriangulator::default(),
//!     SceneConfig::default(),
//! );
//! let root = scene.insert(None, NodeData::new(Point::ZERO, Size::new(10.0, 10.0)).with_key(1));
//!
//! scene
//!     .position_sender()
//!     .send(PositionUpdate { key: 1, position: Point::new(50.0, 0.0), animate: false })
//!     .unwrap();
//! let report = scene.run_frame(Rect::new(0.0, 0.0, 100.0, 100.0));
//! assert_eq!(report.cull.drawn, 1);
//! assert_eq!(scene.visible_bounding_box(root), Some(Rect::new(50.0, 0.0, 60.0, 10.0)));
//! assert_eq!(scene.query_point(Point::new(55.0, 5.0)), Some(root));
//! ```

pub mod camera;
mod context;
pub mod motion;
mod scene;
mod scheduler;
mod stages;

pub use camera::Camera;
pub use context::{FrameContext, PositionUpdate, SceneConfig};
pub use scene::Scene;
pub use scheduler::{FrameConfig, FrameReport, FrameScheduler, Stage, StageTiming};
pub use stages::{Animate, ApplyPositions, DrawScene, RefreshBounds};
