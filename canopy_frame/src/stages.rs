// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in stages of the default pipeline.

use canopy_render::{Canvas, DrawPath, Palette, RenderTileCache, ShapeCatalog};
use canopy_tree::{CullVisitor, Culler, Deadline, EdgeSegment, NodeData, NodeId};

use crate::context::FrameContext;
use crate::scheduler::Stage;

/// Retargets nodes named by queued [`PositionUpdate`](crate::PositionUpdate)s.
#[derive(Copy, Clone, Debug, Default)]
pub struct ApplyPositions;

impl<C: Canvas> Stage<C> for ApplyPositions {
    fn name(&self) -> &'static str {
        "apply_positions"
    }

    fn update(&mut self, ctx: &mut FrameContext<C>, _: &Deadline) {
        let applied = ctx.drain_updates();
        if applied > 0 {
            log::debug!("{applied} position updates applied");
        }
    }
}

/// Advances target animation by one tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct Animate;

impl<C: Canvas> Stage<C> for Animate {
    fn name(&self) -> &'static str {
        "animate"
    }

    fn update(&mut self, ctx: &mut FrameContext<C>, _: &Deadline) {
        ctx.motion.step(&mut ctx.tree, &mut ctx.grid);
    }
}

/// Folds dirty subtree bounds until the deadline.
#[derive(Copy, Clone, Debug, Default)]
pub struct RefreshBounds;

impl<C: Canvas> Stage<C> for RefreshBounds {
    fn name(&self) -> &'static str {
        "refresh_bounds"
    }

    fn update(&mut self, ctx: &mut FrameContext<C>, deadline: &Deadline) {
        ctx.last_refresh = ctx.tree.refresh(deadline);
    }
}

/// Walks the visible tree, drawing backgrounds, node content and edges.
///
/// Nodes walked through but off screen are offered to the tile cache for a
/// low-priority bake.
#[derive(Clone, Debug, Default)]
pub struct DrawScene {
    culler: Culler,
}

impl<C: Canvas> Stage<C> for DrawScene {
    fn name(&self) -> &'static str {
        "draw"
    }

    fn update(&mut self, ctx: &mut FrameContext<C>, deadline: &Deadline) {
        let viewport = ctx.viewport;
        let mut painter = Painter {
            tiles: &mut ctx.tiles,
            catalog: &ctx.catalog,
            canvas: &mut ctx.canvas,
            palette: &ctx.palette,
            selected: ctx.selected,
            hovered: ctx.hovered,
            viewport_area: viewport.area(),
        };
        ctx.last_cull = self.culler.cull(&ctx.tree, viewport, &mut painter, deadline);
    }
}

struct Painter<'a, C> {
    tiles: &'a mut RenderTileCache,
    catalog: &'a ShapeCatalog,
    canvas: &'a mut C,
    palette: &'a Palette,
    selected: Option<NodeId>,
    hovered: Option<NodeId>,
    viewport_area: f64,
}

impl<C: Canvas> CullVisitor for Painter<'_, C> {
    fn draw_node(&mut self, id: NodeId, node: &NodeData, over_budget: bool) {
        let background = self
            .palette
            .background_for(self.selected == Some(id), self.hovered == Some(id));
        self.canvas.fill_rect(node.rect(), background);
        let path = self.tiles.draw_node(
            id,
            node,
            self.viewport_area,
            self.catalog,
            &mut *self.canvas,
            over_budget,
        );
        if path == DrawPath::Outline && over_budget {
            log::trace!("{id:?} drawn as outline over budget");
        }
    }

    fn draw_edge(&mut self, edge: EdgeSegment) {
        let width = self.tiles.config().line_width;
        self.canvas
            .draw_line(edge.from, edge.to, width, self.palette.edge);
    }

    fn offscreen(&mut self, id: NodeId, _: &NodeData) {
        self.tiles.enqueue_offscreen(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SceneConfig;
    use canopy_render::{
        ColorTable, DrawCommand, FanTriangulator, Polygon, RecordingCanvas, ShapePart,
    };
    use canopy_tree::{ShapeId, ShapeTransform, Unbounded};
    use kurbo::{Point, Rect, Size, Vec2};

    fn context() -> FrameContext<RecordingCanvas> {
        let square = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]);
        let catalog =
            ShapeCatalog::new(vec![vec![ShapePart::new("red", square)]], ColorTable::default())
                .unwrap();
        let mut ctx = FrameContext::new(catalog, RecordingCanvas::new(), &SceneConfig::default());
        ctx.tiles
            .prepare(&ctx.catalog, &mut ctx.canvas, &mut FanTriangulator::default());
        ctx.canvas.clear();
        ctx
    }

    fn far() -> Deadline {
        Deadline::after(core::time::Duration::from_secs(60))
    }

    #[test]
    fn draw_fills_backgrounds_and_edges() {
        let mut ctx = context();
        let shapes = vec![ShapeTransform::new(ShapeId(0), Vec2::ZERO)];
        let root = ctx.tree.insert(
            None,
            NodeData::new(Point::ZERO, Size::new(20.0, 20.0)).with_shapes(shapes.clone()),
        );
        let child = ctx.tree.insert(
            Some(root),
            NodeData::new(Point::new(100.0, 100.0), Size::new(20.0, 20.0)).with_shapes(shapes),
        );
        ctx.selected = Some(child);
        let _ = ctx.tree.refresh(&Unbounded);
        ctx.viewport = Rect::new(-50.0, -50.0, 150.0, 150.0);

        DrawScene::default().update(&mut ctx, &far());
        assert_eq!(ctx.last_cull.drawn, 2);
        assert_eq!(ctx.last_cull.edges, 3, "parent stub, child stub, connector");

        let selected = ctx.palette.selected;
        let backgrounds = ctx
            .canvas
            .on_screen()
            .filter(|c| matches!(c, DrawCommand::Triangle { color, .. } if *color == selected))
            .count();
        assert_eq!(backgrounds, 2, "selected node background is two triangles");
        let edges = ctx
            .canvas
            .on_screen()
            .filter(|c| matches!(c, DrawCommand::Line { color, .. } if *color == ctx.palette.edge))
            .count();
        assert_eq!(edges, 3);
        // 400 / 40000 is below 1/40: both nodes wait for their tiles.
        assert_eq!(ctx.tiles.pending_bakes(), 2);
    }

    #[test]
    fn offscreen_parents_are_queued_for_later() {
        let mut ctx = context();
        let shapes = vec![ShapeTransform::new(ShapeId(0), Vec2::ZERO)];
        let root = ctx.tree.insert(
            None,
            NodeData::new(Point::ZERO, Size::new(20.0, 20.0)).with_shapes(shapes.clone()),
        );
        let child = ctx.tree.insert(
            Some(root),
            NodeData::new(Point::new(0.0, 1000.0), Size::new(20.0, 20.0)).with_shapes(shapes),
        );
        let _ = ctx.tree.refresh(&Unbounded);
        ctx.viewport = Rect::new(-10.0, 990.0, 40.0, 1040.0);

        DrawScene::default().update(&mut ctx, &far());
        assert_eq!(ctx.last_cull.drawn, 1);
        assert_eq!(ctx.last_cull.offscreen, 1);
        assert_eq!(ctx.tiles.pending_bakes(), 2);

        let stats = ctx.tiles.bake_pending(
            10,
            &Unbounded,
            &ctx.tree,
            &ctx.catalog,
            &mut ctx.canvas,
        );
        assert_eq!(stats.baked, 2);
        assert!(ctx.tiles.is_node_baked(root));
        assert!(ctx.tiles.is_node_baked(child));
    }

    #[test]
    fn animate_and_refresh_follow_position_updates() {
        let mut ctx = context();
        let id = ctx
            .tree
            .insert(None, NodeData::new(Point::ZERO, Size::new(10.0, 10.0)).with_key(3));
        ctx.keys.insert(3, id);
        let _ = ctx.tree.refresh(&Unbounded);
        ctx.position_sender()
            .send(crate::PositionUpdate {
                key: 3,
                position: Point::new(100.0, 0.0),
                animate: false,
            })
            .unwrap();

        let deadline = far();
        ApplyPositions.update(&mut ctx, &deadline);
        Animate.update(&mut ctx, &deadline);
        RefreshBounds.update(&mut ctx, &deadline);
        assert_eq!(ctx.last_refresh.folded, 1);
        assert_eq!(
            ctx.tree.visible_bounding_box(id),
            Some(Rect::new(100.0, 0.0, 110.0, 10.0))
        );
        assert_eq!(ctx.grid.locate(id), Some(ctx.grid.cell_of(105.0, 5.0)));
    }
}
