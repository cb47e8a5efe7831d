// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile cache and LOD.
//!
//! Bakes shape tiles, then draws one node as the view zooms out, printing which path
//! the tile cache took and what it cost. A shape with an unknown color shows the
//! outline fallback.
//!
//! Run:
//! - `RUST_LOG=warn cargo run -p canopy_demos --example tile_lod`

use canopy_render::{
    ColorTable, DrawCommand, FanTriangulator, Polygon, RecordingCanvas, RenderTileCache,
    ShapeCatalog, ShapePart,
};
use canopy_tree::{NodeData, ShapeId, ShapeTransform, Tree, Unbounded};
use kurbo::{Point, Size, Vec2};

fn tally(canvas: &RecordingCanvas) -> (usize, usize, usize) {
    canvas.on_screen().fold((0, 0, 0), |(t, l, b), c| match c {
        DrawCommand::Triangle { .. } => (t + 1, l, b),
        DrawCommand::Line { .. } => (t, l + 1, b),
        DrawCommand::Blit { .. } => (t, l, b + 1),
        _ => (t, l, b),
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let hexagon = Polygon::new(
        (0..6)
            .map(|i| {
                let angle = std::f64::consts::PI * f64::from(i) / 3.0;
                Point::new(angle.cos(), angle.sin())
            })
            .collect(),
    );
    let square = Polygon::new(vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ]);
    let catalog = ShapeCatalog::new(
        vec![
            vec![ShapePart::new("red", hexagon)],
            vec![ShapePart::new("blue", square.clone())],
            vec![ShapePart::new("chartreuse", square)],
        ],
        ColorTable::default(),
    )?;

    let mut canvas = RecordingCanvas::new();
    let mut tiles = RenderTileCache::default();
    let failed = tiles.prepare(&catalog, &mut canvas, &mut FanTriangulator::default());
    println!("{failed} shape(s) failed to bake");

    let mut tree = Tree::new();
    let node = tree.insert(
        None,
        NodeData::new(Point::ZERO, Size::new(100.0, 100.0)).with_shapes(vec![
            ShapeTransform::new(ShapeId(0), Vec2::ZERO),
            ShapeTransform::new(ShapeId(1), Vec2::new(1.5, -0.5)).highlighted(),
        ]),
    );
    let broken = tree.insert(
        None,
        NodeData::new(Point::new(200.0, 0.0), Size::new(100.0, 100.0))
            .with_shapes(vec![ShapeTransform::new(ShapeId(2), Vec2::ZERO)]),
    );

    for side in [150.0_f64, 400.0, 1000.0] {
        let area = side * side;
        for id in [node, broken] {
            canvas.clear();
            let data = tree.get(id).ok_or_else(|| anyhow::anyhow!("node vanished"))?;
            let path = tiles.draw_node(id, data, area, &catalog, &mut canvas, false);
            let (t, l, b) = tally(&canvas);
            println!(
                "view {side:>6}px  {id:?}: {path:?} ({t} triangles, {l} lines, {b} blits)"
            );
        }
        let baked = tiles.bake_pending(10, &Unbounded, &tree, &catalog, &mut canvas);
        println!("  bake queue: {baked:?}");
    }

    tiles.release(&mut canvas);
    Ok(())
}
