// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene basics.
//!
//! Build a small tree, move a child, hide a subtree, hit-test, and frame the camera.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p canopy_demos --example scene_basics`

use canopy_frame::{Scene, SceneConfig};
use canopy_render::{
    ColorTable, FanTriangulator, Polygon, RecordingCanvas, ShapeCatalog, ShapePart,
};
use canopy_tree::{Direction, NodeData, ShapeId, ShapeTransform};
use kurbo::{Point, Rect, Size, Vec2};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let diamond = Polygon::new(vec![
        Point::new(0.5, 0.0),
        Point::new(1.0, 0.5),
        Point::new(0.5, 1.0),
        Point::new(0.0, 0.5),
    ]);
    let catalog = ShapeCatalog::new(
        vec![vec![ShapePart::new("blue", diamond)]],
        ColorTable::default(),
    )?;
    let mut scene = Scene::new(
        catalog,
        RecordingCanvas::new(),
        &mut FanTriangulator::default(),
        SceneConfig::default(),
    );

    let shapes = vec![ShapeTransform::new(ShapeId(0), Vec2::ZERO)];
    let node = |x: f64, y: f64| {
        NodeData::new(Point::new(x, y), Size::new(100.0, 100.0)).with_shapes(shapes.clone())
    };
    let root = scene.insert(None, node(150.0, 0.0));
    let a = scene.insert(Some(root), node(0.0, 200.0));
    let b = scene.insert(Some(root), node(150.0, 200.0));
    let c = scene.insert(Some(root), node(300.0, 200.0));
    let _ = scene.insert(Some(b), node(150.0, 400.0));

    let view = Rect::new(-50.0, -50.0, 450.0, 550.0);
    let report = scene.run_frame(view);
    println!(
        "first frame: folded {} drawn {} edges {} baked {}",
        report.refresh.folded, report.cull.drawn, report.cull.edges, report.bakes.baked
    );

    // Only A and the root are refreshed after moving A.
    scene.set_position(a, Point::new(0.0, 250.0));
    let report = scene.run_frame(view);
    println!("after moving A: folded {}", report.refresh.folded);
    assert_eq!(report.refresh.folded, 2, "moving A refreshes A and the root only");

    scene.hide(b);
    let report = scene.run_frame(view);
    println!("with B hidden: drawn {}", report.cull.drawn);
    println!("root box: {:?}", scene.visible_bounding_box(root));

    let hit = scene.query_point(Point::new(350.0, 250.0));
    println!("hit at (350, 250): {hit:?}");
    assert_eq!(hit, Some(c), "C sits under (350, 250)");

    scene.select(Some(a));
    println!("right of A: {:?}", scene.navigate(Direction::Right));

    scene.show_all();
    if let Some(camera) = scene.frame_node(root, Size::new(1280.0, 720.0)) {
        println!("camera: {camera:?}");
    }

    for (name, elapsed) in report.stages.iter().map(|s| (s.name, s.elapsed)) {
        println!("  {name:>16}: {elapsed:?}");
    }
    scene.close();
    Ok(())
}
