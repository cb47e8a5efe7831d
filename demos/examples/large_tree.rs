// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Large animated tree.
//!
//! Generates a random tree, lays it out, and streams new positions from a producer
//! thread while frames run against a 16 ms budget. Prints what each frame managed and
//! what it deferred.
//!
//! Run:
//! - `RUST_LOG=info cargo run -p canopy_demos --example large_tree --release`

use std::thread;
use std::time::Duration;

use canopy_frame::{FrameConfig, PositionUpdate, Scene, SceneConfig};
use canopy_render::{
    ColorTable, FanTriangulator, Polygon, RecordingCanvas, ShapeCatalog, ShapePart,
};
use canopy_tree::{NodeData, ShapeId, ShapeTransform};
use kurbo::{Point, Rect, Size, Vec2};

const NODES: usize = 20_000;
const FRAMES: usize = 90;
const SLOT: f64 = 150.0;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

/// Each node `i > 0` hangs under a random earlier node.
fn random_parents(n: usize, rng: &mut Rng) -> Vec<Option<usize>> {
    (0..n).map(|i| (i > 0).then(|| rng.below(i))).collect()
}

/// Leaves get consecutive columns; parents sit over the middle of their children.
fn layout(parents: &[Option<usize>], flip: bool) -> Vec<Point> {
    let n = parents.len();
    let mut children = vec![Vec::new(); n];
    for (i, p) in parents.iter().enumerate() {
        if let Some(p) = *p {
            children[p].push(i);
        }
    }
    if flip {
        for c in &mut children {
            c.reverse();
        }
    }
    let mut pos = vec![Point::ZERO; n];
    let mut next_column = 0.0;
    // Post-order walk with an explicit stack: (node, depth, expanded).
    let mut stack = vec![(0usize, 0usize, false)];
    while let Some((node, depth, expanded)) = stack.pop() {
        if !expanded && !children[node].is_empty() {
            stack.push((node, depth, true));
            for &c in children[node].iter().rev() {
                stack.push((c, depth + 1, false));
            }
            continue;
        }
        let x = match (children[node].first(), children[node].last()) {
            (Some(&first), Some(&last)) => (pos[first].x + pos[last].x) / 2.0,
            _ => {
                next_column += 1.0;
                next_column * SLOT
            }
        };
        pos[node] = Point::new(x, depth as f64 * SLOT);
    }
    pos
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut rng = Rng(0x5EED_CAFE_F00D_BEEF);
    let triangle = Polygon::new(vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(0.5, 1.0),
    ]);
    let square = Polygon::new(vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ]);
    let catalog = ShapeCatalog::new(
        vec![
            vec![ShapePart::new("blue", triangle)],
            vec![ShapePart::new("red", square.clone())],
            vec![ShapePart::new("#33AA55", square)],
        ],
        ColorTable::default(),
    )?;

    let config = SceneConfig {
        frame: FrameConfig {
            budget: Duration::from_millis(16),
            ..FrameConfig::default()
        },
        ..SceneConfig::default()
    };
    let mut scene = Scene::new(
        catalog,
        RecordingCanvas::new(),
        &mut FanTriangulator::default(),
        config,
    );

    let parents = random_parents(NODES, &mut rng);
    let start = layout(&parents, false);
    let mut ids = Vec::with_capacity(NODES);
    for (i, parent) in parents.iter().enumerate() {
        let shapes = vec![
            ShapeTransform::new(ShapeId((i % 3) as u32), Vec2::ZERO),
            ShapeTransform::new(ShapeId(((i + 1) % 3) as u32), Vec2::new(1.2, 0.0)),
        ];
        let data = NodeData::new(start[i], Size::new(100.0, 100.0))
            .with_key(i as u64)
            .with_shapes(shapes);
        let parent = parent.map(|p| ids[p]);
        ids.push(scene.insert(parent, data));
    }
    log::info!("{} nodes inserted", scene.tree().len());

    // The provider mirrors the layout in another thread, as a layout engine would.
    let tx = scene.position_sender();
    let producer = thread::spawn(move || {
        for (key, at) in layout(&parents, true).into_iter().enumerate() {
            let update = PositionUpdate {
                key: key as u64,
                position: at,
                animate: true,
            };
            if tx.send(update).is_err() {
                break;
            }
        }
    });
    producer
        .join()
        .map_err(|_| anyhow::anyhow!("position producer panicked"))?;

    let root_box = scene
        .frame_node(ids[0], Size::new(1920.0, 1080.0))
        .map(|cam| cam.visible_rect(Size::new(1920.0, 1080.0)));
    let overview = root_box.unwrap_or(Rect::new(0.0, 0.0, 1920.0, 1080.0));
    let closeup = Rect::from_center_size(start[ids.len() / 2], Size::new(1920.0, 1080.0));

    for frame in 0..FRAMES {
        let view = if frame % 30 < 15 { closeup } else { overview };
        scene.canvas_mut().clear();
        let report = scene.run_frame(view);
        log::info!(
            "frame {:>3}: folded {:>5} (complete {}), visited {:>5}, pruned {:>4}, drawn {:>5}, baked {:>3}, queued {:>5}, {:?}{}",
            report.frame,
            report.refresh.folded,
            report.refresh.complete,
            report.cull.visited,
            report.cull.pruned,
            report.cull.drawn,
            report.bakes.baked,
            report.bakes.remaining,
            report.total,
            if report.over_budget { " over budget" } else { "" },
        );
    }

    scene.close();
    Ok(())
}
