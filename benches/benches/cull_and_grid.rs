// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_grid::SpatialGrid;
use canopy_tree::{Culler, CullVisitor, EdgeSegment, NodeData, NodeId, Tree, Unbounded};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Size};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// A complete tree with `fanout` children per node, laid out in rows.
fn gen_layered(levels: u32, fanout: usize) -> Tree {
    let mut tree = Tree::new();
    let mut row = vec![tree.insert(None, NodeData::new(Point::ZERO, Size::new(100.0, 100.0)))];
    for level in 1..levels {
        let mut next = Vec::with_capacity(row.len() * fanout);
        for (i, &parent) in row.iter().enumerate() {
            for k in 0..fanout {
                let x = ((i * fanout + k) as f64) * 150.0;
                let at = Point::new(x, f64::from(level) * 200.0);
                next.push(tree.insert(Some(parent), NodeData::new(at, Size::new(100.0, 100.0))));
            }
        }
        row = next;
    }
    let _ = tree.refresh(&Unbounded);
    tree
}

#[derive(Default)]
struct Count {
    nodes: usize,
    edges: usize,
}

impl CullVisitor for Count {
    fn draw_node(&mut self, _: NodeId, _: &NodeData, _: bool) {
        self.nodes += 1;
    }
    fn draw_edge(&mut self, _: EdgeSegment) {
        self.edges += 1;
    }
}

fn bench_cull(c: &mut Criterion) {
    let mut group = c.benchmark_group("cull");
    for &(levels, fanout) in &[(5u32, 8usize), (7, 5)] {
        let tree = gen_layered(levels, fanout);
        group.throughput(Throughput::Elements(tree.len() as u64));
        let mut culler = Culler::new();
        for (name, view) in [
            ("corner", Rect::new(0.0, 0.0, 1920.0, 1080.0)),
            ("everything", Rect::new(-1.0e9, -1.0e9, 1.0e9, 1.0e9)),
        ] {
            group.bench_function(format!("{name}_n{}", tree.len()), |b| {
                b.iter(|| {
                    let mut count = Count::default();
                    let stats = culler.cull(&tree, view, &mut count, &Unbounded);
                    black_box((stats, count.nodes, count.edges))
                })
            });
        }
    }
    group.finish();
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let points: Vec<(f64, f64)> = (0..50_000)
        .map(|_| (rng.next_f64() * 50_000.0, rng.next_f64() * 50_000.0))
        .collect();
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("insert_50k", |b| {
        b.iter_batched(
            || SpatialGrid::<u32>::new(256.0),
            |mut grid| {
                for (i, &(x, y)) in points.iter().enumerate() {
                    grid.insert(i as u32, x, y);
                }
                black_box(grid.len())
            },
            BatchSize::LargeInput,
        )
    });

    let mut grid = SpatialGrid::<u32>::new(256.0);
    for (i, &(x, y)) in points.iter().enumerate() {
        grid.insert(i as u32, x, y);
    }
    group.bench_function("query_50k", |b| {
        b.iter(|| {
            let mut hits = 0;
            for &(x, y) in &points {
                hits += grid.query(x, y).count();
            }
            black_box(hits)
        })
    });
    group.bench_function("relocate_50k", |b| {
        b.iter_batched(
            || grid.clone(),
            |mut g| {
                for (i, &(x, y)) in points.iter().enumerate() {
                    g.relocate(i as u32, x + 300.0, y);
                }
                black_box(g.cell_count())
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_cull, bench_grid);
criterion_main!(benches);
