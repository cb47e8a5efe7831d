// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_tree::{NodeData, NodeId, PollLimit, Tree, Unbounded};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Size};

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
    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

/// A random tree: each node hangs under an earlier one, one row below it.
fn gen_tree(count: usize, seed: u64) -> (Tree, Vec<NodeId>) {
    let mut rng = Rng::new(seed);
    let mut tree = Tree::new();
    let mut ids: Vec<NodeId> = Vec::with_capacity(count);
    let mut depth: Vec<f64> = Vec::with_capacity(count);
    for i in 0..count {
        let (parent, row) = if i == 0 {
            (None, 0.0)
        } else {
            let p = rng.below(i);
            (Some(ids[p]), depth[p] + 1.0)
        };
        let at = Point::new(rng.next_f64() * 100_000.0, row * 150.0);
        ids.push(tree.insert(parent, NodeData::new(at, Size::new(100.0, 100.0))));
        depth.push(row);
    }
    (tree, ids)
}

fn bench_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh");
    for &n in &[1_000usize, 10_000, 50_000] {
        let (tree, ids) = gen_tree(n, 0xCAFE_F00D_DEAD_BEEF);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("full_n{}", n), |b| {
            b.iter_batched(
                || tree.clone(),
                |mut t| black_box(t.refresh(&Unbounded)),
                BatchSize::LargeInput,
            )
        });

        let mut clean = tree.clone();
        let _ = clean.refresh(&Unbounded);
        let mut rng = Rng::new(0xBADC_F00D_1234_5678);
        let movers: Vec<NodeId> = (0..100).map(|_| ids[rng.below(ids.len())]).collect();
        group.bench_function(format!("move_100_n{}", n), |b| {
            b.iter_batched(
                || clean.clone(),
                |mut t| {
                    for (k, &id) in movers.iter().enumerate() {
                        let p = t.get(id).map(|d| d.position).unwrap_or_default();
                        t.set_position(id, Point::new(p.x + k as f64, p.y));
                    }
                    black_box(t.refresh(&Unbounded))
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("sliced_64_polls_n{}", n), |b| {
            b.iter_batched(
                || tree.clone(),
                |mut t| {
                    let mut passes = 0;
                    while !t.refresh(&PollLimit::new(64)).complete {
                        passes += 1;
                    }
                    black_box(passes)
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_refresh);
criterion_main!(benches);
