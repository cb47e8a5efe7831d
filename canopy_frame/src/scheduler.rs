// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-budget scheduler: ordered stages sharing one deadline per frame.

use core::time::Duration;

use canopy_render::{BakeStats, Canvas};
use canopy_tree::{CullStats, Deadline, RefreshStats};
// WASM compat: std::time::Instant panics on wasm32
use web_time::Instant;

use crate::context::FrameContext;
use crate::stages::{Animate, ApplyPositions, DrawScene, RefreshBounds};

/// One unit of per-frame work.
///
/// Stages run in registration order and all see the same [`Deadline`]. A stage that
/// runs out of time does less work; it never fails the frame.
pub trait Stage<C> {
    /// Name used in [`FrameReport`] timings and logs.
    fn name(&self) -> &'static str;

    /// Called once before the first frame.
    fn initialize(&mut self, ctx: &mut FrameContext<C>) {
        let _ = ctx;
    }

    /// Per-frame work.
    fn update(&mut self, ctx: &mut FrameContext<C>, deadline: &Deadline);

    /// Called once when the scene shuts down.
    fn close(&mut self, ctx: &mut FrameContext<C>) {
        let _ = ctx;
    }
}

/// Frame budget settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameConfig {
    /// Wall-clock time a frame may spend in stages and bakes.
    pub budget: Duration,
    /// Most node tiles baked after the stages of one frame.
    pub bake_cap: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            budget: Duration::from_millis(96),
            bake_cap: 100,
        }
    }
}

/// Wall-clock time one stage took.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StageTiming {
    /// [`Stage::name`].
    pub name: &'static str,
    /// Time spent in [`Stage::update`].
    pub elapsed: Duration,
}

/// What happened during one [`FrameScheduler::run_frame`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame counter, starting at 1.
    pub frame: u64,
    /// One entry per stage, in run order.
    pub stages: Vec<StageTiming>,
    /// Time spent draining the bake queue.
    pub bake_time: Duration,
    /// Bake queue outcome.
    pub bakes: BakeStats,
    /// Bounds refresh outcome.
    pub refresh: RefreshStats,
    /// Draw walk outcome.
    pub cull: CullStats,
    /// Whole frame.
    pub total: Duration,
    /// True if the deadline had passed when the frame ended.
    pub over_budget: bool,
}

impl FrameReport {
    /// Timing of a stage by name.
    pub fn stage(&self, name: &str) -> Option<Duration> {
        self.stages
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.elapsed)
    }
}

/// Runs registered stages once per frame against a shared deadline, then drains the
/// tile bake queue while time remains.
pub struct FrameScheduler<C> {
    config: FrameConfig,
    stages: Vec<Box<dyn Stage<C>>>,
    frames: u64,
}

impl<C> core::fmt::Debug for FrameScheduler<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let names: Vec<_> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("FrameScheduler")
            .field("config", &self.config)
            .field("stages", &names)
            .field("frames", &self.frames)
            .finish()
    }
}

impl<C: Canvas + 'static> FrameScheduler<C> {
    /// A scheduler with no stages.
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            stages: Vec::new(),
            frames: 0,
        }
    }

    /// The built-in pipeline: apply queued positions, animate, refresh bounds, draw.
    pub fn with_default_stages(config: FrameConfig) -> Self {
        let mut scheduler = Self::new(config);
        scheduler.push(ApplyPositions);
        scheduler.push(Animate);
        scheduler.push(RefreshBounds);
        scheduler.push(DrawScene::default());
        scheduler
    }

    /// Append a stage.
    pub fn push(&mut self, stage: impl Stage<C> + 'static) {
        self.stages.push(Box::new(stage));
    }

    /// Names of the registered stages, in run order.
    pub fn stage_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|s| s.name())
    }

    /// Settings in use.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Frames run so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Initialize every stage, in order.
    pub fn initialize(&mut self, ctx: &mut FrameContext<C>) {
        for stage in &mut self.stages {
            stage.initialize(ctx);
        }
    }

    /// Close every stage, in order.
    pub fn close(&mut self, ctx: &mut FrameContext<C>) {
        for stage in &mut self.stages {
            stage.close(ctx);
        }
    }

    /// Run one frame.
    pub fn run_frame(&mut self, ctx: &mut FrameContext<C>) -> FrameReport {
        let start = Instant::now();
        let deadline = Deadline::at(start + self.config.budget);
        self.frames += 1;

        let mut stages = Vec::with_capacity(self.stages.len());
        for stage in &mut self.stages {
            let t0 = Instant::now();
            stage.update(ctx, &deadline);
            let elapsed = t0.elapsed();
            log::trace!("frame {}: {} took {elapsed:?}", self.frames, stage.name());
            stages.push(StageTiming {
                name: stage.name(),
                elapsed,
            });
        }

        let t0 = Instant::now();
        let bakes = ctx.tiles.bake_pending(
            self.config.bake_cap,
            &deadline,
            &ctx.tree,
            &ctx.catalog,
            &mut ctx.canvas,
        );
        let bake_time = t0.elapsed();
        log::trace!(
            "frame {}: baked {} tiles in {bake_time:?}",
            self.frames,
            bakes.baked
        );

        FrameReport {
            frame: self.frames,
            stages,
            bake_time,
            bakes,
            refresh: ctx.last_refresh,
            cull: ctx.last_cull,
            total: start.elapsed(),
            over_budget: deadline.is_past(),
        }
    }
}
