// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A headless canvas that records draw commands.

use kurbo::{Point, Rect};

use crate::canvas::{Canvas, TextureId, Triangle};
use crate::color::Rgba8;

/// One recorded canvas call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// [`Canvas::draw_triangle`].
    Triangle {
        /// Target texture, `None` for the screen.
        target: Option<TextureId>,
        /// Geometry.
        triangle: Triangle,
        /// Fill.
        color: Rgba8,
    },
    /// [`Canvas::draw_line`].
    Line {
        /// Target texture, `None` for the screen.
        target: Option<TextureId>,
        /// Start.
        from: Point,
        /// End.
        to: Point,
        /// Color.
        color: Rgba8,
    },
    /// [`Canvas::blit`].
    Blit {
        /// Target texture, `None` for the screen.
        target: Option<TextureId>,
        /// Source texture.
        texture: TextureId,
        /// Source rectangle in texture pixels.
        src: Rect,
        /// Destination rectangle.
        dst: Rect,
    },
    /// [`Canvas::begin_offscreen`].
    BeginOffscreen {
        /// Texture drawn into.
        texture: TextureId,
        /// Region cleared.
        region: Rect,
    },
    /// [`Canvas::end_offscreen`].
    EndOffscreen,
}

/// Records every call; useful for tests, headless runs, and replaying a frame elsewhere.
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
    textures: Vec<(TextureId, u32, u32)>,
    next_texture: u32,
    target: Option<TextureId>,
}

impl RecordingCanvas {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop recorded commands, keeping textures.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Live textures with their sizes.
    pub fn textures(&self) -> &[(TextureId, u32, u32)] {
        &self.textures
    }

    /// Commands drawn on the screen (outside any offscreen pass).
    pub fn on_screen(&self) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.commands.iter().filter(|c| match c {
            DrawCommand::Triangle { target, .. }
            | DrawCommand::Line { target, .. }
            | DrawCommand::Blit { target, .. } => target.is_none(),
            DrawCommand::BeginOffscreen { .. } | DrawCommand::EndOffscreen => false,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn draw_triangle(&mut self, triangle: Triangle, color: Rgba8) {
        self.commands.push(DrawCommand::Triangle {
            target: self.target,
            triangle,
            color,
        });
    }

    fn draw_line(&mut self, from: Point, to: Point, _width: f64, color: Rgba8) {
        self.commands.push(DrawCommand::Line {
            target: self.target,
            from,
            to,
            color,
        });
    }

    fn create_texture(&mut self, width: u32, height: u32) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.push((id, width, height));
        id
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.textures.retain(|(id, ..)| *id != texture);
    }

    fn begin_offscreen(&mut self, texture: TextureId, region: Rect) {
        debug_assert!(self.target.is_none(), "offscreen passes do not nest");
        self.target = Some(texture);
        self.commands
            .push(DrawCommand::BeginOffscreen { texture, region });
    }

    fn end_offscreen(&mut self) {
        self.target = None;
        self.commands.push(DrawCommand::EndOffscreen);
    }

    fn blit(&mut self, texture: TextureId, src: Rect, dst: Rect) {
        self.commands.push(DrawCommand::Blit {
            target: self.target,
            texture,
            src,
            dst,
        });
    }
}
