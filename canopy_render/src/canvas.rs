// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Seams to the drawing backend and the triangulation provider.

use kurbo::{Point, Rect};

use crate::color::Rgba8;
use crate::error::TriangulateError;
use crate::shape::Polygon;

/// Handle of a texture owned by a [`Canvas`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// A filled triangle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle {
    /// First corner.
    pub a: Point,
    /// Second corner.
    pub b: Point,
    /// Third corner.
    pub c: Point,
}

impl Triangle {
    /// Triangle from three corners.
    pub const fn new(a: Point, b: Point, c: Point) -> Self {
        Self { a, b, c }
    }

    /// Twice the signed area; positive when counter-clockwise in a y-up frame.
    pub fn signed_area2(&self) -> f64 {
        (self.b - self.a).cross(self.c - self.a)
    }

    /// Apply a point mapping to every corner.
    pub fn map(&self, f: impl Fn(Point) -> Point) -> Self {
        Self::new(f(self.a), f(self.b), f(self.c))
    }
}

/// The 2D drawing backend.
///
/// Coordinates are world units while drawing to the screen and texture pixels between
/// [`Canvas::begin_offscreen`] and [`Canvas::end_offscreen`].
pub trait Canvas {
    /// Fill a triangle.
    fn draw_triangle(&mut self, triangle: Triangle, color: Rgba8);

    /// Stroke a straight line.
    fn draw_line(&mut self, from: Point, to: Point, width: f64, color: Rgba8);

    /// Allocate a transparent texture.
    fn create_texture(&mut self, width: u32, height: u32) -> TextureId;

    /// Free a texture. Unknown handles are ignored.
    fn release_texture(&mut self, texture: TextureId);

    /// Redirect drawing into `region` of `texture`, clearing it to transparent.
    fn begin_offscreen(&mut self, texture: TextureId, region: Rect);

    /// Return to drawing on the screen.
    fn end_offscreen(&mut self);

    /// Copy `src` (texture pixels) of `texture` into `dst`.
    fn blit(&mut self, texture: TextureId, src: Rect, dst: Rect);

    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        let (a, b) = (Point::new(rect.x0, rect.y0), Point::new(rect.x1, rect.y0));
        let (c, d) = (Point::new(rect.x1, rect.y1), Point::new(rect.x0, rect.y1));
        self.draw_triangle(Triangle::new(a, b, c), color);
        self.draw_triangle(Triangle::new(a, c, d), color);
    }

    /// Outline an axis-aligned rectangle.
    fn stroke_rect(&mut self, rect: Rect, width: f64, color: Rgba8) {
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ];
        for i in 0..4 {
            self.draw_line(corners[i], corners[(i + 1) % 4], width, color);
        }
    }

    /// Stroke a closed polyline.
    fn stroke_closed(&mut self, points: &[Point], width: f64, color: Rgba8) {
        for (i, p) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            self.draw_line(*p, next, width, color);
        }
    }
}

/// Splits polygons into triangles.
pub trait Triangulator {
    /// Triangulate one polygon.
    fn triangulate(&mut self, polygon: &Polygon) -> Result<Vec<Triangle>, TriangulateError>;
}

/// Fan triangulation from the first vertex.
///
/// Correct for convex outlines only; holes are ignored. Rejects outlines whose fan has no
/// positive area in the outline's own winding, which is enough to exercise the
/// reversed-winding retry of the tile cache.
#[derive(Copy, Clone, Debug, Default)]
pub struct FanTriangulator {
    /// Accept only counter-clockwise outlines (y up).
    pub ccw_only: bool,
}

impl Triangulator for FanTriangulator {
    fn triangulate(&mut self, polygon: &Polygon) -> Result<Vec<Triangle>, TriangulateError> {
        let pts = &polygon.points;
        if pts.len() < 3 {
            return Err(TriangulateError::Empty);
        }
        let tris: Vec<Triangle> = (1..pts.len() - 1)
            .map(|i| Triangle::new(pts[0], pts[i], pts[i + 1]))
            .filter(|t| t.signed_area2() != 0.0)
            .collect();
        if tris.is_empty() {
            return Err(TriangulateError::Empty);
        }
        if self.ccw_only && tris.iter().any(|t| t.signed_area2() < 0.0) {
            return Err(TriangulateError::Backend("clockwise outline".into()));
        }
        Ok(tris)
    }
}
