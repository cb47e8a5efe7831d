// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Camera framing: fit a world rectangle on screen.

use kurbo::{Point, Rect, Size, Vec2};

/// Smallest zoom factor.
pub const MIN_ZOOM: f64 = 0.0125;
/// Largest zoom factor.
pub const MAX_ZOOM: f64 = 1024.0;
/// Screen pixels kept free around a framed rectangle.
pub const FRAME_MARGIN: f64 = 20.0;

/// A 2D camera: the world point at the screen center and a zoom factor
/// (screen pixels per world unit).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// World point shown at the screen center.
    pub target: Point,
    /// Screen pixels per world unit.
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: Point::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Center `rect` on a `screen`-sized view, zoomed to fit with `margin` pixels to
    /// spare on every side.
    ///
    /// `None` if the screen has no room left inside the margin or `rect` is not finite.
    pub fn frame_rect(rect: Rect, screen: Size, margin: f64) -> Option<Self> {
        let (w, h) = (screen.width - 2.0 * margin, screen.height - 2.0 * margin);
        if w <= 0.0 || h <= 0.0 || !rect.is_finite() {
            return None;
        }
        let rect = rect.abs();
        let zoom = (w / rect.width()).min(h / rect.height());
        Some(Self {
            target: rect.center(),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        })
    }

    /// Multiply the zoom by `factor`, keeping the clamp.
    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// World rectangle visible on a `screen`-sized view.
    pub fn visible_rect(&self, screen: Size) -> Rect {
        Rect::from_center_size(self.target, screen / self.zoom)
    }

    /// World point under a screen position.
    pub fn screen_to_world(&self, screen: Size, at: Point) -> Point {
        let from_center = at - Point::new(screen.width / 2.0, screen.height / 2.0);
        self.target + from_center / self.zoom
    }

    /// Screen position of a world point.
    pub fn world_to_screen(&self, screen: Size, at: Point) -> Point {
        let center = Vec2::new(screen.width / 2.0, screen.height / 2.0);
        ((at - self.target) * self.zoom + center).to_point()
    }
}
