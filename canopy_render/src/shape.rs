// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape definitions, the validated catalog, and node content layout.

use canopy_tree::{ShapeId, ShapeTransform};
use kurbo::{Point, Rect, Size, Vec2};

use crate::color::ColorTable;
use crate::error::CatalogError;

/// A simple polygon in shape space (y up), with optional holes.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Polygon {
    /// Outline, in order. The closing edge is implied.
    pub points: Vec<Point>,
    /// Hole outlines. Triangulators may ignore them.
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    /// An outline without holes.
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            holes: Vec::new(),
        }
    }

    /// Same polygon with the outline in the opposite winding.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            points,
            holes: self.holes.clone(),
        }
    }

    /// Bounding box of the outline.
    pub fn bounds(&self) -> Rect {
        let mut it = self.points.iter();
        let Some(first) = it.next() else {
            return Rect::ZERO;
        };
        it.fold(Rect::from_points(*first, *first), |r, p| {
            r.union_pt(*p)
        })
    }
}

/// One colored polygon of a shape definition.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapePart {
    /// Color name resolved through the [`ColorTable`].
    pub color: String,
    /// Geometry.
    pub polygon: Polygon,
}

impl ShapePart {
    /// A part with the given color name.
    pub fn new(color: impl Into<String>, polygon: Polygon) -> Self {
        Self {
            color: color.into(),
            polygon,
        }
    }
}

/// A reusable shape: a list of parts and their combined bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeDef {
    parts: Vec<ShapePart>,
    bounds: Rect,
}

impl ShapeDef {
    /// Parts in draw order.
    pub fn parts(&self) -> &[ShapePart] {
        &self.parts
    }

    /// Union of the part outlines, in shape space.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }
}

/// Every shape definition a scene can reference, plus the color table.
///
/// Geometry is validated once, on construction.
#[derive(Clone, Debug)]
pub struct ShapeCatalog {
    shapes: Vec<ShapeDef>,
    colors: ColorTable,
}

impl ShapeCatalog {
    /// Validate and index shape definitions. [`ShapeId`]`(i)` refers to `defs[i]`.
    pub fn new(defs: Vec<Vec<ShapePart>>, colors: ColorTable) -> Result<Self, CatalogError> {
        let mut shapes = Vec::with_capacity(defs.len());
        for (shape, parts) in defs.into_iter().enumerate() {
            if parts.is_empty() {
                return Err(CatalogError::EmptyShape { shape });
            }
            let mut bounds: Option<Rect> = None;
            for (part, p) in parts.iter().enumerate() {
                let rings = core::iter::once(&p.polygon.points).chain(&p.polygon.holes);
                for ring in rings {
                    if ring.len() < 3 {
                        return Err(CatalogError::TooFewPoints {
                            shape,
                            part,
                            count: ring.len(),
                        });
                    }
                    if ring.iter().any(|pt| !pt.is_finite()) {
                        return Err(CatalogError::NonFinite { shape, part });
                    }
                }
                let b = p.polygon.bounds();
                bounds = Some(bounds.map_or(b, |acc| acc.union(b)));
            }
            let bounds = bounds.unwrap_or(Rect::ZERO);
            if bounds.width() <= 0.0 && bounds.height() <= 0.0 {
                return Err(CatalogError::Degenerate { shape });
            }
            shapes.push(ShapeDef { parts, bounds });
        }
        Ok(Self { shapes, colors })
    }

    /// Definition for an id.
    pub fn get(&self, id: ShapeId) -> Option<&ShapeDef> {
        self.shapes.get(id.index())
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// True if the catalog has no definitions.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Ids of every definition, in order.
    pub fn ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ShapeId uses 32-bit indices by design."
        )]
        (0..self.shapes.len()).map(|i| ShapeId(i as u32))
    }

    /// The color table used to resolve part colors.
    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// Bounds of a node's placed shapes in shape space, or `None` if it has no known shape.
    pub fn content_bounds(&self, placements: &[ShapeTransform]) -> Option<Rect> {
        placements
            .iter()
            .filter_map(|t| Some(self.get(t.shape)?.bounds + t.offset))
            .reduce(|a, b| a.union(b))
    }
}

/// Maps shape-space content into a node box: uniform scale, centered, y flipped.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeLayout {
    /// Shape units to world units.
    pub scale: f64,
    origin: Vec2,
}

impl NodeLayout {
    /// Fit `content` into a box of `size`, leaving at least `border` units on the longer
    /// axis. `None` if the content has no extent or the box is too small.
    pub fn fit(content: Rect, size: Size, border: f64) -> Option<Self> {
        let (dx, dy) = (content.width(), content.height());
        let scale = if dx > dy {
            (size.width - border) / dx
        } else {
            (size.height - border) / dy
        };
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }
        let origin = Vec2::new(
            (size.width - scale * dx) / 2.0 - scale * content.x0,
            (size.height + scale * dy) / 2.0 + scale * content.y0,
        );
        Some(Self { scale, origin })
    }

    /// Map a shape-space point to world space, for a node whose top-left corner is `at`.
    pub fn map(&self, at: Point, p: Point) -> Point {
        Point::new(
            at.x + self.origin.x + self.scale * p.x,
            at.y + self.origin.y - self.scale * p.y,
        )
    }

    /// Map a shape-space rectangle; the result is normalized.
    pub fn map_rect(&self, at: Point, r: Rect) -> Rect {
        Rect::from_points(self.map(at, r.origin()), self.map(at, Point::new(r.x1, r.y1)))
    }
}
