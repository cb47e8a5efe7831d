// Copyright 2026 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use canopy_tree::ShapeId;
use thiserror::Error;

/// A color string that is neither a known name nor a valid hex literal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown color {0:?}: expected a named color, #RRGGBB or #RRGGBBAA")]
pub struct ColorError(pub String);

/// Failure reported by a [`Triangulator`](crate::Triangulator).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TriangulateError {
    /// The polygon produced no triangles (collinear or self-overlapping outline).
    #[error("polygon produced no triangles")]
    Empty,
    /// The backend rejected the polygon.
    #[error("triangulation failed: {0}")]
    Backend(String),
}

/// Structural problems found while building a [`ShapeCatalog`](crate::ShapeCatalog).
///
/// These stop loading: a catalog with broken geometry is never constructed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A shape definition has no parts.
    #[error("shape {shape} has no parts")]
    EmptyShape {
        /// Index of the shape definition.
        shape: usize,
    },
    /// An outline or hole has fewer than three points.
    #[error("shape {shape}, part {part}: polygon has {count} points, needs at least 3")]
    TooFewPoints {
        /// Index of the shape definition.
        shape: usize,
        /// Index of the part inside the shape.
        part: usize,
        /// Number of points found.
        count: usize,
    },
    /// A coordinate is NaN or infinite.
    #[error("shape {shape}, part {part}: non-finite coordinate")]
    NonFinite {
        /// Index of the shape definition.
        shape: usize,
        /// Index of the part inside the shape.
        part: usize,
    },
    /// Every point of the shape coincides, so it has no extent to scale.
    #[error("shape {shape} has zero extent")]
    Degenerate {
        /// Index of the shape definition.
        shape: usize,
    },
}

/// Why a shape tile could not be baked.
///
/// Bake failures are recorded on the tile and never retried.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BakeError {
    /// The id is not in the catalog.
    #[error("shape {0:?} is not in the catalog")]
    UnknownShape(ShapeId),
    /// A part uses a color the color table cannot resolve.
    #[error("shape {shape:?}: {source}")]
    Color {
        /// Shape being baked.
        shape: ShapeId,
        /// Underlying color error.
        #[source]
        source: ColorError,
    },
    /// A part could not be triangulated in either winding.
    #[error("shape {shape:?}, part {part}: {source}")]
    Triangulate {
        /// Shape being baked.
        shape: ShapeId,
        /// Index of the part.
        part: usize,
        /// Underlying triangulation error.
        #[source]
        source: TriangulateError,
    },
    /// The tile does not fit on an atlas page.
    #[error("shape {shape:?}: {width}x{height} tile exceeds the atlas page")]
    TooLarge {
        /// Shape being baked.
        shape: ShapeId,
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// An earlier bake of this shape failed.
    #[error("shape {0:?} failed to bake earlier")]
    Failed(ShapeId),
}
