//! Hole-case polygon splitting.
//!
//! When a destroy shape lies strictly inside a collision polygon, the
//! boolean clip yields an outer boundary plus an inner ring that a
//! simple polygon cannot represent. The splitter resolves that case by
//! cutting the world in two along a vertical line through the destroy
//! shape and rebuilding each side as a hole-free "C-channel".

use bevy::math::{UVec2, Vec2};

use crate::geom;

/// Splits `polygon` around `destroy` into at most two simple polygons
/// covering `area(polygon) − area(destroy)` with no inner holes.
///
/// The split line is the vertical through the destroy shape's vertex
/// centroid. Each full-height half-rectangle of the world is clipped by
/// the destroy shape, then intersected with the original polygon.
/// Outputs with fewer than 3 vertices are dropped; order is
/// left-then-right.
///
/// A centroid at or beyond the world's horizontal bounds is fine: one
/// half then returns the whole carved polygon and the other nothing.
pub fn split(polygon: &[Vec2], destroy: &[Vec2], world_size: UVec2) -> Vec<Vec<Vec2>> {
  let midpoint = geom::vertex_centroid(destroy).x;
  let width = world_size.x as f32;
  let height = world_size.y as f32;

  let left_half = vec![
    Vec2::new(0.0, 0.0),
    Vec2::new(midpoint, 0.0),
    Vec2::new(midpoint, height),
    Vec2::new(0.0, height),
  ];
  let right_half = vec![
    Vec2::new(midpoint, 0.0),
    Vec2::new(width, 0.0),
    Vec2::new(width, height),
    Vec2::new(midpoint, height),
  ];

  let mut out = Vec::new();
  for half in [left_half, right_half] {
    // Carve the destroy shape out of the half-rectangle first; the
    // first clip result is the half minus the shape.
    let Some(carved_half) = geom::clip(&half, destroy).into_iter().next() else {
      continue;
    };

    for piece in geom::intersect(&carved_half, polygon) {
      if piece.len() >= 3 {
        out.push(piece);
      }
    }
  }

  out
}
