//! Geometry primitives for collision polygon math.
//!
//! Boolean clipping is delegated to `geo`; this module keeps the small
//! predicates (winding, area, centroid) local and converts between
//! `Vec2` vertex lists and `geo` ring types at the boundary.

mod boolean;

pub use boolean::{clip, intersect};

use bevy::math::Vec2;

/// Signed area of a simple polygon via the shoelace formula.
///
/// Positive for counter-clockwise vertex order, negative for clockwise.
pub fn signed_area(polygon: &[Vec2]) -> f32 {
  if polygon.len() < 3 {
    return 0.0;
  }

  let mut sum = 0.0;
  for (i, a) in polygon.iter().enumerate() {
    let b = polygon[(i + 1) % polygon.len()];
    sum += a.x * b.y - b.x * a.y;
  }
  sum * 0.5
}

/// Absolute area of a simple polygon.
pub fn area(polygon: &[Vec2]) -> f32 {
  signed_area(polygon).abs()
}

/// Returns true if the polygon's vertices are in clockwise order.
///
/// The stored collision polygons are canonically counter-clockwise;
/// a clockwise ring in a clip result signals an inner hole.
pub fn is_clockwise(polygon: &[Vec2]) -> bool {
  signed_area(polygon) < 0.0
}

/// Mean of the polygon's vertices.
///
/// This is the vertex average, not the area centroid; the splitter only
/// needs a point comfortably inside the destroy shape to pick its split
/// line, and the vertex mean is what the hole-splitting algorithm is
/// defined against.
pub fn vertex_centroid(polygon: &[Vec2]) -> Vec2 {
  if polygon.is_empty() {
    return Vec2::ZERO;
  }

  let sum: Vec2 = polygon.iter().copied().sum();
  sum / polygon.len() as f32
}
