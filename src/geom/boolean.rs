//! Boolean polygon clipping backed by `geo`.
//!
//! Results are flattened to a flat list of simple rings: each result
//! polygon's exterior is emitted counter-clockwise, and each interior
//! (hole) ring is emitted as its own clockwise polygon immediately after
//! its exterior. The collision rebuilder relies on this convention to
//! detect the "destroy shape fully inside a polygon" case.

use bevy::math::Vec2;
use geo::{BooleanOps, LineString, MultiPolygon, Polygon as GeoPolygon};

use super::is_clockwise;

/// Boolean subtraction: `subject − clip`.
///
/// Returns zero or more simple polygons. When the clip shape is strictly
/// interior to the subject, the output is the outer boundary followed by
/// the hole ring in clockwise order.
pub fn clip(subject: &[Vec2], clip: &[Vec2]) -> Vec<Vec<Vec2>> {
  if subject.len() < 3 {
    return Vec::new();
  }
  if clip.len() < 3 {
    return vec![subject.to_vec()];
  }

  let result = to_geo(subject).difference(&to_geo(clip));
  flatten(result)
}

/// Boolean intersection: `subject ∩ clip`.
pub fn intersect(subject: &[Vec2], clip: &[Vec2]) -> Vec<Vec<Vec2>> {
  if subject.len() < 3 || clip.len() < 3 {
    return Vec::new();
  }

  let result = to_geo(subject).intersection(&to_geo(clip));
  flatten(result)
}

fn to_geo(polygon: &[Vec2]) -> GeoPolygon<f64> {
  let coords: Vec<(f64, f64)> = polygon.iter().map(|v| (v.x as f64, v.y as f64)).collect();
  GeoPolygon::new(LineString::from(coords), vec![])
}

/// Converts a `geo` ring back to a vertex list, dropping the closing
/// duplicate vertex that `geo` rings carry.
fn ring_to_points(ring: &LineString<f64>) -> Vec<Vec2> {
  let mut points: Vec<Vec2> = ring
    .coords()
    .map(|c| Vec2::new(c.x as f32, c.y as f32))
    .collect();

  if points.len() >= 2 {
    let first = points[0];
    let last = *points.last().unwrap();
    if (first - last).length_squared() < 1e-12 {
      points.pop();
    }
  }

  points
}

/// Flattens a multipolygon into simple rings with normalized winding:
/// exteriors counter-clockwise, holes clockwise.
fn flatten(result: MultiPolygon<f64>) -> Vec<Vec<Vec2>> {
  let mut rings = Vec::new();

  for polygon in result {
    let mut exterior = ring_to_points(polygon.exterior());
    if exterior.len() >= 3 {
      if is_clockwise(&exterior) {
        exterior.reverse();
      }
      rings.push(exterior);
    }

    for interior in polygon.interiors() {
      let mut hole = ring_to_points(interior);
      if hole.len() >= 3 {
        if !is_clockwise(&hole) {
          hole.reverse();
        }
        rings.push(hole);
      }
    }
  }

  rings
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geom::area;

  fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Vec2> {
    vec![
      Vec2::new(x0, y0),
      Vec2::new(x1, y0),
      Vec2::new(x1, y1),
      Vec2::new(x0, y1),
    ]
  }

  #[test]
  fn disjoint_clip_returns_subject() {
    let subject = rect(0.0, 0.0, 100.0, 100.0);
    let far = rect(200.0, 200.0, 220.0, 220.0);

    let result = clip(&subject, &far);
    assert_eq!(result.len(), 1);
    assert!((area(&result[0]) - 10000.0).abs() < 1e-3);
  }

  #[test]
  fn full_overlap_consumes_subject() {
    let subject = rect(10.0, 10.0, 20.0, 20.0);
    let bigger = rect(0.0, 0.0, 100.0, 100.0);

    let result = clip(&subject, &bigger);
    assert!(result.is_empty());
  }

  #[test]
  fn corner_clip_yields_one_smaller_polygon() {
    let subject = rect(0.0, 0.0, 100.0, 100.0);
    let corner = rect(-10.0, -10.0, 50.0, 50.0);

    let result = clip(&subject, &corner);
    assert_eq!(result.len(), 1);
    let remaining = area(&result[0]);
    assert!((remaining - (10000.0 - 2500.0)).abs() < 1e-2);
  }

  #[test]
  fn interior_clip_surfaces_hole_as_clockwise_ring() {
    let subject = rect(0.0, 0.0, 100.0, 100.0);
    let inner = rect(40.0, 40.0, 60.0, 60.0);

    let result = clip(&subject, &inner);
    assert_eq!(result.len(), 2);
    assert!(!is_clockwise(&result[0]), "exterior must be counter-clockwise");
    assert!(is_clockwise(&result[1]), "hole ring must be clockwise");
    assert!((area(&result[1]) - 400.0).abs() < 1e-2);
  }

  #[test]
  fn clip_never_grows_area() {
    let subject = rect(0.0, 0.0, 100.0, 100.0);
    let bite = rect(80.0, 80.0, 120.0, 120.0);

    let result = clip(&subject, &bite);
    let total: f32 = result.iter().map(|p| area(p)).sum();
    assert!(total <= area(&subject) + 1e-3);
  }

  #[test]
  fn intersect_of_overlapping_rects() {
    let a = rect(0.0, 0.0, 50.0, 50.0);
    let b = rect(25.0, 25.0, 100.0, 100.0);

    let result = intersect(&a, &b);
    assert_eq!(result.len(), 1);
    assert!((area(&result[0]) - 625.0).abs() < 1e-2);
  }

  #[test]
  fn intersect_disjoint_is_empty() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(20.0, 20.0, 30.0, 30.0);
    assert!(intersect(&a, &b).is_empty());
  }
}
