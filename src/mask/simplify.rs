//! Douglas-Peucker simplification for closed contours.
//!
//! Marching squares emits one vertex per boundary cell; simplification
//! collapses the staircase into the handful of corners the collision
//! layer actually needs.

use bevy::math::Vec2;

/// Simplifies a closed polyline within `tolerance` pixels.
///
/// The contour is split at its two furthest-apart vertices so the
/// arbitrary start vertex never pins an artifact, then each open half is
/// simplified independently and the halves are stitched back together.
pub fn simplify_closed(contour: &[Vec2], tolerance: f32) -> Vec<Vec2> {
  if contour.len() <= 3 {
    return contour.to_vec();
  }

  let (i1, i2) = furthest_pair(contour);
  let (start, end) = if i1 < i2 { (i1, i2) } else { (i2, i1) };

  let half1: Vec<Vec2> = contour[start..=end].to_vec();
  let mut half2: Vec<Vec2> = contour[end..].to_vec();
  half2.extend_from_slice(&contour[..=start]);

  let mut simplified = simplify_open(&half1, tolerance);
  let mut tail = simplify_open(&half2, tolerance);

  // Each half ends where the other begins; drop both junction
  // duplicates before stitching.
  simplified.pop();
  tail.pop();
  simplified.extend(tail);

  simplified
}

/// Simplifies every contour, discarding any that degenerate below a
/// triangle.
pub fn simplify_contours(contours: Vec<Vec<Vec2>>, tolerance: f32) -> Vec<Vec<Vec2>> {
  contours
    .into_iter()
    .map(|c| simplify_closed(&c, tolerance))
    .filter(|c| c.len() >= 3)
    .collect()
}

fn furthest_pair(contour: &[Vec2]) -> (usize, usize) {
  let mut best = (0, contour.len() / 2);
  let mut best_dist = 0.0f32;

  for i in 0..contour.len() {
    for j in (i + 1)..contour.len() {
      let d = (contour[i] - contour[j]).length_squared();
      if d > best_dist {
        best_dist = d;
        best = (i, j);
      }
    }
  }

  best
}

fn simplify_open(polyline: &[Vec2], tolerance: f32) -> Vec<Vec2> {
  if polyline.len() <= 2 {
    return polyline.to_vec();
  }

  let first = polyline[0];
  let last = *polyline.last().unwrap();

  let mut max_dist = 0.0f32;
  let mut max_idx = 0;
  for (i, &point) in polyline.iter().enumerate().skip(1).take(polyline.len() - 2) {
    let d = perpendicular_distance_squared(point, first, last);
    if d > max_dist {
      max_dist = d;
      max_idx = i;
    }
  }

  if max_dist > tolerance * tolerance {
    let mut left = simplify_open(&polyline[..=max_idx], tolerance);
    let right = simplify_open(&polyline[max_idx..], tolerance);
    left.pop();
    left.extend(right);
    left
  } else {
    vec![first, last]
  }
}

fn perpendicular_distance_squared(point: Vec2, a: Vec2, b: Vec2) -> f32 {
  let ab = b - a;
  let len_sq = ab.length_squared();
  if len_sq < 1e-10 {
    return (point - a).length_squared();
  }

  let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
  (point - (a + t * ab)).length_squared()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn triangle_survives_unchanged() {
    let triangle = vec![Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(5.0, 10.0)];
    assert_eq!(simplify_closed(&triangle, 1.0).len(), 3);
  }

  #[test]
  fn staircase_collapses_to_square() {
    // Dense square outline with a vertex every unit along each edge.
    let mut outline = Vec::new();
    for i in 0..10 {
      outline.push(Vec2::new(i as f32, 0.0));
    }
    for i in 0..10 {
      outline.push(Vec2::new(10.0, i as f32));
    }
    for i in 0..10 {
      outline.push(Vec2::new(10.0 - i as f32, 10.0));
    }
    for i in 0..10 {
      outline.push(Vec2::new(0.0, 10.0 - i as f32));
    }

    let simplified = simplify_closed(&outline, 0.5);
    assert!(
      simplified.len() <= 6,
      "square outline should collapse to near-corner count, got {}",
      simplified.len()
    );
  }

  #[test]
  fn sharp_spike_is_preserved() {
    let shape = vec![
      Vec2::new(0.0, 0.0),
      Vec2::new(5.0, 0.0),
      Vec2::new(5.0, 5.0),
      Vec2::new(2.5, 10.0),
      Vec2::new(0.0, 5.0),
    ];
    let simplified = simplify_closed(&shape, 1.0);
    assert!(simplified.len() >= 4);
  }

  #[test]
  fn degenerate_contours_are_dropped() {
    // A near-collinear sliver simplifies below a triangle and is
    // filtered out.
    let sliver = vec![
      Vec2::new(0.0, 0.0),
      Vec2::new(5.0, 0.01),
      Vec2::new(10.0, 0.0),
      Vec2::new(5.0, -0.01),
    ];
    let kept = simplify_contours(vec![sliver], 1.0);
    assert!(kept.is_empty());
  }
}
