//! Initial collision geometry from a rendered alpha mask.
//!
//! Runs once per surface, after the first completed render pass of the
//! off-screen mask target: traces every opaque region of the rendered
//! image as a simple polygon and installs the result as the surface's
//! starting collision set.

mod contour;
mod simplify;

pub use contour::{connect_segments, marching_segments};
pub use simplify::{simplify_closed, simplify_contours};

use bevy::math::Vec2;

use crate::geom;

/// Traces the opaque regions of an RGBA8 image as simple polygons.
///
/// `alpha_threshold` is the normalized alpha above which a pixel counts
/// as solid; the default configuration uses `0.0`, i.e. any opacity at
/// all. Contours are simplified with `simplify_tolerance` (pixels) and
/// normalized to counter-clockwise vertex order. Coordinates are in
/// image pixel space, which is also the surface's local space.
///
/// The sample grid is padded with a one-pixel empty border so contours
/// touching the image edge still close.
pub fn trace_opaque_contours(
  width: u32,
  height: u32,
  rgba: &[u8],
  alpha_threshold: f32,
  simplify_tolerance: f32,
) -> Vec<Vec<Vec2>> {
  let w = width as usize;
  let h = height as usize;
  if rgba.len() < w * h * 4 {
    log::warn!(
      "mask trace: pixel buffer too small ({} bytes for {}x{})",
      rgba.len(),
      width,
      height
    );
    return Vec::new();
  }

  let threshold = (alpha_threshold.clamp(0.0, 1.0) * 255.0) as u8;
  let solid = |x: usize, y: usize| -> bool {
    // Grid point (x, y) maps to pixel (x-1, y-1); the border ring and
    // anything out of range is empty.
    if x == 0 || y == 0 || x > w || y > h {
      return false;
    }
    let alpha = rgba[((y - 1) * w + (x - 1)) * 4 + 3];
    alpha > threshold
  };

  let segments = marching_segments(w + 2, h + 2, solid);
  let contours = connect_segments(
    segments
      .into_iter()
      .map(|(a, b)| (a - Vec2::ONE, b - Vec2::ONE))
      .collect(),
  );

  let mut polygons = simplify_contours(contours, simplify_tolerance);
  for polygon in &mut polygons {
    if geom::is_clockwise(polygon) {
      polygon.reverse();
    }
  }
  polygons
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geom::area;

  /// Blank RGBA canvas with an opaque axis-aligned rectangle painted in.
  fn canvas_with_rect(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<u8> {
    let mut rgba = vec![0u8; (w * h * 4) as usize];
    for y in y0..y1 {
      for x in x0..x1 {
        let i = ((y * w + x) * 4) as usize;
        rgba[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
      }
    }
    rgba
  }

  #[test]
  fn blank_canvas_yields_nothing() {
    let rgba = vec![0u8; 100 * 100 * 4];
    assert!(trace_opaque_contours(100, 100, &rgba, 0.0, 1.0).is_empty());
  }

  #[test]
  fn opaque_square_traces_to_four_corners() {
    // Scenario: a 40x40 opaque square at the origin of a 100x100 canvas
    // yields one polygon approximating the square's corners.
    let rgba = canvas_with_rect(100, 100, 0, 0, 40, 40);
    let polygons = trace_opaque_contours(100, 100, &rgba, 0.0, 1.0);

    assert_eq!(polygons.len(), 1);
    let polygon = &polygons[0];
    assert!(
      polygon.len() <= 8,
      "square should simplify to near-corner count, got {}",
      polygon.len()
    );
    assert!(!geom::is_clockwise(polygon));

    // Marching squares places the boundary half a pixel outside the
    // outermost solid samples, so allow a couple of pixels of slack.
    let traced = area(polygon);
    assert!(
      (traced - 1600.0).abs() < 170.0,
      "area {} should approximate 1600",
      traced
    );
  }

  #[test]
  fn two_islands_trace_to_two_polygons() {
    let mut rgba = canvas_with_rect(64, 64, 2, 2, 12, 12);
    let second = canvas_with_rect(64, 64, 40, 40, 60, 60);
    for (dst, src) in rgba.iter_mut().zip(second.iter()) {
      *dst |= *src;
    }

    let polygons = trace_opaque_contours(64, 64, &rgba, 0.0, 1.0);
    assert_eq!(polygons.len(), 2);
  }

  #[test]
  fn alpha_threshold_filters_faint_pixels() {
    let mut rgba = vec![0u8; 32 * 32 * 4];
    for y in 8..16 {
      for x in 8..16 {
        let i = (y * 32 + x) * 4;
        rgba[i..i + 4].copy_from_slice(&[255, 255, 255, 40]);
      }
    }

    assert_eq!(trace_opaque_contours(32, 32, &rgba, 0.0, 1.0).len(), 1);
    assert!(trace_opaque_contours(32, 32, &rgba, 0.5, 1.0).is_empty());
  }

  #[test]
  fn edge_touching_region_still_closes() {
    // Region flush against the canvas edge; the padded border closes it.
    let rgba = canvas_with_rect(32, 32, 0, 0, 32, 32);
    let polygons = trace_opaque_contours(32, 32, &rgba, 0.0, 1.0);
    assert_eq!(polygons.len(), 1);
    assert!(area(&polygons[0]) > 900.0);
  }
}
