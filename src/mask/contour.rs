//! Marching-squares contour extraction over an alpha bitmap.
//!
//! Produces closed polylines tracing the boundary of solid (opaque)
//! regions. Works on arbitrary image sizes; callers are expected to
//! sample with an empty border so every contour closes.

use std::collections::HashMap;

use bevy::math::Vec2;

/// Edge segment within one cell, in cell-local [0, 1] space.
type EdgeSegment = ((f32, f32), (f32, f32));

/// Marching squares lookup table.
///
/// Corner bits for a cell: bit 0 bottom-left, bit 1 bottom-right,
/// bit 2 top-left, bit 3 top-right (x right, y down in image space).
/// Each case yields 0, 1, or 2 segments crossing the cell at edge
/// midpoints; the two saddle cases emit two disjoint segments.
const EDGE_TABLE: [&[EdgeSegment]; 16] = [
  // 0000: empty
  &[],
  // 0001: bl
  &[((0.0, 0.5), (0.5, 0.0))],
  // 0010: br
  &[((0.5, 0.0), (1.0, 0.5))],
  // 0011: bl+br
  &[((0.0, 0.5), (1.0, 0.5))],
  // 0100: tl
  &[((0.5, 1.0), (0.0, 0.5))],
  // 0101: bl+tl
  &[((0.5, 1.0), (0.5, 0.0))],
  // 0110: br+tl (saddle)
  &[((0.5, 1.0), (0.0, 0.5)), ((0.5, 0.0), (1.0, 0.5))],
  // 0111: bl+br+tl
  &[((0.5, 1.0), (1.0, 0.5))],
  // 1000: tr
  &[((1.0, 0.5), (0.5, 1.0))],
  // 1001: bl+tr (saddle)
  &[((0.0, 0.5), (0.5, 0.0)), ((1.0, 0.5), (0.5, 1.0))],
  // 1010: br+tr
  &[((0.5, 0.0), (0.5, 1.0))],
  // 1011: bl+br+tr
  &[((0.0, 0.5), (0.5, 1.0))],
  // 1100: tl+tr
  &[((1.0, 0.5), (0.0, 0.5))],
  // 1101: bl+tl+tr
  &[((1.0, 0.5), (0.5, 0.0))],
  // 1110: br+tl+tr
  &[((0.5, 0.0), (0.0, 0.5))],
  // 1111: solid
  &[],
];

/// Runs marching squares over a `width` x `height` grid of samples.
///
/// `solid(x, y)` reports whether the grid point is inside the shape.
/// Returns one line segment per table entry, in grid coordinates.
pub fn marching_segments<F>(width: usize, height: usize, solid: F) -> Vec<(Vec2, Vec2)>
where
  F: Fn(usize, usize) -> bool,
{
  let mut segments = Vec::new();

  for y in 0..height.saturating_sub(1) {
    for x in 0..width.saturating_sub(1) {
      let bl = solid(x, y) as usize;
      let br = solid(x + 1, y) as usize;
      let tl = solid(x, y + 1) as usize;
      let tr = solid(x + 1, y + 1) as usize;
      let case = bl | (br << 1) | (tl << 2) | (tr << 3);

      let origin = Vec2::new(x as f32, y as f32);
      for &((ax, ay), (bx, by)) in EDGE_TABLE[case] {
        segments.push((origin + Vec2::new(ax, ay), origin + Vec2::new(bx, by)));
      }
    }
  }

  segments
}

/// Snaps an endpoint to a half-unit integer key.
///
/// Marching squares emits coordinates on exact 0.5 boundaries, so
/// doubling and rounding gives collision-free HashMap keys.
fn grid_key(v: Vec2) -> (i32, i32) {
  ((v.x * 2.0).round() as i32, (v.y * 2.0).round() as i32)
}

/// Connects loose segments into closed polylines by walking shared
/// endpoints. Open chains and fragments below 3 vertices are dropped.
pub fn connect_segments(segments: Vec<(Vec2, Vec2)>) -> Vec<Vec<Vec2>> {
  if segments.is_empty() {
    return Vec::new();
  }

  // Endpoint -> (segment index, endpoint-is-start) adjacency.
  let mut adjacency: HashMap<(i32, i32), Vec<(usize, bool)>> = HashMap::new();
  for (i, (start, end)) in segments.iter().enumerate() {
    adjacency.entry(grid_key(*start)).or_default().push((i, true));
    adjacency.entry(grid_key(*end)).or_default().push((i, false));
  }

  let mut used = vec![false; segments.len()];
  let mut polylines = Vec::new();

  for start_idx in 0..segments.len() {
    if used[start_idx] {
      continue;
    }

    let polyline = walk_chain(&segments, &adjacency, &mut used, start_idx);
    if polyline.len() >= 3 {
      polylines.push(polyline);
    }
  }

  polylines
}

/// Walks connected segments from `start_idx`, collecting vertices in
/// traversal order. A closed loop's duplicate closing vertex is removed.
fn walk_chain(
  segments: &[(Vec2, Vec2)],
  adjacency: &HashMap<(i32, i32), Vec<(usize, bool)>>,
  used: &mut [bool],
  start_idx: usize,
) -> Vec<Vec2> {
  let mut polyline = Vec::new();
  let mut current = start_idx;
  let mut from_start = true;

  loop {
    used[current] = true;
    let (seg_start, seg_end) = segments[current];

    let (entry, exit) = if from_start {
      (seg_start, seg_end)
    } else {
      (seg_end, seg_start)
    };
    if polyline.is_empty() {
      polyline.push(entry);
    }
    polyline.push(exit);

    let key = grid_key(exit);
    let next = adjacency
      .get(&key)
      .and_then(|neighbors| neighbors.iter().find(|(idx, _)| !used[*idx]).copied());

    match next {
      Some((idx, is_start)) => {
        current = idx;
        from_start = is_start;
      }
      None => break,
    }
  }

  if polyline.len() >= 4 {
    let first = polyline[0];
    let last = *polyline.last().unwrap();
    if (first - last).length_squared() < 1e-6 {
      polyline.pop();
    }
  }

  polyline
}
