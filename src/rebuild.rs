//! Collision polygon rebuilding after a destroy event.
//!
//! Walks every stored polygon, subtracts the destroy shape, and updates
//! the arena according to the clip outcome. A pure function of the
//! current set and the destroy polygon; no history, no randomness.

use bevy::math::{UVec2, Vec2};

use crate::geom;
use crate::polygon_set::PolygonSet;
use crate::splitter;

/// Subtracts `destroy` from every polygon in `set`.
///
/// Per-polygon clip outcomes:
/// - zero results: the polygon was fully consumed (usually the remnant
///   of a small island); its slot is freed.
/// - two results where the second ring is clockwise: the destroy shape
///   is strictly interior, leaving a hole no simple polygon can hold.
///   The polygon is removed and replaced by the splitter's hole-free
///   pieces, appended into fresh slots.
/// - anything else: an ordinary split. The first result replaces the
///   polygon in its slot, the rest append as new islands.
///
/// Results below `min_vertices` are discarded; if the first result is
/// discarded the original slot is freed rather than replaced.
pub fn rebuild(set: &mut PolygonSet, world_size: UVec2, destroy: &[Vec2], min_vertices: usize) {
  for index in set.occupied_indices() {
    let Some(slot) = set.get(index) else {
      continue;
    };
    let polygon = slot.polygon.points.clone();

    let clipped = geom::clip(&polygon, destroy);

    match clipped.len() {
      0 => {
        set.remove(index);
      }
      2 if geom::is_clockwise(&clipped[1]) => {
        let pieces = splitter::split(&polygon, destroy, world_size);
        set.remove(index);
        for piece in pieces {
          if piece.len() >= min_vertices {
            set.append(piece);
          }
        }
      }
      _ => {
        update_slot(set, index, clipped, min_vertices);
      }
    }
  }
}

/// Applies an ordinary (non-hole) clip result to a slot.
fn update_slot(set: &mut PolygonSet, index: usize, clipped: Vec<Vec<Vec2>>, min_vertices: usize) {
  for (i, piece) in clipped.into_iter().enumerate() {
    if piece.len() < min_vertices {
      if i == 0 {
        set.remove(index);
      }
      continue;
    }

    if i == 0 {
      set.replace(index, piece);
    } else {
      set.append(piece);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const WORLD: UVec2 = UVec2::new(100, 100);
  const MIN_VERTICES: usize = 3;

  fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Vec2> {
    vec![
      Vec2::new(x0, y0),
      Vec2::new(x1, y0),
      Vec2::new(x1, y1),
      Vec2::new(x0, y1),
    ]
  }

  fn full_world_set() -> PolygonSet {
    PolygonSet::from_polygons([rect(0.0, 0.0, 100.0, 100.0)])
  }

  #[test]
  fn interior_destroy_triggers_hole_split() {
    // Scenario A: a 20x20 square centered at (50,50) carved out of the
    // full 100x100 polygon leaves two hole-free pieces of 9600 total.
    let mut set = full_world_set();
    rebuild(&mut set, WORLD, &rect(40.0, 40.0, 60.0, 60.0), MIN_VERTICES);

    assert_eq!(set.len(), 2);
    let total = set.total_area();
    assert!(
      (total - 9600.0).abs() / 9600.0 < 1e-3,
      "total area {} should be 9600",
      total
    );
    for (_, slot) in set.iter() {
      assert!(!geom::is_clockwise(&slot.polygon.points));
    }
  }

  #[test]
  fn disjoint_destroy_is_a_no_op() {
    // Scenario B: a destroy polygon fully outside the world leaves the
    // set unchanged, with no appended fragments.
    let mut set = full_world_set();
    let generation = set.generation();
    rebuild(&mut set, WORLD, &rect(200.0, 200.0, 240.0, 240.0), MIN_VERTICES);

    assert_eq!(set.len(), 1);
    let (index, slot) = set.iter().next().unwrap();
    assert_eq!(index, 0);
    assert!((slot.polygon.area() - 10000.0).abs() < 1e-2);
    // The clip returned the polygon itself; the in-place replacement
    // still counts as a mutation but adds nothing.
    assert!(set.generation() >= generation);
  }

  #[test]
  fn edge_destroy_replaces_in_place() {
    let mut set = full_world_set();
    rebuild(&mut set, WORLD, &rect(-10.0, -10.0, 30.0, 30.0), MIN_VERTICES);

    assert_eq!(set.len(), 1);
    let (index, slot) = set.iter().next().unwrap();
    assert_eq!(index, 0, "surviving piece stays in the original slot");
    assert!(slot.version > 0, "in-place replacement bumps the version");
    assert!((slot.polygon.area() - (10000.0 - 900.0)).abs() < 1e-1);
  }

  #[test]
  fn bisecting_destroy_appends_new_island() {
    // A vertical strip through the middle splits the square into two
    // crossing-boundary pieces: one replaces slot 0, one appends.
    let mut set = full_world_set();
    rebuild(&mut set, WORLD, &rect(45.0, -10.0, 55.0, 110.0), MIN_VERTICES);

    assert_eq!(set.len(), 2);
    assert!(set.get(0).is_some());
    assert!(set.get(1).is_some());
    let total = set.total_area();
    assert!((total - 9000.0).abs() / 9000.0 < 1e-3);
  }

  #[test]
  fn full_consumption_frees_the_slot() {
    let mut set = PolygonSet::from_polygons([rect(40.0, 40.0, 50.0, 50.0)]);
    rebuild(&mut set, WORLD, &rect(0.0, 0.0, 100.0, 100.0), MIN_VERTICES);
    assert!(set.is_empty());
  }

  #[test]
  fn area_is_monotonically_non_increasing() {
    let mut set = full_world_set();
    let mut previous = set.total_area();

    let destroys = [
      rect(40.0, 40.0, 60.0, 60.0),
      rect(-10.0, 20.0, 25.0, 45.0),
      rect(70.0, 70.0, 130.0, 130.0),
      rect(40.0, 40.0, 60.0, 60.0), // repeat: already carved, no-op
    ];

    for destroy in &destroys {
      rebuild(&mut set, WORLD, destroy, MIN_VERTICES);
      let current = set.total_area();
      assert!(
        current <= previous + 1e-2,
        "area grew from {} to {}",
        previous,
        current
      );
      previous = current;
    }
  }

  #[test]
  fn no_degenerate_polygon_is_ever_stored() {
    let mut set = full_world_set();
    // A sliver destroy that shaves the polygon edge can produce tiny
    // fragments; none below 3 vertices may survive.
    rebuild(&mut set, WORLD, &rect(-1.0, -1.0, 100.5, 0.5), MIN_VERTICES);
    rebuild(&mut set, WORLD, &rect(99.5, -1.0, 101.0, 101.0), MIN_VERTICES);

    for (_, slot) in set.iter() {
      assert!(slot.polygon.points.len() >= 3);
    }
  }
}
