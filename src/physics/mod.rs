//! Rapier collider synchronization.
//!
//! Mirrors a surface's collision polygon set into child collider
//! entities, one per occupied slot. Slots are diffed by version so an
//! unchanged polygon keeps its collider across rebuilds; a changed or
//! vacated slot drops its collider, and changed and new slots get a
//! fresh one.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use log::{debug, warn};

use crate::surface::DestructibleSurface;

/// Tracks the collider entity spawned for each polygon slot, keyed by
/// slot index with the slot version it was built from.
#[derive(Component, Default)]
pub struct SurfaceColliders {
  slots: HashMap<usize, (Entity, u64)>,
  last_generation: u64,
}

impl SurfaceColliders {
  /// Number of live collider entities.
  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  /// The collider entity for a slot, if one exists.
  pub fn collider_for(&self, slot: usize) -> Option<Entity> {
    self.slots.get(&slot).map(|(entity, _)| *entity)
  }
}

/// System: rebuilds child colliders for surfaces whose polygon set
/// changed since the last sync.
pub fn sync_surface_colliders(
  mut commands: Commands,
  mut surfaces: Query<(Entity, &DestructibleSurface, &mut SurfaceColliders)>,
) {
  for (entity, surface, mut colliders) in surfaces.iter_mut() {
    if surface.polygons.generation() == colliders.last_generation {
      continue;
    }
    colliders.last_generation = surface.polygons.generation();

    let mut stale: Vec<usize> = Vec::new();
    for (&slot, &(collider, version)) in colliders.slots.iter() {
      match surface.polygons.get(slot) {
        Some(live) if live.version == version => {}
        _ => {
          commands.entity(collider).despawn();
          stale.push(slot);
        }
      }
    }
    for slot in stale {
      colliders.slots.remove(&slot);
    }

    for (slot, live) in surface.polygons.iter() {
      if colliders.slots.contains_key(&slot) {
        continue;
      }
      let Some(collider) = build_polygon_collider(&live.polygon.points, surface.world_size) else {
        warn!(
          "slot {} of surface {:?} produced no collider ({} vertices)",
          slot,
          entity,
          live.polygon.points.len()
        );
        continue;
      };
      let child = commands
        .spawn((
          Name::new(format!("DestructibleCollider{slot}")),
          collider,
          Transform::IDENTITY,
          ChildOf(entity),
        ))
        .id();
      colliders.slots.insert(slot, (child, live.version));
    }

    debug!(
      "collider sync for {:?}: {} collider(s) at generation {}",
      entity,
      colliders.len(),
      colliders.last_generation
    );
  }
}

/// Builds a collider for one collision polygon.
///
/// Polygon points are surface-local pixel coordinates (y-down from the
/// top-left); colliders live in the surface's centered y-up local
/// space, so every point is flipped before decomposition. Concave
/// outlines are handled by convex decomposition over the boundary
/// edge loop.
fn build_polygon_collider(points: &[Vec2], world_size: UVec2) -> Option<Collider> {
  if points.len() < 3 {
    return None;
  }

  let half = world_size.as_vec2() / 2.0;
  let vertices: Vec<Vec2> = points
    .iter()
    .map(|p| Vec2::new(p.x - half.x, half.y - p.y))
    .collect();

  let indices: Vec<[u32; 2]> = (0..vertices.len() as u32)
    .map(|i| [i, (i + 1) % vertices.len() as u32])
    .collect();

  Some(Collider::convex_decomposition(&vertices, &indices))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collider_points_flip_to_centered_y_up() {
    let size = UVec2::new(100, 60);
    let half = size.as_vec2() / 2.0;

    // Top-left pixel corner maps to the top-left of the centered space.
    let p = Vec2::ZERO;
    let flipped = Vec2::new(p.x - half.x, half.y - p.y);
    assert_eq!(flipped, Vec2::new(-50.0, 30.0));

    // Bottom-right pixel corner maps to the bottom-right.
    let p = size.as_vec2();
    let flipped = Vec2::new(p.x - half.x, half.y - p.y);
    assert_eq!(flipped, Vec2::new(50.0, -30.0));
  }

  #[test]
  fn degenerate_polygon_builds_no_collider() {
    let points = vec![Vec2::ZERO, Vec2::new(10.0, 0.0)];
    assert!(build_polygon_collider(&points, UVec2::new(64, 64)).is_none());
  }

  #[test]
  fn triangle_builds_a_collider() {
    let points = vec![Vec2::ZERO, Vec2::new(0.0, 20.0), Vec2::new(20.0, 20.0)];
    assert!(build_polygon_collider(&points, UVec2::new(64, 64)).is_some());
  }
}
