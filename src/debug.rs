//! Collision outline gizmos.

use bevy::prelude::*;

use crate::config::DestructibleConfig;
use crate::surface::DestructibleSurface;

/// System: draws every surface's collision polygons as world-space
/// line loops. Gated at runtime on `DestructibleConfig::debug_gizmos`.
pub fn draw_collision_gizmos(
  config: Res<DestructibleConfig>,
  mut gizmos: Gizmos,
  surfaces: Query<(&DestructibleSurface, &GlobalTransform)>,
) {
  if !config.debug_gizmos {
    return;
  }

  for (surface, transform) in surfaces.iter() {
    let half = surface.world_size.as_vec2() / 2.0;

    for (_, slot) in surface.polygons.iter() {
      let points = &slot.polygon.points;
      if points.len() < 2 {
        continue;
      }

      let mut loop_points: Vec<Vec2> = points
        .iter()
        .map(|p| {
          // Surface-local pixel space is y-down; gizmos draw in the
          // surface's centered y-up world space.
          let local = Vec2::new(p.x - half.x, half.y - p.y);
          transform.transform_point(local.extend(0.0)).truncate()
        })
        .collect();
      if let Some(&first) = loop_points.first() {
        loop_points.push(first);
      }

      gizmos.linestrip_2d(loop_points, Color::srgb(0.2, 1.0, 0.4));
    }
  }
}
