//! Plugin assembly and system scheduling.

use bevy::asset::embedded_asset;
use bevy::prelude::*;
use bevy::render::RenderPlugin;
use bevy::sprite_render::Material2dPlugin;
use bevy_rapier2d::prelude::RigidBody;

use crate::config::DestructibleConfig;
use crate::physics::{sync_surface_colliders, SurfaceColliders};
use crate::render::{
  attach_surfaces, deactivate_mask_cameras, drive_render_once, schedule_mask_republish,
  spawn_erase_sprites, DestructionMaterial, EraseMaterial, MaskLayerAllocator, RenderingEnabled,
};
use crate::schedule::DestructibleSet;
use crate::surface::{DestroyRejected, DestroyTerrain, DestructibleSurface};
use crate::sync::apply_destroy_requests;

/// Adds runtime-destructible terrain surfaces to an app.
///
/// Without a `RenderPlugin` in the app (headless servers, tests) the
/// visual systems are skipped entirely; collision destroys and physics
/// sync still work, with initial geometry supplied through
/// [`DestructibleSurface::install_initial_polygons`].
pub struct DestructiblePlugin;

impl Plugin for DestructiblePlugin {
  fn build(&self, app: &mut App) {
    app
      .add_message::<DestroyTerrain>()
      .add_message::<DestroyRejected>()
      .init_resource::<DestructibleConfig>()
      .init_resource::<MaskLayerAllocator>();

    app.configure_sets(
      Update,
      (
        DestructibleSet::ApplyDestroys,
        DestructibleSet::DriveRender,
        DestructibleSet::SyncPhysics,
      )
        .chain(),
    );

    app.add_systems(
      Update,
      apply_destroy_requests.in_set(DestructibleSet::ApplyDestroys),
    );
    app.add_systems(
      Update,
      (ensure_surface_bodies, sync_surface_colliders)
        .chain()
        .in_set(DestructibleSet::SyncPhysics),
    );

    if app.is_plugin_added::<RenderPlugin>() {
      app.insert_resource(RenderingEnabled);

      embedded_asset!(app, "render/shaders/destruction.wgsl");
      embedded_asset!(app, "render/shaders/erase.wgsl");

      app.add_plugins((
        Material2dPlugin::<DestructionMaterial>::default(),
        Material2dPlugin::<EraseMaterial>::default(),
      ));

      app.add_systems(
        Update,
        (
          attach_surfaces,
          deactivate_mask_cameras,
          spawn_erase_sprites,
          drive_render_once,
          schedule_mask_republish,
        )
          .chain()
          .run_if(resource_exists::<RenderingEnabled>)
          .in_set(DestructibleSet::DriveRender),
      );

      #[cfg(feature = "visual_debug")]
      app.add_systems(
        Update,
        crate::debug::draw_collision_gizmos.after(DestructibleSet::SyncPhysics),
      );
    }
  }
}

/// Surfaces anchor their child colliders with a fixed body.
fn ensure_surface_bodies(
  mut commands: Commands,
  surfaces: Query<Entity, (With<DestructibleSurface>, With<SurfaceColliders>, Without<RigidBody>)>,
) {
  for entity in surfaces.iter() {
    commands.entity(entity).insert(RigidBody::Fixed);
  }
}
