//! The destructible surface entity and its destroy entry point.
//!
//! A surface owns its world size, collision polygon set, and lifecycle
//! state. Collision mutation is synchronous; visual updates are deferred
//! through the render sync scheduler.

use bevy::math::UVec2;
use bevy::prelude::*;
use log::debug;

use crate::config::DestructibleConfig;
use crate::polygon_set::PolygonSet;
use crate::rebuild;

/// Lifecycle of a destructible surface.
///
/// `Ready` is terminal: once the initial collision build completes the
/// surface never re-enters an earlier state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SurfaceState {
  /// Spawned but not yet attached to the render pipeline.
  #[default]
  Uninitialized,
  /// Attached; waiting for the first completed render of the mask
  /// target before the initial collision trace can run.
  WaitingFirstRender,
  /// Initial collision geometry installed; destroys are accepted.
  Ready,
}

/// Why a destroy request was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestroyError {
  /// The surface has not finished its initial collision build. This is
  /// a caller-ordering bug, not a transient condition worth retrying.
  NotReady,
}

impl std::fmt::Display for DestroyError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::NotReady => write!(f, "destroy on uninitialized surface"),
    }
  }
}

impl std::error::Error for DestroyError {}

/// Appearance of one erase stroke, consumed only by the visual layer.
///
/// Collision math never looks at this; the destroy polygon alone drives
/// the collision rebuild.
#[derive(Clone, Debug)]
pub struct EraseShape {
  /// Texture stamped into the mask with erase blending.
  pub texture: Handle<Image>,
  /// Stamp center in surface-local pixel coordinates.
  pub position: Vec2,
  /// Stamp rotation in radians.
  pub rotation: f32,
}

/// Destroys an area of a surface's texture and collision.
///
/// The sole external entry point. Rejected with [`DestroyRejected`] if
/// the surface is not yet [`SurfaceState::Ready`].
#[derive(Message, Clone, Debug)]
pub struct DestroyTerrain {
  /// The surface entity to carve.
  pub surface: Entity,
  /// Destroy polygon in surface-local pixel coordinates.
  pub polygon: Vec<Vec2>,
  /// Visual erase stamp.
  pub erase: EraseShape,
}

/// Written back to callers whose destroy request was rejected.
#[derive(Message, Clone, Debug)]
pub struct DestroyRejected {
  pub surface: Entity,
  pub reason: DestroyError,
}

/// A runtime-destructible 2D terrain surface.
///
/// Exclusively owns its collision polygon set; the set is created once
/// (by the initial mask trace, or [`install_initial_polygons`] in
/// headless use) and thereafter mutated only by the collision rebuilder
/// via [`carve`].
///
/// [`install_initial_polygons`]: DestructibleSurface::install_initial_polygons
/// [`carve`]: DestructibleSurface::carve
#[derive(Component)]
#[require(crate::sync::RenderSync, crate::physics::SurfaceColliders)]
pub struct DestructibleSurface {
  /// Integer world size in pixels; also the mask target size.
  pub world_size: UVec2,
  /// Collision polygons in arena slots.
  pub polygons: PolygonSet,
  state: SurfaceState,
}

impl DestructibleSurface {
  /// Creates an uninitialized surface of the given world size.
  pub fn new(world_size: UVec2) -> Self {
    Self {
      world_size,
      polygons: PolygonSet::default(),
      state: SurfaceState::Uninitialized,
    }
  }

  /// Current lifecycle state.
  pub fn state(&self) -> SurfaceState {
    self.state
  }

  /// Returns true if destroys are accepted.
  pub fn is_ready(&self) -> bool {
    self.state == SurfaceState::Ready
  }

  /// Marks the surface as attached and waiting for its first render.
  pub(crate) fn mark_attached(&mut self) {
    if self.state == SurfaceState::Uninitialized {
      self.state = SurfaceState::WaitingFirstRender;
    }
  }

  /// Installs the initial collision polygon set and transitions to
  /// `Ready`.
  ///
  /// Called by the mask builder after the first completed render pass.
  /// Headless callers (tests, servers) may call it directly with traced
  /// or synthetic geometry. Subsequent calls are ignored: `Ready` is
  /// terminal and the set is only mutated by destroys afterwards.
  pub fn install_initial_polygons(&mut self, polygons: impl IntoIterator<Item = Vec<Vec2>>) {
    if self.state == SurfaceState::Ready {
      debug!("install_initial_polygons called on a ready surface; ignoring");
      return;
    }

    self.polygons = PolygonSet::from_polygons(polygons);
    self.state = SurfaceState::Ready;
  }

  /// Synchronously subtracts `destroy_polygon` from the collision set.
  ///
  /// The collision half of a destroy request; the caller is responsible
  /// for scheduling the visual rerender and mask republish afterwards.
  pub fn carve(
    &mut self,
    destroy_polygon: &[Vec2],
    config: &DestructibleConfig,
  ) -> Result<(), DestroyError> {
    if !self.is_ready() {
      return Err(DestroyError::NotReady);
    }

    rebuild::rebuild(
      &mut self.polygons,
      self.world_size,
      destroy_polygon,
      config.min_polygon_vertices,
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn square(size: f32) -> Vec<Vec2> {
    vec![
      Vec2::new(0.0, 0.0),
      Vec2::new(size, 0.0),
      Vec2::new(size, size),
      Vec2::new(0.0, size),
    ]
  }

  #[test]
  fn carve_before_ready_is_rejected() {
    let mut surface = DestructibleSurface::new(UVec2::new(100, 100));
    let config = DestructibleConfig::default();

    let result = surface.carve(&square(10.0), &config);
    assert_eq!(result, Err(DestroyError::NotReady));

    surface.mark_attached();
    let result = surface.carve(&square(10.0), &config);
    assert_eq!(result, Err(DestroyError::NotReady));
  }

  #[test]
  fn install_transitions_to_ready_once() {
    let mut surface = DestructibleSurface::new(UVec2::new(100, 100));
    surface.mark_attached();
    surface.install_initial_polygons([square(100.0)]);

    assert!(surface.is_ready());
    assert_eq!(surface.polygons.len(), 1);

    // Ready is terminal; a second install must not reset the set.
    let config = DestructibleConfig::default();
    surface
      .carve(
        &[
          Vec2::new(40.0, 40.0),
          Vec2::new(60.0, 40.0),
          Vec2::new(60.0, 60.0),
          Vec2::new(40.0, 60.0),
        ],
        &config,
      )
      .unwrap();
    let carved = surface.polygons.total_area();
    surface.install_initial_polygons([square(100.0)]);
    assert_eq!(surface.polygons.total_area(), carved);
  }

  #[test]
  fn carve_mutates_polygon_set() {
    let mut surface = DestructibleSurface::new(UVec2::new(100, 100));
    surface.install_initial_polygons([square(100.0)]);
    let config = DestructibleConfig::default();

    surface
      .carve(
        &[
          Vec2::new(-10.0, -10.0),
          Vec2::new(30.0, -10.0),
          Vec2::new(30.0, 30.0),
          Vec2::new(-10.0, 30.0),
        ],
        &config,
      )
      .unwrap();

    assert!(surface.polygons.total_area() < 10000.0);
  }
}
