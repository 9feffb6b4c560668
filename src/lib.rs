//! Runtime-destructible 2D terrain plugin for Bevy.
//!
//! A [`DestructibleSurface`] starts from a sprite texture: its opaque
//! region is traced into collision polygons on the first rendered
//! frame, and afterwards arbitrary polygonal areas can be destroyed at
//! runtime. Each destroy synchronously rebuilds the collision set with
//! boolean clipping (including splitting polygons that ring a new
//! hole), stamps an erase shape into an off-screen destruction mask,
//! and re-syncs rapier colliders; any number of destroys in one frame
//! coalesce into a single mask redraw and readback.

pub mod config;
#[cfg(feature = "visual_debug")]
pub mod debug;
pub mod geom;
pub mod mask;
pub mod physics;
pub mod plugin;
pub mod polygon_set;
pub mod rebuild;
pub mod render;
pub mod schedule;
pub mod splitter;
pub mod surface;
pub mod sync;

pub use config::DestructibleConfig;
pub use mask::trace_opaque_contours;
pub use physics::SurfaceColliders;
pub use plugin::DestructiblePlugin;
pub use polygon_set::{CollisionPolygon, PolygonSet, PolygonSlot};
pub use render::{DestructionMaterial, EraseMaterial, SurfaceRenderTargets, SurfaceTexture};
pub use schedule::DestructibleSet;
pub use surface::{
  DestroyError, DestroyRejected, DestroyTerrain, DestructibleSurface, EraseShape, SurfaceState,
};
pub use sync::RenderSync;
