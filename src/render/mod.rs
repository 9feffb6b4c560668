//! Off-screen mask rendering and republish readback.
//!
//! Each surface gets a private mask scene: a dedicated render layer
//! holding a copy of the terrain sprite plus every erase stamp applied
//! so far, drawn by an off-screen camera into the surface's mask target.
//! The camera is inactive except for requested render-once passes, and
//! the republished target is read back to the CPU to feed both the
//! `destruction_mask` shader parameter and the one-shot initial
//! collision trace.

mod materials;

pub use materials::{DestructionMaterial, EraseMaterial};

use bevy::camera::visibility::RenderLayers;
use bevy::camera::{RenderTarget, ScalingMode};
use bevy::image::ImageSampler;
use bevy::prelude::*;
use bevy::render::gpu_readback::{Readback, ReadbackComplete};
use bevy::render::render_resource::{
  Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};
use log::{debug, info, warn};

use crate::config::DestructibleConfig;
use crate::mask::trace_opaque_contours;
use crate::surface::{DestructibleSurface, SurfaceState};
use crate::sync::RenderSync;

/// First render layer used for mask scenes; each surface claims the
/// next layer up so mask scenes never bleed into each other.
pub const MASK_LAYER_BASE: usize = 16;

/// Marker resource indicating rendering infrastructure is available.
/// Inserted by the plugin when RenderPlugin is detected.
#[derive(Resource)]
pub(crate) struct RenderingEnabled;

/// The terrain texture a surface is built from.
#[derive(Component, Clone)]
pub struct SurfaceTexture(pub Handle<Image>);

/// Marker for a surface's off-screen mask camera.
#[derive(Component)]
pub struct MaskCamera;

/// Hands out one render layer per attached surface.
#[derive(Resource)]
pub(crate) struct MaskLayerAllocator {
  next: usize,
}

impl Default for MaskLayerAllocator {
  fn default() -> Self {
    Self {
      next: MASK_LAYER_BASE,
    }
  }
}

impl MaskLayerAllocator {
  fn allocate(&mut self) -> usize {
    let layer = self.next;
    self.next += 1;
    layer
  }
}

/// Render-side handles of an attached surface.
#[derive(Component)]
pub struct SurfaceRenderTargets {
  /// GPU render target the mask camera draws into.
  pub mask_target: Handle<Image>,
  /// CPU-updated copy bound to the terrain material as
  /// `destruction_mask`.
  pub mask_image: Handle<Image>,
  /// The off-screen camera entity.
  pub mask_camera: Entity,
  /// This surface's private render layer.
  pub layer: usize,
  /// Z cursor for erase stamps, so later stamps draw above earlier
  /// ones within the mask scene.
  next_stamp_z: f32,
}

/// System: attaches render infrastructure to new surfaces.
///
/// Waits until the surface's base texture asset is loaded (the mask
/// scene has no content to trace before then), then creates the mask
/// target and mask image, spawns the off-screen camera and the base
/// sprite copy, swaps the surface's visible sprite to the destruction
/// material, and queues the first render-once plus the initial-build
/// readback.
pub fn attach_surfaces(
  mut commands: Commands,
  mut images: ResMut<Assets<Image>>,
  mut meshes: ResMut<Assets<Mesh>>,
  mut color_materials: ResMut<Assets<ColorMaterial>>,
  mut destruction_materials: ResMut<Assets<DestructionMaterial>>,
  mut layers: ResMut<MaskLayerAllocator>,
  mut surfaces: Query<
    (Entity, &mut DestructibleSurface, &SurfaceTexture, &mut RenderSync),
    Without<SurfaceRenderTargets>,
  >,
) {
  for (entity, mut surface, texture, mut sync) in surfaces.iter_mut() {
    let Some(base_image) = images.get(&texture.0) else {
      continue; // still loading
    };

    if surface.world_size == UVec2::ZERO {
      surface.world_size = base_image.size();
    }
    let size = surface.world_size;
    if size.x == 0 || size.y == 0 {
      warn!("surface {:?} has an empty world size; skipping attach", entity);
      continue;
    }

    let layer = layers.allocate();
    let mask_target = images.add(create_mask_target(size));
    let mask_image = images.add(create_mask_image(size));

    let (width, height) = (size.x as f32, size.y as f32);

    // Off-screen camera over the mask scene. One world unit per pixel;
    // inactive until a render-once is requested.
    let mask_camera = commands
      .spawn((
        Name::new("DestructibleMaskCamera"),
        MaskCamera,
        Camera2d,
        Camera {
          order: -1,
          target: RenderTarget::Image(mask_target.clone().into()),
          clear_color: ClearColorConfig::Custom(Color::NONE),
          is_active: false,
          ..default()
        },
        Projection::Orthographic(OrthographicProjection {
          near: -1000.0,
          far: 1000.0,
          scale: 1.0,
          viewport_origin: Vec2::new(0.5, 0.5),
          scaling_mode: ScalingMode::Fixed {
            width,
            height,
          },
          area: Rect::default(),
        }),
        Transform::from_xyz(width / 2.0, height / 2.0, 0.0),
        RenderLayers::layer(layer),
      ))
      .id();

    // Copy of the terrain sprite inside the mask scene. The visible
    // sprite is replaced below, so the copy is the only full render of
    // the base texture.
    commands.spawn((
      Name::new("DestructibleMaskBase"),
      Mesh2d(meshes.add(Rectangle::new(width, height))),
      MeshMaterial2d(color_materials.add(ColorMaterial::from(texture.0.clone()))),
      Transform::from_xyz(width / 2.0, height / 2.0, 0.0),
      RenderLayers::layer(layer),
    ));

    // The visible terrain: base texture with the mask's alpha applied.
    commands.entity(entity).insert((
      Mesh2d(meshes.add(Rectangle::new(width, height))),
      MeshMaterial2d(destruction_materials.add(DestructionMaterial {
        base_texture: texture.0.clone(),
        destruction_mask: mask_image.clone(),
      })),
      SurfaceRenderTargets {
        mask_target,
        mask_image,
        mask_camera,
        layer,
        next_stamp_z: 1.0,
      },
    ));

    surface.mark_attached();
    sync.request_rerender();
    sync.request_mask_republish();
    debug!(
      "attached surface {:?}: {}x{} mask on layer {}",
      entity, size.x, size.y, layer
    );
  }
}

fn create_mask_target(size: UVec2) -> Image {
  let extent = Extent3d {
    width: size.x,
    height: size.y,
    depth_or_array_layers: 1,
  };

  let mut target = Image {
    texture_descriptor: TextureDescriptor {
      label: Some("destructible_mask_target"),
      size: extent,
      dimension: TextureDimension::D2,
      format: TextureFormat::Rgba8UnormSrgb,
      mip_level_count: 1,
      sample_count: 1,
      usage: TextureUsages::TEXTURE_BINDING
        | TextureUsages::COPY_DST
        | TextureUsages::COPY_SRC
        | TextureUsages::RENDER_ATTACHMENT,
      view_formats: &[],
    },
    sampler: ImageSampler::nearest(),
    ..default()
  };
  target.resize(extent);
  target
}

/// Fully opaque placeholder so the terrain renders intact until the
/// first republish lands.
fn create_mask_image(size: UVec2) -> Image {
  let extent = Extent3d {
    width: size.x,
    height: size.y,
    depth_or_array_layers: 1,
  };
  Image::new_fill(
    extent,
    TextureDimension::D2,
    &[255, 255, 255, 255],
    TextureFormat::Rgba8UnormSrgb,
    Default::default(),
  )
}

/// System: deactivates mask cameras that rendered last frame.
///
/// Runs before [`drive_render_once`] in the same chain, so a camera
/// stays active for exactly one render per request.
pub fn deactivate_mask_cameras(mut cameras: Query<&mut Camera, With<MaskCamera>>) {
  for mut camera in cameras.iter_mut() {
    if camera.is_active {
      camera.is_active = false;
    }
  }
}

/// System: spawns queued erase stamps into their mask scenes.
///
/// Stamps whose texture asset is still loading stay queued; when one
/// finally spawns, a fresh rerender and republish are requested so the
/// mask catches up.
pub fn spawn_erase_sprites(
  mut commands: Commands,
  images: Res<Assets<Image>>,
  mut meshes: ResMut<Assets<Mesh>>,
  mut erase_materials: ResMut<Assets<EraseMaterial>>,
  mut surfaces: Query<(&mut RenderSync, &mut SurfaceRenderTargets, &DestructibleSurface)>,
) {
  for (mut sync, mut targets, surface) in surfaces.iter_mut() {
    if sync.pending_erases.is_empty() {
      continue;
    }

    let height = surface.world_size.y as f32;
    let mut deferred = Vec::new();
    let mut spawned_any = false;

    for erase in sync.pending_erases.drain(..) {
      let Some(stamp_image) = images.get(&erase.texture) else {
        deferred.push(erase);
        continue;
      };

      let stamp_size = stamp_image.size().as_vec2();
      let z = targets.next_stamp_z;
      targets.next_stamp_z += 1.0;

      // Surface-local pixel coordinates are y-down from the top-left;
      // the mask scene is y-up, so flip both position and rotation.
      commands.spawn((
        Name::new("DestructibleEraseStamp"),
        Mesh2d(meshes.add(Rectangle::new(stamp_size.x, stamp_size.y))),
        MeshMaterial2d(erase_materials.add(EraseMaterial {
          texture: erase.texture.clone(),
        })),
        Transform {
          translation: Vec3::new(erase.position.x, height - erase.position.y, z),
          rotation: Quat::from_rotation_z(-erase.rotation),
          ..default()
        },
        RenderLayers::layer(targets.layer),
      ));
      spawned_any = true;
    }

    sync.pending_erases = deferred;
    if spawned_any {
      sync.request_rerender();
      sync.request_mask_republish();
    }
  }
}

/// System: turns queued rerender flags into one active camera frame.
pub fn drive_render_once(
  mut surfaces: Query<(&mut RenderSync, &SurfaceRenderTargets)>,
  mut cameras: Query<&mut Camera, With<MaskCamera>>,
) {
  for (mut sync, targets) in surfaces.iter_mut() {
    if !sync.rerender_queued {
      continue;
    }
    sync.rerender_queued = false;

    if let Ok(mut camera) = cameras.get_mut(targets.mask_camera) {
      camera.is_active = true;
    }
  }
}

/// System: schedules coalesced mask readbacks.
///
/// At most one readback entity exists per surface; it fires after the
/// next completed render pass, updates the mask image, runs the initial
/// collision trace if this was the surface's first render, and
/// despawns itself.
pub fn schedule_mask_republish(
  mut commands: Commands,
  mut surfaces: Query<(Entity, &mut RenderSync, &SurfaceRenderTargets)>,
) {
  for (surface_entity, mut sync, targets) in surfaces.iter_mut() {
    if !sync.republish_ready() {
      continue;
    }
    sync.republish_queued = false;
    sync.republish_in_flight = true;

    let mask_image = targets.mask_image.clone();
    let readback = commands.spawn(Readback::texture(targets.mask_target.clone())).id();

    commands.entity(readback).observe(
      move |on: On<ReadbackComplete>,
            mut commands: Commands,
            mut images: ResMut<Assets<Image>>,
            mut surfaces: Query<(&mut DestructibleSurface, &mut RenderSync)>,
            config: Res<DestructibleConfig>| {
        // One-shot: unregister before anything else can re-fire it.
        commands.entity(readback).despawn();

        let Ok((mut surface, mut sync)) = surfaces.get_mut(surface_entity) else {
          return;
        };
        sync.republish_in_flight = false;

        let bytes = on.event().data.clone();
        apply_mask_republish(&mut surface, &mut images, &mask_image, bytes, &config);
      },
    );
  }
}

/// Applies one completed readback: republish the mask image and, on the
/// surface's first render, build the initial collision polygons.
fn apply_mask_republish(
  surface: &mut DestructibleSurface,
  images: &mut Assets<Image>,
  mask_image: &Handle<Image>,
  bytes: Vec<u8>,
  config: &DestructibleConfig,
) {
  let size = surface.world_size;
  let expected = (size.x * size.y * 4) as usize;
  if bytes.len() < expected {
    warn!(
      "mask readback returned {} bytes, expected {}; dropping republish",
      bytes.len(),
      expected
    );
    return;
  }

  if surface.state() == SurfaceState::WaitingFirstRender {
    let polygons = trace_opaque_contours(
      size.x,
      size.y,
      &bytes,
      config.alpha_threshold,
      config.simplify_tolerance,
    );
    info!(
      "initial collision build: {} polygon(s) traced from {}x{} mask",
      polygons.len(),
      size.x,
      size.y
    );
    surface.install_initial_polygons(polygons);
  }

  if let Some(image) = images.get_mut(mask_image) {
    image.data = Some(bytes);
  }
}
