//! Materials for the mask pipeline.
//!
//! `DestructionMaterial` draws the visible terrain sprite, multiplying
//! the base texture's alpha by the republished destruction mask.
//! `EraseMaterial` stamps erase shapes into the off-screen mask target
//! with destination-out blending, so stamp alpha carves the accumulated
//! mask instead of drawing over it.

use bevy::mesh::MeshVertexBufferLayoutRef;
use bevy::prelude::*;
use bevy::render::render_resource::{
  AsBindGroup, BlendComponent, BlendFactor, BlendOperation, BlendState, RenderPipelineDescriptor,
  SpecializedMeshPipelineError,
};
use bevy::shader::ShaderRef;
use bevy::sprite_render::{AlphaMode2d, Material2d, Material2dKey};

/// Material for the visible terrain sprite.
#[derive(Asset, TypePath, AsBindGroup, Clone)]
pub struct DestructionMaterial {
  /// The terrain's own texture.
  #[texture(0)]
  #[sampler(1)]
  pub base_texture: Handle<Image>,

  /// Republished mask image; alpha 0 marks carved-away pixels.
  #[texture(2)]
  #[sampler(3)]
  pub destruction_mask: Handle<Image>,
}

impl Material2d for DestructionMaterial {
  fn fragment_shader() -> ShaderRef {
    "embedded://bevy_destructible_2d/render/shaders/destruction.wgsl".into()
  }

  fn alpha_mode(&self) -> AlphaMode2d {
    AlphaMode2d::Blend
  }
}

/// Material for erase stamps on the mask layer.
#[derive(Asset, TypePath, AsBindGroup, Clone)]
pub struct EraseMaterial {
  /// Stamp texture; its alpha is the erase strength.
  #[texture(0)]
  #[sampler(1)]
  pub texture: Handle<Image>,
}

impl Material2d for EraseMaterial {
  fn fragment_shader() -> ShaderRef {
    "embedded://bevy_destructible_2d/render/shaders/erase.wgsl".into()
  }

  fn alpha_mode(&self) -> AlphaMode2d {
    AlphaMode2d::Blend
  }

  // Destination-out blending: dst *= 1 - src_alpha. The stamp never
  // contributes color of its own; it only removes what the base sprite
  // already drew into the mask target.
  fn specialize(
    descriptor: &mut RenderPipelineDescriptor,
    _layout: &MeshVertexBufferLayoutRef,
    _key: Material2dKey<Self>,
  ) -> Result<(), SpecializedMeshPipelineError> {
    if let Some(fragment) = descriptor.fragment.as_mut() {
      for target in fragment.targets.iter_mut().flatten() {
        target.blend = Some(BlendState {
          color: BlendComponent {
            src_factor: BlendFactor::Zero,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
          },
          alpha: BlendComponent {
            src_factor: BlendFactor::Zero,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
          },
        });
      }
    }
    Ok(())
  }
}
