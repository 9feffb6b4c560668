//! Render synchronization scheduling.
//!
//! Coalesces per-frame rerender and mask-republish requests so any
//! number of destroy calls in one frame costs exactly one off-screen
//! redraw and at most one GPU readback.

use bevy::prelude::*;
use log::warn;

use crate::config::DestructibleConfig;
use crate::surface::{DestroyRejected, DestroyTerrain, DestructibleSurface, EraseShape};

/// Per-surface render sync state.
///
/// `request_rerender` and `request_mask_republish` are idempotent within
/// a frame: the drive systems consume the queued flags once, and the
/// in-flight flag keeps a second readback from being scheduled while one
/// is outstanding. After a readback fires the flag resets, so a later
/// request schedules a fresh one against the following render pass.
#[derive(Component, Default, Debug)]
pub struct RenderSync {
  /// The mask target should redraw exactly once.
  pub rerender_queued: bool,
  /// A mask rebuild should run after the next completed render pass.
  pub republish_queued: bool,
  /// A readback entity is currently registered and has not fired yet.
  pub republish_in_flight: bool,
  /// Erase stamps not yet spawned into the mask scene.
  pub pending_erases: Vec<EraseShape>,
}

impl RenderSync {
  /// Marks the off-screen target dirty for one redraw.
  pub fn request_rerender(&mut self) {
    self.rerender_queued = true;
  }

  /// Schedules one mask rebuild after the next completed render pass.
  pub fn request_mask_republish(&mut self) {
    self.republish_queued = true;
  }

  /// Returns true if a republish may be scheduled right now.
  pub fn republish_ready(&self) -> bool {
    self.republish_queued && !self.republish_in_flight
  }
}

/// Applies queued destroy requests to their surfaces.
///
/// For each accepted request: carve the collision set synchronously,
/// record the erase stamp for the visual layer, then queue a rerender
/// and a mask republish. Requests against surfaces that are not yet
/// ready are rejected back to the caller; that is a caller-ordering
/// bug, not something to silently swallow.
pub fn apply_destroy_requests(
  mut requests: MessageReader<DestroyTerrain>,
  mut rejections: MessageWriter<DestroyRejected>,
  mut surfaces: Query<(&mut DestructibleSurface, &mut RenderSync)>,
  config: Res<DestructibleConfig>,
) {
  for request in requests.read() {
    let Ok((mut surface, mut sync)) = surfaces.get_mut(request.surface) else {
      warn!("destroy request for unknown surface {:?}", request.surface);
      continue;
    };

    match surface.carve(&request.polygon, &config) {
      Ok(()) => {
        sync.pending_erases.push(request.erase.clone());
        sync.request_rerender();
        sync.request_mask_republish();
      }
      Err(reason) => {
        warn!("rejected destroy on {:?}: {}", request.surface, reason);
        rejections.write(DestroyRejected {
          surface: request.surface,
          reason,
        });
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn republish_requests_coalesce() {
    let mut sync = RenderSync::default();

    sync.request_mask_republish();
    sync.request_mask_republish();
    sync.request_mask_republish();
    assert!(sync.republish_ready());

    // Scheduling consumes the queue and marks the readback in flight;
    // further requests queue but cannot double-schedule.
    sync.republish_queued = false;
    sync.republish_in_flight = true;
    sync.request_mask_republish();
    assert!(!sync.republish_ready());

    // The readback fired: the next request schedules fresh.
    sync.republish_in_flight = false;
    assert!(sync.republish_ready());
  }

  #[test]
  fn rerender_is_idempotent_within_a_frame() {
    let mut sync = RenderSync::default();
    sync.request_rerender();
    sync.request_rerender();
    assert!(sync.rerender_queued);
  }
}
