//! Shared schedule labels for the destruction pipeline.
//!
//! All systems run in [`Update`] within one of the chained
//! [`DestructibleSet`] phases. External consumers can order their own
//! systems relative to these sets.

use bevy::prelude::*;

/// System sets for the destruction update loop, chained in order:
///
/// ```text
/// ApplyDestroys → DriveRender → SyncPhysics
/// ```
///
/// Destroy requests mutate collision synchronously in `ApplyDestroys`;
/// `DriveRender` turns the queued flags into a render-once pass and a
/// coalesced mask readback; `SyncPhysics` mirrors the polygon set into
/// the physics container. Because the phases are chained, a republish
/// scheduled this frame always waits on a render pass that already
/// includes this frame's rerender requests.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DestructibleSet {
  /// Destroy message handling and collision rebuild.
  ApplyDestroys,
  /// Mask camera activation, erase stamps, readback scheduling.
  DriveRender,
  /// Collider add/remove against the physics container.
  SyncPhysics,
}
