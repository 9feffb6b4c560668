//! Configuration for destructible surfaces.

use bevy::prelude::*;

/// Tuning knobs for mask tracing and collision rebuilding.
#[derive(Resource, Clone, Debug)]
pub struct DestructibleConfig {
  /// Normalized alpha above which a rendered pixel counts as solid
  /// during the initial mask trace. 0.0 means any opacity at all.
  /// Default: 0.0
  pub alpha_threshold: f32,

  /// Douglas-Peucker tolerance in pixels for traced contours.
  /// Higher values produce coarser collision polygons.
  /// Default: 1.0
  pub simplify_tolerance: f32,

  /// Minimum vertex count for a stored collision polygon; clip results
  /// below this are discarded as degenerate fragments.
  /// Default: 3
  pub min_polygon_vertices: usize,

  /// Whether to render collision polygons as debug gizmos.
  /// Default: false
  pub debug_gizmos: bool,
}

impl Default for DestructibleConfig {
  fn default() -> Self {
    Self {
      alpha_threshold: 0.0,
      simplify_tolerance: 1.0,
      min_polygon_vertices: 3,
      debug_gizmos: false,
    }
  }
}

impl DestructibleConfig {
  /// Sets the solid-pixel alpha threshold.
  pub fn with_alpha_threshold(mut self, threshold: f32) -> Self {
    self.alpha_threshold = threshold;
    self
  }

  /// Sets the contour simplification tolerance.
  pub fn with_tolerance(mut self, tolerance: f32) -> Self {
    self.simplify_tolerance = tolerance;
    self
  }

  /// Enables or disables debug gizmo rendering.
  pub fn with_gizmos(mut self, enabled: bool) -> Self {
    self.debug_gizmos = enabled;
    self
  }
}
