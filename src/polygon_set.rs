//! Arena storage for a surface's collision polygons.
//!
//! Slots have stable indices across rebuilds: the rebuilder replaces a
//! polygon in place, appends new islands into fresh slots, and frees
//! fully-consumed slots. Downstream consumers (physics sync) key off the
//! slot index plus a per-slot version instead of positional references.

use bevy::math::Vec2;

use crate::geom;

/// One stored collision polygon: a simple, counter-clockwise ring with
/// at least 3 vertices.
#[derive(Clone, Debug)]
pub struct CollisionPolygon {
  pub points: Vec<Vec2>,
}

impl CollisionPolygon {
  /// Absolute area of the polygon.
  pub fn area(&self) -> f32 {
    geom::area(&self.points)
  }
}

/// An occupied slot in the arena.
#[derive(Clone, Debug)]
pub struct PolygonSlot {
  pub polygon: CollisionPolygon,
  /// Bumped every time the slot's polygon is replaced in place. A
  /// (slot index, version) pair uniquely identifies one polygon value.
  pub version: u64,
}

/// Arena of collision polygons with stable slot indices.
#[derive(Default, Debug)]
pub struct PolygonSet {
  slots: Vec<Option<PolygonSlot>>,
  /// Bumped on every mutation; cheap change detection for sync systems.
  generation: u64,
}

impl PolygonSet {
  /// Builds a set from initial polygons, discarding degenerate entries.
  pub fn from_polygons(polygons: impl IntoIterator<Item = Vec<Vec2>>) -> Self {
    let mut set = Self::default();
    for points in polygons {
      set.append(points);
    }
    set
  }

  /// Current mutation generation.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Number of stored polygons.
  pub fn len(&self) -> usize {
    self.slots.iter().filter(|s| s.is_some()).count()
  }

  /// Returns true if no polygons are stored.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Number of slots ever allocated, including freed ones.
  pub fn slot_capacity(&self) -> usize {
    self.slots.len()
  }

  /// Returns the slot at `index`, if occupied.
  pub fn get(&self, index: usize) -> Option<&PolygonSlot> {
    self.slots.get(index).and_then(|s| s.as_ref())
  }

  /// Iterates occupied slots as `(index, slot)` pairs.
  pub fn iter(&self) -> impl Iterator<Item = (usize, &PolygonSlot)> {
    self
      .slots
      .iter()
      .enumerate()
      .filter_map(|(i, s)| s.as_ref().map(|slot| (i, slot)))
  }

  /// Indices of all occupied slots.
  pub fn occupied_indices(&self) -> Vec<usize> {
    self.iter().map(|(i, _)| i).collect()
  }

  /// Sum of all stored polygon areas.
  pub fn total_area(&self) -> f32 {
    self.iter().map(|(_, slot)| slot.polygon.area()).sum()
  }

  /// Appends a polygon into a fresh slot, returning its index.
  ///
  /// Degenerate rings (< 3 vertices) are never stored; `None` is
  /// returned and the set is unchanged.
  pub fn append(&mut self, points: Vec<Vec2>) -> Option<usize> {
    if points.len() < 3 {
      return None;
    }

    let index = self.slots.len();
    self.slots.push(Some(PolygonSlot {
      polygon: CollisionPolygon { points },
      version: 0,
    }));
    self.generation += 1;
    Some(index)
  }

  /// Replaces the polygon at `index` in place, bumping the slot version.
  ///
  /// A degenerate replacement removes the slot instead.
  pub fn replace(&mut self, index: usize, points: Vec<Vec2>) {
    if points.len() < 3 {
      self.remove(index);
      return;
    }

    if let Some(slot) = self.slots.get_mut(index).and_then(|s| s.as_mut()) {
      slot.polygon = CollisionPolygon { points };
      slot.version += 1;
      self.generation += 1;
    }
  }

  /// Frees the slot at `index`.
  pub fn remove(&mut self, index: usize) {
    if let Some(slot) = self.slots.get_mut(index) {
      if slot.take().is_some() {
        self.generation += 1;
      }
    }
  }
}
