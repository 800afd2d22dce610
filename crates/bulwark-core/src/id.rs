//! Object identifiers and allocation.
//!
//! An [`ObjectId`] is a 64-bit handle that packs a *generation* counter in the
//! high 32 bits and a *slot* in the low 32 bits. The generation is bumped every
//! time a slot is released, so a handle kept past [`World::dispose`] can never
//! alias a newer object that reuses the slot.
//!
//! [`World::dispose`]: crate::world::World::dispose

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// ObjectId
// ---------------------------------------------------------------------------

/// A generational game-object identifier.
///
/// Layout: `[generation: u32 | slot: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Construct an `ObjectId` from a slot and generation.
    #[inline]
    pub fn new(slot: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | slot as u64)
    }

    /// The slot portion (low 32 bits).
    #[inline]
    pub fn slot(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}v{})", self.slot(), self.generation())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// ObjectAllocator
// ---------------------------------------------------------------------------

/// Allocates and recycles [`ObjectId`]s with generational tracking.
///
/// Free slots are kept in a FIFO queue so that generations are spread out over
/// time rather than concentrated on a hot slot. Pooled projectiles keep their
/// id while parked, so only disposal returns a slot here.
#[derive(Debug, Default)]
pub struct ObjectAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_slots: VecDeque<u32>,
}

impl ObjectAllocator {
    /// Create a new, empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh [`ObjectId`], reusing a released slot when one is
    /// available.
    pub fn allocate(&mut self) -> ObjectId {
        if let Some(slot) = self.free_slots.pop_front() {
            // Generation was already bumped on release.
            self.alive[slot as usize] = true;
            ObjectId::new(slot, self.generations[slot as usize])
        } else {
            let slot = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            ObjectId::new(slot, 0)
        }
    }

    /// Release an id so its slot can be reused.
    ///
    /// Returns `false` if the id was already released or is stale.
    pub fn release(&mut self, id: ObjectId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let slot = id.slot() as usize;
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free_slots.push_back(id.slot());
        true
    }

    /// Whether `id` refers to an allocated slot with a matching generation.
    pub fn is_alive(&self, id: ObjectId) -> bool {
        let slot = id.slot() as usize;
        slot < self.generations.len()
            && self.alive[slot]
            && self.generations[slot] == id.generation()
    }

    /// Number of currently allocated ids.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_unique_ids() {
        let mut alloc = ObjectAllocator::new();
        let ids: Vec<ObjectId> = (0..64).map(|_| alloc.allocate()).collect();
        let mut slots: Vec<u32> = ids.iter().map(|id| id.slot()).collect();
        slots.sort();
        slots.dedup();
        assert_eq!(slots.len(), 64);
    }

    #[test]
    fn generation_increments_on_reuse() {
        let mut alloc = ObjectAllocator::new();
        let first = alloc.allocate();
        assert!(alloc.release(first));
        let second = alloc.allocate();
        assert_eq!(second.slot(), first.slot());
        assert_eq!(second.generation(), 1);
        assert!(!alloc.is_alive(first), "old handle must stay stale");
    }

    #[test]
    fn double_release_returns_false() {
        let mut alloc = ObjectAllocator::new();
        let id = alloc.allocate();
        assert!(alloc.release(id));
        assert!(!alloc.release(id));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn raw_roundtrip_and_display() {
        let id = ObjectId::new(42, 7);
        assert_eq!(ObjectId::from_raw(id.to_raw()), id);
        assert_eq!(id.to_string(), "42v7");
    }
}
