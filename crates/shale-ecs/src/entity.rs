//! Entity handles.
//!
//! Component columns in the store are keyed by a bare `u32` index, so a
//! handle has to carry more than the index to be safe across despawns: an
//! [`EntityId`] pairs the index with the generation the slot had when the
//! entity was spawned. Despawning bumps the slot's generation, which
//! retires every handle minted for the old occupant at once. Blueprint
//! documents and collision records can therefore hold ids across ticks
//! without ever resolving to a recycled entity.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Handle to an entity: slot index plus the generation it was minted at.
///
/// Packed as `generation << 32 | index` so ids within one generation sort
/// in index order, the order column snapshots are returned in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The column key: which slot this entity occupies.
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// Which occupancy of the slot this handle refers to.
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    occupied: bool,
}

/// Hands out slot indices and tracks which handle generation is current.
///
/// Freed slots go to the back of a queue and are reused oldest-first, so a
/// spawn/despawn churn point cycles through many slots instead of minting
/// ever-higher generations on one.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    slots: Vec<Slot>,
    free: VecDeque<u32>,
    occupied: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a handle for a free slot, growing the table when none is free.
    pub fn allocate(&mut self) -> EntityId {
        self.occupied += 1;
        match self.free.pop_front() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.occupied = true;
                EntityId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, occupied: true });
                EntityId::new(index, 0)
            }
        }
    }

    /// Free the entity's slot and retire its generation.
    ///
    /// Returns `false` without changing anything if the handle is stale or
    /// the slot is already free.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index() as usize) else {
            return false;
        };
        if !slot.occupied || slot.generation != id.generation() {
            return false;
        }
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push_back(id.index());
        self.occupied -= 1;
        true
    }

    /// Whether the handle still names the slot's current occupant.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index() as usize)
            .is_some_and(|slot| slot.occupied && slot.generation == id.generation())
    }

    /// The generation a handle for `index` would carry right now.
    ///
    /// The store uses this to turn bare column keys back into full handles
    /// when walking a column. Unknown indices report generation 0.
    pub fn current_generation(&self, index: u32) -> u32 {
        self.slots
            .get(index as usize)
            .map_or(0, |slot| slot.generation)
    }

    pub fn alive_count(&self) -> usize {
        self.occupied
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
