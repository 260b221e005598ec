//! Entity identifiers and allocation.
//!
//! An [`EntityId`] packs a 24-bit slot *index* with an 8-bit *generation*.
//! The allocator keeps one generation counter per slot and bumps it every
//! time the slot is destroyed, so a stale handle is detected by comparing
//! generations.
//!
//! Based on the data-oriented entity manager described in
//! <http://bitsquid.blogspot.com/2014/08/building-data-oriented-entity-system.html>.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::destroy::{DestroyCallbacks, SubscriberId};

/// Number of bits used for the slot index.
pub const INDEX_BITS: u32 = 24;
/// Number of bits used for the generation counter.
pub const GENERATION_BITS: u32 = 8;
/// Number of addressable slots.
pub const MAX_INDICES: usize = 1 << INDEX_BITS;

const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;

/// A destroyed index is only handed out again once more than this many
/// indices are waiting in the free queue.
pub const MINIMUM_FREE_INDICES: usize = 1024;

/// A generational unit identifier.
///
/// Layout: `[generation: u8 | index: u24]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    fn new(index: u32, generation: u8) -> Self {
        debug_assert!(index <= INDEX_MASK);
        Self(index | (u32::from(generation) << INDEX_BITS))
    }

    /// Reconstruct an id from its packed `u32` form.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Packed `u32` representation.
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// The slot index (low 24 bits).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 & INDEX_MASK
    }

    /// The generation (high 8 bits).
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u8 {
        (self.0 >> INDEX_BITS) as u8
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

/// Something that spawns empty units and decides their ids itself,
/// typically a world that owns an [`EntityAllocator`] and sets up per-unit
/// state alongside the allocation.
pub trait UnitSpawner {
    /// Spawn an empty unit and return its id.
    fn spawn_empty_unit(&mut self) -> EntityId;
}

/// Allocates and recycles [`EntityId`]s with generational tracking.
///
/// Not internally synchronised; owned by the simulation thread.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Current generation of every slot ever handed out.
    generations: Vec<u8>,
    /// Destroyed indices, oldest first.
    free_indices: VecDeque<u32>,
    destroy_callbacks: DestroyCallbacks,
}

impl EntityAllocator {
    /// Create an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_indices: VecDeque::new(),
            destroy_callbacks: DestroyCallbacks::new(),
        }
    }

    /// Allocate an id.
    ///
    /// The oldest free index is recycled only when more than
    /// [`MINIMUM_FREE_INDICES`] are queued; otherwise a new slot is appended
    /// with generation 0.
    ///
    /// # Panics
    ///
    /// Panics when all `2^24` indices are in use.
    pub fn create(&mut self) -> EntityId {
        let index = if self.free_indices.len() > MINIMUM_FREE_INDICES {
            // Length check above guarantees a front element.
            self.free_indices.pop_front().unwrap_or_default()
        } else {
            assert!(
                self.generations.len() < MAX_INDICES,
                "entity index space exhausted ({MAX_INDICES} indices)"
            );
            self.generations.push(0);
            (self.generations.len() - 1) as u32
        };

        EntityId::new(index, self.generations[index as usize])
    }

    /// Spawn a unit through `world`, which picks the id.
    pub fn create_in<W: UnitSpawner + ?Sized>(world: &mut W) -> EntityId {
        world.spawn_empty_unit()
    }

    /// Returns `true` if `id` still refers to a live unit.
    #[must_use]
    pub fn alive(&self, id: EntityId) -> bool {
        self.generations
            .get(id.index() as usize)
            .is_some_and(|&generation| generation == id.generation())
    }

    /// Destroy `id` and notify every destroy subscriber.
    ///
    /// The id is dead before the first callback runs, so callbacks only get
    /// it for identification.
    pub fn destroy(&mut self, id: EntityId) {
        debug_assert!(self.alive(id), "destroying dead unit {id}");

        let index = id.index();
        let slot = &mut self.generations[index as usize];
        *slot = slot.wrapping_add(1);
        self.free_indices.push_back(index);
        trace!(%id, free = self.free_indices.len(), "unit destroyed");

        self.destroy_callbacks.trigger(id);
    }

    /// Subscribe `callback` to unit destruction under `subscriber`.
    pub fn register_destroy_function<F>(&mut self, subscriber: SubscriberId, callback: F)
    where
        F: FnMut(EntityId) + Send + 'static,
    {
        self.destroy_callbacks.register(subscriber, callback);
    }

    /// Drop the subscription owned by `subscriber`.
    ///
    /// # Panics
    ///
    /// Panics if `subscriber` never registered.
    pub fn unregister_destroy_function(&mut self, subscriber: SubscriberId) {
        self.destroy_callbacks.unregister(subscriber);
    }

    /// Number of slots ever allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    /// Returns `true` if no slot was ever allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Number of destroyed indices waiting for reuse.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free_indices.len()
    }
}
