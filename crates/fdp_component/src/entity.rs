//! Entity identity and allocation.
//!
//! An [`Entity`] is an (index, generation) pair. The index names a slot in
//! the repository; the generation distinguishes this occupant of the slot
//! from any that came before it. A bare index is never a valid identity on
//! its own — once a slot is freed and reused, stale handles to it fail every
//! alive-check forever.

use serde::{Deserialize, Serialize};

/// An opaque (index, generation) entity handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// The reserved sentinel: index 0, generation 0. Never handed out by
    /// [`EntityAllocator`].
    pub const NULL: Entity = Entity {
        index: 0,
        generation: 0,
    };

    /// Construct an entity from raw parts. Exposed for providers and
    /// translators that reconstruct handles from wire data; ordinary code
    /// obtains entities from an [`EntityAllocator`] or a repository.
    #[must_use]
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index this handle refers to.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// The generation of the slot occupant this handle refers to.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// `true` unless this is [`Entity::NULL`]. Does not check liveness — use
    /// [`EntityAllocator::is_alive`] (or a repository's `is_alive`) for that.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == 0 && self.generation == 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}#{})", self.index, self.generation)
    }
}

/// Allocates entity slots, recycling freed indices with a bumped generation.
///
/// Index 0 is reserved for [`Entity::NULL`] and is never handed out. Slot
/// generations are odd while live, even while free, so `is_alive` is a
/// single comparison against the stored generation.
#[derive(Debug)]
pub struct EntityAllocator {
    /// Generation currently occupying each index (index 0 unused, parity
    /// odd = live).
    generations: Vec<u32>,
    /// Freed indices available for reuse.
    free_list: Vec<u32>,
    /// Count of indices currently live.
    live_count: usize,
}

impl EntityAllocator {
    /// Create an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generations: vec![0],
            free_list: Vec::new(),
            live_count: 0,
        }
    }

    /// Allocate a fresh or recycled entity.
    pub fn allocate(&mut self) -> Entity {
        self.live_count += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.generations[index as usize];
            *slot = slot.wrapping_add(1);
            return Entity::from_parts(index, *slot);
        }
        let index = self.generations.len() as u32;
        self.generations.push(1);
        Entity::from_parts(index, 1)
    }

    /// Free an entity's slot, bumping its generation so existing handles go
    /// stale. Returns `false` if the handle was already stale, already
    /// freed, or null.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = &mut self.generations[entity.index() as usize];
        *slot = slot.wrapping_add(1);
        self.free_list.push(entity.index());
        self.live_count -= 1;
        true
    }

    /// `true` if `entity` is non-null and its generation matches the slot's
    /// current, live occupant.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        if entity.is_null() {
            return false;
        }
        self.generations
            .get(entity.index() as usize)
            .is_some_and(|&g| g == entity.generation() && g % 2 == 1)
    }

    /// Number of currently live entities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live_count
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_distinct_entities() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_ne!(a, b);
        assert!(alloc.is_alive(a));
        assert!(alloc.is_alive(b));
    }

    #[test]
    fn test_null_never_allocated() {
        let mut alloc = EntityAllocator::new();
        for _ in 0..8 {
            assert_ne!(alloc.allocate(), Entity::NULL);
        }
    }

    #[test]
    fn test_free_then_stale_handle_is_dead() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.free(a));
        assert!(!alloc.is_alive(a));
    }

    #[test]
    fn test_recycled_index_gets_new_generation() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        alloc.free(a);
        let b = alloc.allocate();
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(!alloc.is_alive(a));
        assert!(alloc.is_alive(b));
    }

    #[test]
    fn test_double_free_returns_false() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.free(a));
        assert!(!alloc.free(a));
    }

    #[test]
    fn test_live_count_tracks_allocations_and_frees() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let _b = alloc.allocate();
        assert_eq!(alloc.live_count(), 2);
        alloc.free(a);
        assert_eq!(alloc.live_count(), 1);
    }

    #[test]
    fn test_display_shows_index_and_generation() {
        let e = Entity::from_parts(3, 5);
        assert_eq!(format!("{e}"), "Entity(3#5)");
    }

    #[test]
    fn test_null_is_default() {
        assert_eq!(Entity::default(), Entity::NULL);
        assert!(Entity::NULL.is_null());
    }
}
