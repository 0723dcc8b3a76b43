//! Packed store + handle table (C1), generic over one tier's element type.
//!
//! One `TierStore<T, E>` backs each of atoms, links, and faces. It owns the tight-packed vector
//! of live elements, the handle table (slot -> live index or free-list link), the reverse map
//! (live index -> slot) needed to repair the handle table after a swap-with-last removal, and the
//! tier's [`PropertyRegistry`] of user-defined side tables, which it keeps resized and
//! move/destroyed in lock-step with the packed vector.

use crate::config::GROWTH_FLOOR;
use crate::error::{Error, Result};
use crate::handle::{Handle, Tier};
use crate::property::PropertyRegistry;

enum SlotState {
    Free { next_free: Option<u32> },
    Allocated { index: u32 },
}

struct SlotEntry {
    counter: u32,
    state: SlotState,
}

pub struct TierStore<T: Tier, E> {
    elements: Vec<E>,
    /// index -> slot, so compaction can repair the handle table entry of whatever gets moved.
    reverse_map: Vec<u32>,
    slots: Vec<SlotEntry>,
    free_head: Option<u32>,
    properties: PropertyRegistry,
}

impl<T: Tier, E> TierStore<T, E> {
    pub fn new(initial_capacity: usize) -> Self {
        let mut store = Self {
            elements: Vec::new(),
            reverse_map: Vec::new(),
            slots: Vec::new(),
            free_head: None,
            properties: PropertyRegistry::new(),
        };
        if initial_capacity > 0 {
            store.reserve(initial_capacity).expect(
                "initial capacity for a freshly created tier cannot exceed its slot width",
            );
        }
        store
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn properties(&self) -> &PropertyRegistry {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyRegistry {
        &mut self.properties
    }

    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [E] {
        &mut self.elements
    }

    /// Grow the slot table so at least `min_capacity` slots exist, without touching the packed
    /// vector or any property table (those only change size on `create`/`remove`/`compact`).
    pub fn reserve(&mut self, min_capacity: usize) -> Result<()> {
        let max_capacity = Handle::<T>::MAX_SLOT as usize + 1;
        if min_capacity <= self.slots.len() {
            return Ok(());
        }
        if self.slots.len() >= max_capacity {
            return Err(Error::BufferOverflow {
                tier: T::ERROR_TIER,
            });
        }
        let new_capacity = min_capacity.min(max_capacity);
        for slot in self.slots.len()..new_capacity {
            self.slots.push(SlotEntry {
                counter: 0,
                state: SlotState::Free {
                    next_free: self.free_head,
                },
            });
            self.free_head = Some(slot as u32);
        }
        log::trace!(
            "{} tier grew capacity to {}",
            T::ERROR_TIER,
            self.slots.len()
        );
        Ok(())
    }

    fn grow_for_insert(&mut self) -> Result<()> {
        let old_capacity = self.slots.len();
        let max_capacity = Handle::<T>::MAX_SLOT as usize + 1;
        if old_capacity >= max_capacity {
            return Err(Error::BufferOverflow {
                tier: T::ERROR_TIER,
            });
        }
        let increment = old_capacity.max(GROWTH_FLOOR);
        let new_capacity = old_capacity.saturating_add(increment).min(max_capacity);
        self.reserve(new_capacity.max(old_capacity + 1))
    }

    fn resolve(&self, handle: Handle<T>) -> Result<usize> {
        let slot = handle.slot() as usize;
        let entry = self
            .slots
            .get(slot)
            .ok_or_else(|| self.invalid_handle(handle, "slot out of range"))?;
        match entry.state {
            SlotState::Allocated { index } if entry.counter == handle.counter() => {
                Ok(index as usize)
            }
            SlotState::Allocated { .. } => {
                Err(self.invalid_handle(handle, "stale generation counter"))
            }
            SlotState::Free { .. } => Err(self.invalid_handle(handle, "slot is not allocated")),
        }
    }

    fn invalid_handle(&self, handle: Handle<T>, reason: &'static str) -> Error {
        Error::InvalidHandle {
            tier: T::ERROR_TIER,
            slot: handle.slot() as u64,
            reason,
        }
    }

    /// Allocate a new slot holding `value`, growing the tier if it is full.
    pub fn create(&mut self, value: E) -> Result<(Handle<T>, usize)> {
        if self.free_head.is_none() {
            self.grow_for_insert()?;
        }
        let slot = self.free_head.expect("grow_for_insert ensured a free slot");
        let counter = match self.slots[slot as usize].state {
            SlotState::Free { next_free } => {
                self.free_head = next_free;
                self.slots[slot as usize].counter
            }
            SlotState::Allocated { .. } => unreachable!("free list pointed at a live slot"),
        };
        let index = self.elements.len();
        self.slots[slot as usize].state = SlotState::Allocated {
            index: index as u32,
        };
        self.elements.push(value);
        self.reverse_map.push(slot);
        self.properties.resize_all(self.elements.len());
        Ok((Handle::pack(slot, counter), index))
    }

    pub fn get(&self, handle: Handle<T>) -> Result<&E> {
        let index = self.resolve(handle)?;
        Ok(&self.elements[index])
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut E> {
        let index = self.resolve(handle)?;
        Ok(&mut self.elements[index])
    }

    pub fn is_valid(&self, handle: Handle<T>) -> bool {
        self.resolve(handle).is_ok()
    }

    pub fn index_of(&self, handle: Handle<T>) -> Result<usize> {
        self.resolve(handle)
    }

    pub fn handle_at(&self, index: usize) -> Result<Handle<T>> {
        let slot = *self
            .reverse_map
            .get(index)
            .ok_or(Error::InvalidIndex {
                tier: T::ERROR_TIER,
                index,
                size: self.elements.len(),
            })?;
        Ok(Handle::pack(slot, self.slots[slot as usize].counter))
    }

    fn release_slot_for_index(&mut self, index: usize) {
        let slot = self.reverse_map[index] as usize;
        let max_counter = Handle::<T>::MAX_COUNTER as u32;
        let next_free = self.free_head;
        let entry = &mut self.slots[slot];
        entry.counter = if entry.counter >= max_counter {
            0
        } else {
            entry.counter + 1
        };
        entry.state = SlotState::Free { next_free };
        self.free_head = Some(slot as u32);
    }

    /// Swap-with-last removal of the live element at `index`, repairing the handle table, the
    /// reverse map, and every property table in lock-step. Returns the removed element.
    fn remove_at(&mut self, index: usize) -> E {
        let last = self.elements.len() - 1;
        self.release_slot_for_index(index);
        if index != last {
            self.reverse_map.swap(index, last);
            let moved_slot = self.reverse_map[index];
            if let SlotState::Allocated { index: slot_index } =
                &mut self.slots[moved_slot as usize].state
            {
                *slot_index = index as u32;
            }
            self.properties.move_all(last, index);
        }
        self.reverse_map.pop();
        self.properties.truncate_all(last);
        self.elements.swap_remove(index)
    }

    /// Remove the element referenced by `handle`, if it is still live. A stale or
    /// out-of-range handle is a silent no-op, per contract.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<E> {
        let index = self.resolve(handle).ok()?;
        Some(self.remove_at(index))
    }

    /// Remove every element whose slot in `flags` (indexed by *current* packed index) is
    /// `true`, by repeated tail-swap removal from the back. This realizes the same two-pass
    /// filter-then-compact contract as a single left/right sweep (every flagged element is
    /// dropped, every unflagged element survives with its property values intact) without
    /// guaranteeing the same final ordering of survivors, which the public contract does not
    /// promise either way.
    pub fn compact(&mut self, flags: &[bool]) {
        debug_assert_eq!(flags.len(), self.elements.len());
        for index in (0..flags.len()).rev() {
            if flags[index] {
                self.remove_at(index);
            }
        }
    }

    /// Reset to empty, then reserve exactly `capacity` slots (0 = lazy).
    pub fn clear(&mut self, capacity: usize) {
        self.elements.clear();
        self.reverse_map.clear();
        self.slots.clear();
        self.free_head = None;
        self.properties.resize_all(0);
        if capacity > 0 {
            self.reserve(capacity).expect(
                "clear() capacity request cannot legitimately exceed this tier's slot width",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct TinyTier;
    impl Tier for TinyTier {
        const SLOT_BITS: u32 = 2;
        const ERROR_TIER: crate::error::Tier = crate::error::Tier::Atom;
    }

    type TinyStore = TierStore<TinyTier, i32>;

    #[test]
    fn create_get_remove_roundtrip() {
        let mut store: TinyStore = TierStore::new(0);
        let (h, idx) = store.create(42).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(*store.get(h).unwrap(), 42);
        assert!(store.is_valid(h));
        assert_eq!(store.remove(h), Some(42));
        assert!(!store.is_valid(h));
        assert!(store.get(h).is_err());
    }

    #[test]
    fn removed_handle_never_resolves_again() {
        let mut store: TinyStore = TierStore::new(0);
        let (h1, _) = store.create(1).unwrap();
        store.remove(h1);
        let (h2, _) = store.create(2).unwrap();
        assert_eq!(h1.slot(), h2.slot());
        assert_ne!(h1, h2);
        assert!(store.get(h1).is_err());
        assert_eq!(*store.get(h2).unwrap(), 2);
    }

    #[test]
    fn swap_with_last_repairs_moved_handle() {
        let mut store: TinyStore = TierStore::new(0);
        let (h0, _) = store.create(10).unwrap();
        let (h1, _) = store.create(11).unwrap();
        let (h2, _) = store.create(12).unwrap();
        store.remove(h0);
        // h2 (last) should now be findable wherever it landed.
        assert_eq!(*store.get(h1).unwrap(), 11);
        assert_eq!(*store.get(h2).unwrap(), 12);
        assert_eq!(store.size(), 2);
    }

    #[test]
    fn buffer_overflow_when_slot_space_exhausted() {
        let mut store: TinyStore = TierStore::new(0);
        // TinyTier has 2 slot bits => 4 usable slots.
        for i in 0..4 {
            store.create(i).unwrap();
        }
        assert!(matches!(
            store.create(99),
            Err(Error::BufferOverflow { .. })
        ));
    }

    #[derive(Debug, Clone, Copy)]
    struct TinyCounterTier;
    impl Tier for TinyCounterTier {
        // 62 slot bits (plenty of room), only 2 counter bits so wraparound is cheap to exercise.
        const SLOT_BITS: u32 = 62;
        const ERROR_TIER: crate::error::Tier = crate::error::Tier::Atom;
    }

    #[test]
    fn handle_counter_wraps_without_aliasing_live_handles() {
        let mut store: TierStore<TinyCounterTier, i32> = TierStore::new(1);
        let (h_keep, _) = store.create(1).unwrap();
        let max_counter = Handle::<TinyCounterTier>::MAX_COUNTER;
        assert_eq!(max_counter, 3);
        store.reserve(2).unwrap();
        for i in 0..(max_counter + 5) {
            let (h, _) = store.create(i as i32).unwrap();
            store.remove(h);
        }
        assert!(store.is_valid(h_keep));
    }

    #[test]
    fn compact_drops_flagged_and_keeps_others() {
        let mut store: TinyStore = TierStore::new(0);
        store.reserve(5).unwrap();
        let handles: Vec<_> = (0..4).map(|i| store.create(i).unwrap().0).collect();
        store.compact(&[false, true, false, true]);
        assert_eq!(store.size(), 2);
        assert!(store.is_valid(handles[0]));
        assert!(!store.is_valid(handles[1]));
        assert!(store.is_valid(handles[2]));
        assert!(!store.is_valid(handles[3]));
    }

    #[test]
    fn handle_at_and_index_of_are_inverses() {
        let mut store: TinyStore = TierStore::new(0);
        store.reserve(4).unwrap();
        for i in 0..3 {
            store.create(i).unwrap();
        }
        for i in 0..store.size() {
            let h = store.handle_at(i).unwrap();
            assert_eq!(store.index_of(h).unwrap(), i);
        }
    }
}
