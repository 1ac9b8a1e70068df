// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generational slot storage with explicit ownership tokens.
//!
//! Every execution context lives in an [`Arena`]. Inserting a value hands back a
//! [`ContextHandle`] (a weak, copyable address) together with a [`Retain`] token.
//! The token is the single proof of ownership: the slot stays alive until the token
//! is passed back to [`Arena::release`]. Handles outliving the token stop resolving.
//!
//! A slot can also be *checked out* with [`Arena::take`] while its value is being
//! driven elsewhere, then put back with [`Arena::restore`]. Releasing a checked-out
//! slot is allowed; the value is dropped when it comes back.

use crate::ids::ContextHandle;

enum SlotState<T> {
    Vacant,
    Occupied(T),
    CheckedOut,
}

struct Slot<T> {
    generation: u32,
    state: SlotState<T>,
}

/// The ownership token of an arena slot.
///
/// It cannot be cloned or forged; exactly one holder is responsible for handing it
/// back to [`Arena::release`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a Retain that is never released keeps its slot alive until the arena is dropped"]
pub struct Retain {
    handle: ContextHandle,
}

impl Retain {
    /// The handle of the slot this token owns.
    pub fn handle(&self) -> ContextHandle {
        self.handle
    }
}

/// A dense, generation-checked store of values addressed by [`ContextHandle`].
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    /// Indices available for reuse, enabling O(1) allocation after a release.
    free: Vec<u32>,
    live: usize,
}

impl<T> Arena<T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Stores a value and returns its handle plus the token owning it.
    ///
    /// Recycled slots get their generation incremented so older handles to the
    /// same index become invalid.
    pub fn insert(&mut self, value: T) -> (ContextHandle, Retain) {
        let handle = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.state = SlotState::Occupied(value);
            ContextHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                state: SlotState::Occupied(value),
            });
            ContextHandle {
                index,
                generation: 0,
            }
        };
        self.live += 1;
        (handle, Retain { handle })
    }

    /// Releases the slot owned by `token`.
    ///
    /// Returns the stored value when it was resident. A checked-out value is
    /// dropped later by [`restore`](Self::restore).
    pub fn release(&mut self, token: Retain) -> Option<T> {
        let handle = token.handle;
        let Some(slot) = self.slot_mut(handle) else {
            log::debug!("Arena: release of stale handle {handle} ignored");
            return None;
        };
        let previous = std::mem::replace(&mut slot.state, SlotState::Vacant);
        match previous {
            SlotState::Vacant => None,
            SlotState::Occupied(value) => {
                self.free.push(handle.index);
                self.live -= 1;
                Some(value)
            }
            SlotState::CheckedOut => {
                self.free.push(handle.index);
                self.live -= 1;
                None
            }
        }
    }

    /// Returns a shared reference to a resident value.
    pub fn get(&self, handle: ContextHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        match &slot.state {
            SlotState::Occupied(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to a resident value.
    pub fn get_mut(&mut self, handle: ContextHandle) -> Option<&mut T> {
        match &mut self.slot_mut(handle)?.state {
            SlotState::Occupied(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` while the slot is owned, whether resident or checked out.
    pub fn is_live(&self, handle: ContextHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .map(|slot| {
                slot.generation == handle.generation && !matches!(slot.state, SlotState::Vacant)
            })
            .unwrap_or(false)
    }

    /// Moves a resident value out of its slot, leaving the slot checked out.
    pub fn take(&mut self, handle: ContextHandle) -> Option<T> {
        let slot = self.slot_mut(handle)?;
        if !matches!(slot.state, SlotState::Occupied(_)) {
            return None;
        }
        match std::mem::replace(&mut slot.state, SlotState::CheckedOut) {
            SlotState::Occupied(value) => Some(value),
            _ => None,
        }
    }

    /// Puts a checked-out value back.
    ///
    /// Returns `false` (and drops `value`) when the slot was released meanwhile.
    pub fn restore(&mut self, handle: ContextHandle, value: T) -> bool {
        match self.slot_mut(handle) {
            Some(slot) if matches!(slot.state, SlotState::CheckedOut) => {
                slot.state = SlotState::Occupied(value);
                true
            }
            _ => false,
        }
    }

    /// Returns the number of owned slots.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no slot is owned.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn slot_mut(&mut self, handle: ContextHandle) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
