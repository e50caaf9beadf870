//! Generation-checked handle registry.
//!
//! Objects crossing the boundary are owned by a [`Registry`] and referred to
//! by [`Handle`] tokens: a slot index plus the generation the slot had when
//! the object was inserted. Removing an object bumps its slot's generation,
//! so a token kept past release goes stale instead of dangling. Stale tokens
//! are rejected with an `InvalidArgument` error on every operation, release
//! included; double-release and use-after-release are detectable failures
//! rather than undefined behavior.
//!
//! Tokens are `Copy` and typed by a phantom marker, so a wallet handle cannot
//! be passed where a config handle is expected.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{Error, Result};

/// Boundary token for one registry entry.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation, _marker: PhantomData }
    }
}

// Manual impls keep Handle<T> copyable for any T.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slotted arena with per-slot generations. Freed slots are reused; their
/// generation is bumped on removal so old tokens never resolve again.
pub struct Registry<T> {
    label: &'static str,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Registry<T> {
    pub fn new(label: &'static str) -> Self {
        Self { label, slots: Vec::new(), free: Vec::new() }
    }

    pub fn insert(&mut self, value: T) -> Handle<T> {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(value);
                Handle::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, value: Some(value) });
                Handle::new(index, 0)
            }
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Result<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
            .ok_or_else(|| Error::stale_handle(self.label))
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T> {
        let label = self.label;
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
            .ok_or_else(|| Error::stale_handle(label))
    }

    /// Remove the entry and invalidate every outstanding copy of its token.
    pub fn remove(&mut self, handle: Handle<T>) -> Result<T> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or_else(|| Error::stale_handle(self.label))?;
        let value = slot.value.take().ok_or_else(|| Error::stale_handle(self.label))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
