//! Shared state table holding the current value of every traced field.
//!
//! Each slot is an `AtomicU32`; `cas_update` is a single
//! `compare_exchange`, so the store needs no lock and concurrent call sites
//! never observe a partially written value.

mod initializer;
pub use initializer::*;

#[cfg(test)]
mod store_test;

use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use crate::FieldRegistry;
use crate::Result;
use crate::TracerError;

#[derive(Debug)]
pub struct StateStore {
    slots: Box<[AtomicU32]>,
}

impl StateStore {
    /// Allocates `field_count` zero-valued slots.
    pub fn new(field_count: u32) -> Self {
        let slots = (0..field_count).map(|_| AtomicU32::new(0)).collect();
        Self { slots }
    }

    pub fn for_registry(registry: &FieldRegistry) -> Self {
        Self::new(registry.field_count())
    }

    pub fn len(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn read(
        &self,
        index: u32,
    ) -> Result<u32> {
        Ok(self.slot(index)?.load(Ordering::Acquire))
    }

    /// Atomically replaces the slot value with `new` if it currently equals
    /// `expected`.
    ///
    /// Returns `Ok(true)` when the swap happened and `Ok(false)` when the slot
    /// held a different value, in which case it is left untouched.
    pub fn cas_update(
        &self,
        index: u32,
        expected: u32,
        new: u32,
    ) -> Result<bool> {
        let slot = self.slot(index)?;
        Ok(slot
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
            .is_ok())
    }

    /// Point-in-time copy of every slot. Slots are read independently; there
    /// is no cross-field consistency.
    pub fn snapshot(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.load(Ordering::Acquire)).collect()
    }

    /// Unconditional write, reserved for the initializer.
    pub(crate) fn reset_slot(
        &self,
        index: u32,
        value: u32,
    ) -> Result<()> {
        self.slot(index)?.store(value, Ordering::Release);
        Ok(())
    }

    fn slot(
        &self,
        index: u32,
    ) -> std::result::Result<&AtomicU32, TracerError> {
        self.slots.get(index as usize).ok_or(TracerError::InvalidField {
            index,
            field_count: self.len(),
        })
    }
}
