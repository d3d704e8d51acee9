//! Mutation validator: turns a proposed field update into either an accepted
//! [`ChangeEvent`] or a CAS conflict.
//!
//! The validator never retries. Re-validating needs the caller's fresh view of
//! the current value, which only the caller can obtain.

#[cfg(test)]
mod validator_test;

use std::sync::Arc;

use tracing::trace;

use crate::metrics::FieldCounters;
use crate::time::monotonic_nanos;
use crate::ChangeEvent;
use crate::FieldRegistry;
use crate::Result;
use crate::StateStore;

/// Result of validating one mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// CAS succeeded; the event describes the applied change
    Accepted(ChangeEvent),
    /// Expected value was stale; nothing changed and nothing is emitted
    Conflict,
}

impl MutationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, MutationOutcome::Accepted(_))
    }

    pub fn event(&self) -> Option<&ChangeEvent> {
        match self {
            MutationOutcome::Accepted(event) => Some(event),
            MutationOutcome::Conflict => None,
        }
    }

    pub fn into_event(self) -> Option<ChangeEvent> {
        match self {
            MutationOutcome::Accepted(event) => Some(event),
            MutationOutcome::Conflict => None,
        }
    }
}

#[derive(Debug)]
pub struct MutationValidator {
    registry: Arc<FieldRegistry>,
    store: Arc<StateStore>,
    counters: FieldCounters,
}

impl MutationValidator {
    pub fn new(
        registry: Arc<FieldRegistry>,
        store: Arc<StateStore>,
    ) -> Self {
        let counters = FieldCounters::new(&registry);
        Self {
            registry,
            store,
            counters,
        }
    }

    /// Applies `expected -> new` to field `index` if the slot still holds
    /// `expected`.
    ///
    /// # Errors
    /// `TracerError::InvalidField` when `index` is outside the registry.
    pub fn validate_and_apply(
        &self,
        index: u32,
        expected: u32,
        new: u32,
        actor_id: u32,
    ) -> Result<MutationOutcome> {
        let field = self.registry.field(index)?;

        if !self.store.cas_update(index, expected, new)? {
            self.counters.rejected(index);
            trace!(
                field_index = index,
                actor_id,
                expected,
                new,
                "stale expected value, mutation rejected"
            );
            return Ok(MutationOutcome::Conflict);
        }

        self.counters.accepted(index);
        let event = ChangeEvent::new(monotonic_nanos(), actor_id, index, field.name(), expected, new);
        trace!(
            field_index = index,
            actor_id,
            old_value = expected,
            new_value = new,
            "mutation accepted"
        );
        Ok(MutationOutcome::Accepted(event))
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }
}
