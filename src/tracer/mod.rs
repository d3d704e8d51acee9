//! Trace entry point and session lifecycle.
//!
//! ```text
//! Uninitialized ──initialize()──▶ Ready ──shutdown()──▶ Shutdown
//!                                 │   ▲
//!               notify_mutation() │   │ accepted / rejected
//!                                 ▼   │
//!                               Validating
//! ```
//!
//! `shutdown()` is also accepted from `Uninitialized`.
//!
//! `Validating` is per call and never stored: any number of call sites may be
//! validating at once while the tracer is `Ready`.


use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::initialize_store;
use crate::ChannelConfig;
use crate::ChannelEmitter;
use crate::EventSink;
use crate::EventStream;
use crate::FieldRegistry;
use crate::MutationOutcome;
use crate::MutationValidator;
use crate::Result;
use crate::StateStore;
use crate::TracerConfig;
use crate::TracerError;
use crate::MUTATIONS_INVALID;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TracerState {
    Uninitialized = 0,
    Ready = 1,
    Shutdown = 2,
}

impl TracerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TracerState::Uninitialized,
            1 => TracerState::Ready,
            _ => TracerState::Shutdown,
        }
    }
}

/// Actor id of the calling process, for call sites that identify mutators by
/// pid.
pub fn current_process_actor() -> u32 {
    std::process::id()
}

/// Process-scoped tracer session.
///
/// Owns the state store for its lifetime and injects it into the validator;
/// nothing here is a global.
pub struct Tracer<S: EventSink = ChannelEmitter> {
    registry: Arc<FieldRegistry>,
    state: AtomicU8,
    /// Released at shutdown; in-flight calls keep their own reference
    session: ArcSwapOption<MutationValidator>,
    sink: Arc<S>,
    /// Serializes initialize/shutdown; never taken on the mutation path
    lifecycle: Mutex<()>,
}

impl<S: EventSink> std::fmt::Debug for Tracer<S> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("state", &self.state())
            .field("field_count", &self.registry.field_count())
            .field("dropped_events", &self.sink.dropped_event_count())
            .finish_non_exhaustive()
    }
}

impl Tracer<ChannelEmitter> {
    /// # Errors
    /// `Error::InvalidConfig` when `channel` fails validation.
    pub fn new(
        registry: FieldRegistry,
        channel: &ChannelConfig,
    ) -> Result<Self> {
        let emitter = ChannelEmitter::new(channel)?;
        Ok(Self::with_sink(registry, Arc::new(emitter)))
    }

    /// Builds a tracer from the field table and channel sections of `config`.
    pub fn from_config(config: &TracerConfig) -> Result<Self> {
        let registry = FieldRegistry::from_specs(&config.fields)?;
        Self::new(registry, &config.channel)
    }

    /// Attaches the event consumer. Allowed once per tracer, before or after
    /// `initialize()`; events accepted before attachment are not replayed.
    pub fn subscribe(&self) -> Result<EventStream> {
        if self.state() == TracerState::Shutdown {
            return Err(TracerError::ShutDown.into());
        }
        self.sink.subscribe()
    }
}

impl<S: EventSink> Tracer<S> {
    /// Creates an uninitialized tracer whose store slots are all zero.
    pub fn with_sink(
        registry: FieldRegistry,
        sink: Arc<S>,
    ) -> Self {
        let registry = Arc::new(registry);
        let store = Arc::new(StateStore::for_registry(&registry));
        let validator = MutationValidator::new(registry.clone(), store);

        Self {
            registry,
            state: AtomicU8::new(TracerState::Uninitialized as u8),
            session: ArcSwapOption::from_pointee(validator),
            sink,
            lifecycle: Mutex::new(()),
        }
    }

    /// Writes every field default into the store and starts accepting
    /// mutations.
    ///
    /// # Errors
    /// - `AlreadyInitialized` on a second call
    /// - `ShutDown` after `shutdown()`
    pub fn initialize(&self) -> Result<()> {
        let _guard = self.lifecycle.lock();

        match self.state() {
            TracerState::Uninitialized => {}
            TracerState::Ready => {
                warn!("initialize() called on a ready tracer");
                return Err(TracerError::AlreadyInitialized.into());
            }
            TracerState::Shutdown => return Err(TracerError::ShutDown.into()),
        }

        let session = self.session.load();
        let validator = session.as_ref().ok_or(TracerError::ShutDown)?;
        initialize_store(validator.store(), &self.registry)?;

        self.state.store(TracerState::Ready as u8, Ordering::Release);
        info!(
            field_count = self.registry.field_count(),
            "tracer initialized"
        );
        Ok(())
    }

    /// Trace entry point for one observed mutation.
    ///
    /// Returns `Ok(true)` when the CAS succeeded and an event was handed to
    /// the sink, `Ok(false)` when `expected_old` was stale. Event delivery
    /// failures never surface here.
    ///
    /// # Errors
    /// - `InvalidField` when `field_index` is outside the registry
    /// - `NotInitialized` before `initialize()`
    /// - `ShutDown` after `shutdown()`
    pub fn notify_mutation(
        &self,
        field_index: u32,
        expected_old: u32,
        new_value: u32,
        actor_id: u32,
    ) -> Result<bool> {
        self.ensure_ready()?;

        let session = self.session.load();
        let validator = session.as_ref().ok_or(TracerError::ShutDown)?;

        match validator.validate_and_apply(field_index, expected_old, new_value, actor_id) {
            Ok(MutationOutcome::Accepted(event)) => {
                self.sink.publish(event);
                Ok(true)
            }
            Ok(MutationOutcome::Conflict) => Ok(false),
            Err(e) => {
                if let Some(TracerError::InvalidField { .. }) = e.as_tracer() {
                    MUTATIONS_INVALID.inc();
                    debug!(field_index, actor_id, "mutation on unknown field");
                }
                Err(e)
            }
        }
    }

    /// Terminal transition. Releases the state store once in-flight calls
    /// finish and ends the event stream. Repeated calls are no-ops.
    pub fn shutdown(&self) {
        let _guard = self.lifecycle.lock();

        if self.state() == TracerState::Shutdown {
            return;
        }
        self.state.store(TracerState::Shutdown as u8, Ordering::Release);
        self.session.store(None);
        self.sink.close();

        info!(
            dropped_events = self.sink.dropped_event_count(),
            "tracer shut down"
        );
    }

    pub fn state(&self) -> TracerState {
        TracerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn dropped_event_count(&self) -> u64 {
        self.sink.dropped_event_count()
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Current value of every field, for observers. Not a basis for
    /// read-then-write: pass the value you believe is current to
    /// `notify_mutation` and let the CAS decide.
    pub fn snapshot(&self) -> Result<Vec<u32>> {
        self.ensure_ready()?;
        let session = self.session.load();
        let validator = session.as_ref().ok_or(TracerError::ShutDown)?;
        Ok(validator.store().snapshot())
    }

    fn ensure_ready(&self) -> std::result::Result<(), TracerError> {
        match self.state() {
            TracerState::Ready => Ok(()),
            TracerState::Uninitialized => Err(TracerError::NotInitialized),
            TracerState::Shutdown => Err(TracerError::ShutDown),
        }
    }
}
