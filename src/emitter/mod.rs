//! Event emitter: hands accepted mutations to an out-of-band consumer.
//!
//! ```text
//! mutation path (many threads)
//!   publish() -> try_send / send_timeout(bounded queue)   [never unbounded]
//!                         │
//!                         ▼
//!                   EventStream (single consumer)
//! ```
//!
//! Tracing is best effort. An event is dropped, and counted, when:
//! - no consumer has attached yet (events are never replayed)
//! - the queue is full, or stays full past the configured bounded wait
//! - the consumer detached
//! - the emitter was closed at shutdown

mod stream;
pub use stream::*;

#[cfg(test)]
mod emitter_test;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use crossbeam_channel::bounded;
use crossbeam_channel::Receiver;
use crossbeam_channel::SendTimeoutError;
use crossbeam_channel::Sender;
use crossbeam_channel::TrySendError;
#[cfg(test)]
use mockall::automock;
use parking_lot::Mutex;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::ChangeEvent;
use crate::ChannelConfig;
use crate::Result;
use crate::TracerError;
use crate::EVENTS_DROPPED;

/// Output side of the tracer. Implementations must never block the caller
/// for an unbounded amount of time.
#[cfg_attr(test, automock)]
pub trait EventSink: Send + Sync + 'static {
    /// Publishes an accepted mutation; failures are absorbed and counted.
    fn publish(
        &self,
        event: ChangeEvent,
    );

    /// Number of events dropped since creation.
    fn dropped_event_count(&self) -> u64;

    /// Stops accepting events. Later publishes count as drops.
    fn close(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    NoConsumer,
    Full,
    Disconnected,
    Closed,
}

/// Bounded-queue [`EventSink`] with a single attachable consumer.
pub struct ChannelEmitter {
    sender: ArcSwapOption<Sender<ChangeEvent>>,
    /// Handed out exactly once through `subscribe`
    receiver: Mutex<Option<Receiver<ChangeEvent>>>,
    consumer_attached: AtomicBool,
    dropped: AtomicU64,
    publish_timeout: Option<Duration>,
    capacity: usize,
}

impl std::fmt::Debug for ChannelEmitter {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ChannelEmitter")
            .field("capacity", &self.capacity)
            .field("publish_timeout", &self.publish_timeout)
            .field("consumer_attached", &self.consumer_attached)
            .field("dropped", &self.dropped)
            .finish_non_exhaustive()
    }
}

impl ChannelEmitter {
    /// Builds the emitter and allocates its buffer.
    ///
    /// # Errors
    /// `Error::InvalidConfig` when `config` fails [`ChannelConfig::validate`].
    pub fn new(config: &ChannelConfig) -> Result<Self> {
        config.validate()?;

        let (sender, receiver) = bounded(config.capacity);
        let publish_timeout = match config.publish_timeout_us {
            0 => None,
            us => Some(Duration::from_micros(us)),
        };

        Ok(Self {
            sender: ArcSwapOption::from_pointee(sender),
            receiver: Mutex::new(Some(receiver)),
            consumer_attached: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            publish_timeout,
            capacity: config.capacity,
        })
    }

    /// Attaches the single consumer. Only events published after this call
    /// are delivered.
    pub fn subscribe(&self) -> Result<EventStream> {
        let receiver = self.receiver.lock().take().ok_or(TracerError::StreamTaken)?;
        self.consumer_attached.store(true, Ordering::Release);
        info!(capacity = self.capacity, "event consumer attached");
        Ok(EventStream::new(receiver))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.sender.load().is_none()
    }

    fn send(
        &self,
        event: ChangeEvent,
    ) -> std::result::Result<(), DropReason> {
        if !self.consumer_attached.load(Ordering::Acquire) {
            return Err(DropReason::NoConsumer);
        }

        let guard = self.sender.load();
        let sender = guard.as_ref().ok_or(DropReason::Closed)?;

        match self.publish_timeout {
            None => sender.try_send(event).map_err(|e| match e {
                TrySendError::Full(_) => DropReason::Full,
                TrySendError::Disconnected(_) => DropReason::Disconnected,
            }),
            Some(timeout) => sender.send_timeout(event, timeout).map_err(|e| match e {
                SendTimeoutError::Timeout(_) => DropReason::Full,
                SendTimeoutError::Disconnected(_) => DropReason::Disconnected,
            }),
        }
    }

    fn record_drop(
        &self,
        event: &ChangeEvent,
        reason: DropReason,
    ) {
        let previous = self.dropped.fetch_add(1, Ordering::Relaxed);
        EVENTS_DROPPED.inc();

        if previous == 0 {
            warn!(?reason, "event channel dropping change events");
        }
        trace!(
            ?reason,
            field_index = event.field_index(),
            actor_id = event.actor_id(),
            "change event dropped"
        );
    }
}

impl EventSink for ChannelEmitter {
    fn publish(
        &self,
        event: ChangeEvent,
    ) {
        if let Err(reason) = self.send(event) {
            self.record_drop(&event, reason);
        }
    }

    fn dropped_event_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn close(&self) {
        if self.sender.swap(None).is_some() {
            info!(
                dropped = self.dropped_event_count(),
                "event channel closed"
            );
        }
    }
}
