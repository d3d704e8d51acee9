use std::cell::Cell;
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::RecvTimeoutError;
use crossbeam_channel::TryRecvError;

use crate::ChangeEvent;

/// Consumer end of the event channel.
///
/// Yields accepted mutations in publish order, at most once each. Iteration
/// blocks until the next event arrives and ends once the tracer has shut
/// down and every in-flight event has been drained.
#[derive(Debug)]
pub struct EventStream {
    receiver: Receiver<ChangeEvent>,
    finished: Cell<bool>,
}

impl EventStream {
    pub(crate) fn new(receiver: Receiver<ChangeEvent>) -> Self {
        Self {
            receiver,
            finished: Cell::new(false),
        }
    }

    /// Returns the next buffered event without waiting.
    pub fn try_next(&self) -> Option<ChangeEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished.set(true);
                None
            }
        }
    }

    /// Waits at most `timeout` for the next event. `None` means either the
    /// wait elapsed or the stream ended; use [`Self::is_finished`] to tell
    /// them apart.
    pub fn next_timeout(
        &self,
        timeout: Duration,
    ) -> Option<ChangeEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.finished.set(true);
                None
            }
        }
    }

    /// Drains every event currently buffered. Marks the stream finished when
    /// the producer side is gone and nothing is left.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        let mut events = Vec::with_capacity(self.receiver.len());
        while let Some(event) = self.try_next() {
            events.push(event);
        }
        events
    }

    /// Number of events waiting to be read.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// True once a read observed that the producer side is gone and the
    /// buffer is exhausted.
    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }
}

impl Iterator for EventStream {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.receiver.recv().ok();
        if event.is_none() {
            self.finished.set(true);
        }
        event
    }
}
