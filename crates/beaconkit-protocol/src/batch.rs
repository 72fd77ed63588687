//! Immutable batches of events, the unit the transport layer actually sends.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// An immutable group of events assembled by the queue for a single send.
///
/// The `events` field is private and exposed only through [`Batch::events`]
/// so that once a batch is constructed it cannot be mutated by a caller
/// holding a reference — the queue and the transmitter must agree on exactly
/// what was sent, which matters when a send fails and the caller needs to
/// requeue precisely this set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Unique id for this batch, independent of its events' ids.
    pub batch_id: Uuid,
    /// Milliseconds since the Unix epoch when the batch was assembled.
    pub timestamp: i64,
    events: Vec<Event>,
}

impl Batch {
    /// Assemble a new batch from `events`, stamped with `timestamp_ms`.
    pub fn new(events: Vec<Event>, timestamp_ms: i64) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            timestamp: timestamp_ms,
            events,
        }
    }

    /// The events in this batch, in the order they were queued.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events in this batch.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` if this batch carries no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consume the batch, returning its events.
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}
