//! The event buffer & cache (C6): receives the event stream emitted by C5,
//! retains a bounded in-memory suffix, and batches accepted events to a
//! [`Persister`] for write-ahead logging.
//!
//! The ring and its `eventId -> position` index live behind a single
//! [`access_core::sync::Mutex`] (§4.6 "single-writer / many-reader,
//! protected by a mutex covering (ring-buffer, id->position index)"),
//! following the same re-exported-`parking_lot` discipline the concurrent
//! access manager (C4) uses.

use std::collections::VecDeque;

use access_core::sync::Mutex;
use access_domain::{AccessError, EventProcessor, EventRecord};
use indexmap::IndexMap;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::CacheError;
use crate::persister::Persister;

/// One cached event plus the monotonic sequence number it was inserted
/// under, so "events after X" can be served without rescanning for
/// relative order once X's sequence number is known.
struct Cached {
    seq: u64,
    record: EventRecord,
}

struct State {
    capacity: usize,
    flush_threshold: usize,
    ring: VecDeque<Cached>,
    index: IndexMap<Uuid, u64>,
    next_seq: u64,
    pending: Vec<EventRecord>,
    persister: Box<dyn Persister>,
}

impl State {
    fn insert(&mut self, record: EventRecord) -> Result<(), AccessError> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(record.meta.event_id, seq);
        self.ring.push_back(Cached { seq, record: record.clone() });
        while self.ring.len() > self.capacity {
            let evicted = self.ring.pop_front().expect("just checked len > 0");
            self.index.shift_remove(&evicted.record.meta.event_id);
        }
        self.pending.push(record);
        if self.pending.len() >= self.flush_threshold {
            self.flush_pending()?;
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<(), AccessError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        trace!(batch_len = self.pending.len(), "flushing event batch to persister");
        self.persister.persist(&self.pending)?;
        self.pending.clear();
        Ok(())
    }

    fn events_after(&self, event_id: Uuid) -> Result<Vec<EventRecord>, CacheError> {
        let Some(&seq) = self.index.get(&event_id) else {
            return Err(CacheError::EventNotCached(event_id));
        };
        Ok(self
            .ring
            .iter()
            .filter(|c| c.seq > seq)
            .map(|c| c.record.clone())
            .collect())
    }
}

/// The bounded-suffix event cache (C6). Configured with `capacity >= 1`
/// (§4.6 "configurable N >= 1") and a `flush_threshold` controlling how many
/// accepted events accumulate before an automatic [`EventBuffer::flush`].
pub struct EventBuffer {
    state: Mutex<State>,
}

impl EventBuffer {
    /// `capacity` is clamped to at least 1 (§4.6's stated lower bound).
    /// `flush_threshold` of 0 behaves as 1 — every accepted event flushes
    /// immediately.
    pub fn new(capacity: usize, flush_threshold: usize, persister: impl Persister + 'static) -> Self {
        Self {
            state: Mutex::new(State {
                capacity: capacity.max(1),
                flush_threshold: flush_threshold.max(1),
                ring: VecDeque::new(),
                index: IndexMap::new(),
                next_seq: 0,
                pending: Vec::new(),
                persister: Box::new(persister),
            }),
        }
    }

    /// Records `record` into the cache and the pending persist batch,
    /// flushing the batch once it reaches `flush_threshold`. Safe to call
    /// concurrently with readers; the single mutex serializes writers
    /// against both other writers and readers, but every operation is O(1)
    /// amortized.
    pub fn record(&self, record: EventRecord) -> Result<(), AccessError> {
        let mut state = self.state.lock();
        state.insert(record)
    }

    /// Forces any pending, not-yet-flushed events to the persister now.
    pub fn flush(&self) -> Result<(), AccessError> {
        let mut state = self.state.lock();
        state.flush_pending()
    }

    /// The contiguous suffix of cached events strictly after `event_id`, in
    /// insertion order. [`CacheError::EventNotCached`] if `event_id` has
    /// already been evicted (or was never cached), so the consumer knows to
    /// fall back to [`Persister::replay`].
    pub fn events_after(&self, event_id: Uuid) -> Result<Vec<EventRecord>, CacheError> {
        self.state.lock().events_after(event_id)
    }

    /// Every currently cached event, oldest first.
    pub fn cached_events(&self) -> Vec<EventRecord> {
        self.state.lock().ring.iter().map(|c| c.record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lets an [`EventBuffer`] sit directly behind C5's `with_event_processor`
/// (§4.5's "pluggable `eventProcessor` sink").
impl EventProcessor for EventBuffer {
    fn process(&mut self, record: EventRecord) -> Result<(), AccessError> {
        debug!(event_id = %record.meta.event_id, "buffering event");
        self.record(record)
    }
}
