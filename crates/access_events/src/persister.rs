//! The persister contract (§6): `EventBuffer` (C6) hands it batches for
//! write-ahead logging; the core does not prescribe the durable format, so
//! this is a trait rather than a concrete SQL/file implementation — same
//! "thin adapter over the core" posture as the hosting/SQL collaborators
//! called out as out of scope in §1.

use access_domain::{AccessError, EventRecord};
use uuid::Uuid;

/// Bulk write-ahead-log sink for accepted events.
///
/// `persist` must be atomic per batch (§6): either the whole batch reaches
/// durable storage or none of it does. `replay` is the recovery path: every
/// event at or after `since` (or the full log if `since` is `None`), in the
/// order originally persisted.
pub trait Persister: Send {
    fn persist(&mut self, batch: &[EventRecord]) -> Result<(), AccessError>;
    fn replay(&self, since: Option<Uuid>) -> Result<Vec<EventRecord>, AccessError>;
}

/// A [`Persister`] that keeps every persisted event in memory, in append
/// order. Not a production durability layer — it exists so this crate's own
/// tests (and callers without a real WAL wired up yet) have something
/// concrete to hand `EventBuffer::new`.
#[derive(Debug, Default)]
pub struct InMemoryPersister {
    log: Vec<EventRecord>,
}

impl InMemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

impl Persister for InMemoryPersister {
    fn persist(&mut self, batch: &[EventRecord]) -> Result<(), AccessError> {
        self.log.extend_from_slice(batch);
        Ok(())
    }

    fn replay(&self, since: Option<Uuid>) -> Result<Vec<EventRecord>, AccessError> {
        match since {
            None => Ok(self.log.clone()),
            Some(id) => match self.log.iter().position(|r| r.meta.event_id == id) {
                Some(pos) => Ok(self.log[pos + 1..].to_vec()),
                None => Ok(self.log.clone()),
            },
        }
    }
}
