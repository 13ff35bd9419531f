use uuid::Uuid;

/// Failures raised by [`crate::buffer::EventBuffer`] (§7 `EventNotCached`).
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// The requested suffix (`events after eventId X`) is no longer held in
    /// the bounded cache; the consumer must fall back to the persister's
    /// `replay`.
    #[error("event {0} is no longer present in the cache")]
    EventNotCached(Uuid),
}
