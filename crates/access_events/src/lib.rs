//! The event buffer & cache (C6) and the processor dispatcher (C7).
//!
//! Consumes the event stream emitted by `access_manager`'s dependency-free
//! layer (C5), caches a bounded suffix, batches to a pluggable [`Persister`]
//! for write-ahead logging, and replays captured streams onto any
//! [`access_domain::EventProcessor`] for recovery, replication, or shard
//! routing.

mod buffer;
mod dispatch;
mod error;
mod persister;

pub use buffer::EventBuffer;
pub use dispatch::ProcessorDispatcher;
pub use error::CacheError;
pub use persister::{InMemoryPersister, Persister};
