//! The event record emitted by C5 (`access_manager::dependency_free`),
//! consumed by C6 (`access_events::buffer`) and replayed by C7
//! (`access_events::dispatch`).
//!
//! Lives here rather than in `access_manager` or `access_events` because
//! the event processor contract (§6) is shared vocabulary between the
//! emitter (C5) and every consumer (C6, C7, and remote shards).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AccessError;
use crate::ids::{ComponentAccess, Entity, EntityType, GroupId, UserId};

/// Whether an event is an addition or a removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventAction {
    Add,
    Remove,
}

/// The tagged payload variant of an [`EventRecord`], one per mapping kind in
/// §4.6.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventPayload {
    UserEvent { user: UserId },
    GroupEvent { group: GroupId },
    UserGroupMappingEvent { user: UserId, group: GroupId },
    GroupGroupMappingEvent { from: GroupId, to: GroupId },
    UserComponentEvent { user: UserId, access: ComponentAccess },
    GroupComponentEvent { group: GroupId, access: ComponentAccess },
    EntityTypeEvent { entity_type: EntityType },
    EntityEvent { entity_type: EntityType, entity: Entity },
    UserEntityMappingEvent { user: UserId, entity_type: EntityType, entity: Entity },
    GroupEntityMappingEvent { group: GroupId, entity_type: EntityType, entity: Entity },
}

impl EventPayload {
    /// The primary routing key used to derive [`EventMeta::hash_code`] —
    /// the user, group, or entity type closest to the event's subject.
    pub fn routing_key(&self) -> &str {
        use EventPayload::*;
        match self {
            UserEvent { user } => user.as_str(),
            GroupEvent { group } => group.as_str(),
            UserGroupMappingEvent { user, .. } => user.as_str(),
            GroupGroupMappingEvent { from, .. } => from.as_str(),
            UserComponentEvent { user, .. } => user.as_str(),
            GroupComponentEvent { group, .. } => group.as_str(),
            EntityTypeEvent { entity_type } => entity_type.as_str(),
            EntityEvent { entity_type, .. } => entity_type.as_str(),
            UserEntityMappingEvent { user, .. } => user.as_str(),
            GroupEntityMappingEvent { group, .. } => group.as_str(),
        }
    }
}

/// Metadata stamped onto every event at the moment C5 decides to emit it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventMeta {
    /// Unique 128-bit identifier (UUID-like); never correlated across
    /// events even within the same mutation.
    pub event_id: Uuid,
    /// UTC timestamp at emit time; monotonic per-writer, not globally.
    pub occurred_at: DateTime<Utc>,
    /// 32-bit routing hash derived from [`EventPayload::routing_key`].
    pub hash_code: i32,
}

/// An immutable record of one accepted state mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub meta: EventMeta,
    pub action: EventAction,
    pub payload: EventPayload,
}

/// The event processor contract (§6): consumed by C5 (the emitter) and
/// provided by C6, C7, and remote shard replicas.
///
/// A single dispatch entry point rather than one method per event kind —
/// implementers match on `record.payload` internally, which is what lets
/// this be used as a trait object (`Box<dyn EventProcessor>`) for the
/// pluggable sink §4.5 describes. Implementations may raise any
/// [`AccessError`]; idempotency is not mandated by the contract itself,
/// only promised by `DependencyFreeAccessManager`'s own consumers.
pub trait EventProcessor {
    fn process(&mut self, record: EventRecord) -> Result<(), AccessError>;
}

/// A no-op [`EventProcessor`] used when no sink is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEventProcessor;

impl EventProcessor for NullEventProcessor {
    fn process(&mut self, _record: EventRecord) -> Result<(), AccessError> {
        Ok(())
    }
}
