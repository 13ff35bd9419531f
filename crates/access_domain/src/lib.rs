//! Domain types, mapping stores (C2), and the error taxonomy (§7).

mod error;
mod events;
mod grants;
mod ids;

pub use error::{AccessError, AccessErrorKind, ComponentAccessRef};
pub use events::{EventAction, EventMeta, EventPayload, EventProcessor, EventRecord, NullEventProcessor};
pub use grants::{ComponentGrants, EntityCatalog, EntityGrants};
pub use ids::{AccessLevel, ComponentAccess, ComponentId, Entity, EntityType, GroupId, UserId};
