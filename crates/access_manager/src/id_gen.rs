//! Event identifier source injected into
//! [`crate::dependency_free::DependencyFreeAccessManager`].

use uuid::Uuid;

/// Supplies the 128-bit identifier stamped onto every emitted event.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// The production [`IdGenerator`], backed by [`Uuid::new_v4`].
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
