//! Routing-hash source injected into
//! [`crate::dependency_free::DependencyFreeAccessManager`], used to derive
//! [`access_domain::EventMeta::hash_code`] from an event's routing key.

/// Supplies the 32-bit routing hash stamped onto every emitted event.
pub trait HashCodeProvider: Send + Sync {
    fn hash_code(&self, routing_key: &str) -> i32;
}

/// The production [`HashCodeProvider`], backed by the crate's fixed-seed
/// deterministic hash (stable across process restarts, unlike `std`'s
/// randomized `RandomState`).
#[derive(Clone, Copy, Debug, Default)]
pub struct FoldHashCodeProvider;

impl HashCodeProvider for FoldHashCodeProvider {
    fn hash_code(&self, routing_key: &str) -> i32 {
        access_core::hash::fixed_hash32(routing_key)
    }
}
