//! Deterministic hashing used by the routing-hash code attached to every
//! emitted event (see `access_events::EventRecord::hash_code`).

use core::hash::{BuildHasher, Hash, Hasher};
use foldhash::fast::FixedState;

const FIXED_HASHER: FixedState =
    FixedState::with_seed(0b1001010111101110000001001100010000000011001001101011001001111000);

/// A deterministic, non-randomized [`BuildHasher`].
///
/// Process-local HashMaps don't need determinism, but the 32-bit routing
/// hash handed to shard routers must be stable across restarts and across
/// processes, so it cannot use `std`'s randomized `RandomState`.
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHasher;

impl BuildHasher for FixedHasher {
    type Hasher = foldhash::fast::FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASHER.build_hasher()
    }
}

/// Hashes `key` with [`FixedHasher`] and folds the result to 32 bits.
///
/// Used by `HashCodeProvider` implementations to derive an event's routing
/// hash from its primary key (user, group, or entity type).
pub fn fixed_hash32<T: Hash + ?Sized>(key: &T) -> i32 {
    let mut hasher = FixedHasher.build_hasher();
    key.hash(&mut hasher);
    let full = hasher.finish();
    (full ^ (full >> 32)) as u32 as i32
}
