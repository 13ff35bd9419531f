//! Lock primitives used by the concurrent access manager (C4) and the event
//! buffer (C6).
//!
//! Re-exported from [`parking_lot`] rather than `std::sync`: the lock
//! manager's global topological acquisition order means a single poisoned
//! lock should never leave the rest of the engine unusable, and
//! `parking_lot`'s guards are smaller and don't carry poison state.

pub use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
