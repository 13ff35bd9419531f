//! Time source injected into [`crate::dependency_free::DependencyFreeAccessManager`]
//! (§9 "Global/process state... dependency-injected").

use chrono::{DateTime, Utc};

/// Supplies the timestamp stamped onto every emitted event.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The production [`Clock`], backed by [`chrono::Utc::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
