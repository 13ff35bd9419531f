//! The processor dispatcher (C7): replays a sequence of previously emitted
//! events onto any object satisfying the [`EventProcessor`] contract, used
//! for recovery, replication, and shard routing (§4.7).
//!
//! `DependencyFreeAccessManager` itself implements [`EventProcessor`] as a
//! local, non-forwarding replay target (§4.5 "added"), so the common case is
//! `ProcessorDispatcher::replay(events, &mut fresh_c5_instance)`.

use access_domain::{AccessError, EventProcessor, EventRecord};

/// Stateless: [`Self::replay`] is the entire contract, taking its target by
/// `&mut dyn EventProcessor` rather than by ownership so the same dispatcher
/// can be reused across many replay targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessorDispatcher;

impl ProcessorDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Dispatches each record in `events` onto `target` in strict input
    /// order (§4.7 "Replay is strictly in input order"). Stops and
    /// propagates the first error; no retry policy is imposed here, as
    /// specified.
    pub fn replay(
        &self,
        events: impl IntoIterator<Item = EventRecord>,
        target: &mut dyn EventProcessor,
    ) -> Result<(), AccessError> {
        for record in events {
            target.process(record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use access_domain::{EventAction, EventMeta, EventPayload, GroupId, UserId};
    use access_manager::{DependencyFreeAccessManager, StrictAccessManager};
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }
    fn gid(s: &str) -> GroupId {
        GroupId::new(s).unwrap()
    }

    fn stamp(payload: EventPayload, action: EventAction) -> EventRecord {
        EventRecord {
            meta: EventMeta { event_id: Uuid::new_v4(), occurred_at: Utc::now(), hash_code: 0 },
            action,
            payload,
        }
    }

    #[test]
    fn replay_rebuilds_equivalent_state() {
        let events = vec![
            stamp(EventPayload::UserEvent { user: uid("u") }, EventAction::Add),
            stamp(EventPayload::GroupEvent { group: gid("g") }, EventAction::Add),
            stamp(
                EventPayload::UserGroupMappingEvent { user: uid("u"), group: gid("g") },
                EventAction::Add,
            ),
        ];

        let mut replica = DependencyFreeAccessManager::new(StrictAccessManager::new());
        ProcessorDispatcher::new().replay(events, &mut replica).unwrap();

        assert!(replica.contains_user(&uid("u")));
        assert!(replica.contains_group(&gid("g")));
    }

    #[test]
    fn replay_stops_and_propagates_first_error() {
        struct FailFirst;
        impl EventProcessor for FailFirst {
            fn process(&mut self, _record: EventRecord) -> Result<(), AccessError> {
                Err(AccessError::InvalidArgument { parameter: "test", message: "boom".into() })
            }
        }

        let events = vec![stamp(EventPayload::UserEvent { user: uid("u") }, EventAction::Add)];
        let mut target = FailFirst;
        let err = ProcessorDispatcher::new().replay(events, &mut target).unwrap_err();
        assert!(matches!(err, AccessError::InvalidArgument { .. }));
    }
}
