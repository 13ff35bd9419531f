//! Event-replay round-trip (§8 scenario 6): a randomized workload applied to
//! one dependency-free access manager, captured as an event stream and
//! replayed via [`ProcessorDispatcher`] onto a second, fresh instance, must
//! leave both instances answering every query identically.

use std::sync::{Arc, Mutex};

use access_domain::{AccessError, ComponentAccess, EventProcessor, EventRecord, GroupId, UserId};
use access_events::ProcessorDispatcher;
use access_manager::{DependencyFreeAccessManager, StrictAccessManager};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Captures every emitted record, in order, behind a cloneable handle so the
/// test can both hand the processor to the manager and later read back what
/// it captured (same pattern as `access_manager::dependency_free`'s
/// `RecordingProcessor` test double).
#[derive(Clone, Default)]
struct Capture {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl EventProcessor for Capture {
    fn process(&mut self, record: EventRecord) -> Result<(), AccessError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

const USERS: usize = 8;
const GROUPS: usize = 6;
const COMPONENTS: usize = 4;
const OPS: usize = 2_000;
const SAMPLE_QUERIES: usize = 500;

fn run_workload(seed: u64, manager: &mut DependencyFreeAccessManager<StrictAccessManager>) {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..OPS {
        let user = UserId::new(format!("u{}", rng.gen_range(0..USERS))).unwrap();
        let group = GroupId::new(format!("g{}", rng.gen_range(0..GROUPS))).unwrap();
        let other_group = GroupId::new(format!("g{}", rng.gen_range(0..GROUPS))).unwrap();
        let access = ComponentAccess::new(
            (rng.gen_range(0..COMPONENTS) as u32).into(),
            (rng.gen_range(0..2u32)).into(),
        );

        match rng.gen_range(0..6) {
            0 => {
                let _ = manager.add_user_to_group_mapping(&user, &group);
            }
            1 => {
                let _ = manager.remove_user_to_group_mapping(&user, &group);
            }
            2 => {
                if group != other_group {
                    let _ = manager.add_group_to_group_mapping(&group, &other_group);
                }
            }
            3 => {
                let _ = manager.remove_group_to_group_mapping(&group, &other_group);
            }
            4 => {
                let _ = manager.add_user_to_component_mapping(&user, access);
            }
            _ => {
                let _ = manager.add_group_to_component_mapping(&group, access);
            }
        }
    }
}

#[test]
fn replayed_stream_matches_original_on_sampled_queries() {
    let capture = Capture::default();
    let mut instance_a =
        DependencyFreeAccessManager::new(StrictAccessManager::new()).with_event_processor(capture.clone());
    run_workload(42, &mut instance_a);

    let events = capture.records.lock().unwrap().clone();
    assert!(!events.is_empty());

    let mut instance_b = DependencyFreeAccessManager::new(StrictAccessManager::new());
    ProcessorDispatcher::new().replay(events, &mut instance_b).unwrap();

    let mut rng = StdRng::seed_from_u64(1_000);
    for _ in 0..SAMPLE_QUERIES {
        let user = UserId::new(format!("u{}", rng.gen_range(0..USERS))).unwrap();
        let access = ComponentAccess::new(
            (rng.gen_range(0..COMPONENTS) as u32).into(),
            (rng.gen_range(0..2u32)).into(),
        );
        assert_eq!(
            instance_a.has_access_to_component(&user, &access),
            instance_b.has_access_to_component(&user, &access),
            "divergent answer for user {user:?}, access {access:?}"
        );
        assert_eq!(
            instance_a.get_components_accessible_by_user(&user),
            instance_b.get_components_accessible_by_user(&user),
        );
    }

    let mut a_users = instance_a.users();
    let mut b_users = instance_b.users();
    a_users.sort();
    b_users.sort();
    assert_eq!(a_users, b_users);

    let mut a_groups = instance_a.groups();
    let mut b_groups = instance_b.groups();
    a_groups.sort();
    b_groups.sort();
    assert_eq!(a_groups, b_groups);
}
