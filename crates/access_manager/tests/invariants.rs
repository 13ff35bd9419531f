//! Property-based checks for the universal invariants of §8: the non-leaf
//! subgraph stays acyclic (I3), cascading removal leaves no dangling
//! mention of a removed vertex (cascade completeness), and the
//! dependency-free layer's idempotency property holds for arbitrary
//! mutation sequences.
//!
//! Grounded on `access_graph`'s own `proptest::collection::vec`-of-ops
//! harness (`access_graph::graph::tests::non_leaf_subgraph_never_cycles`),
//! generalized from raw graph edges to the full access-manager surface.

use access_manager::{AccessManager, DependencyFreeAccessManager, StrictAccessManager};
use access_domain::{ComponentAccess, GroupId, UserId};
use proptest::prelude::*;

const USERS: [&str; 3] = ["u0", "u1", "u2"];
const GROUPS: [&str; 4] = ["g0", "g1", "g2", "g3"];

#[derive(Clone, Copy, Debug)]
enum Op {
    AddUser(usize),
    RemoveUser(usize),
    AddGroup(usize),
    RemoveGroup(usize),
    AddUserGroup(usize, usize),
    RemoveUserGroup(usize, usize),
    AddGroupGroup(usize, usize),
    RemoveGroupGroup(usize, usize),
    AddUserComponent(usize, u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..USERS.len()).prop_map(Op::AddUser),
        (0..USERS.len()).prop_map(Op::RemoveUser),
        (0..GROUPS.len()).prop_map(Op::AddGroup),
        (0..GROUPS.len()).prop_map(Op::RemoveGroup),
        (0..USERS.len(), 0..GROUPS.len()).prop_map(|(u, g)| Op::AddUserGroup(u, g)),
        (0..USERS.len(), 0..GROUPS.len()).prop_map(|(u, g)| Op::RemoveUserGroup(u, g)),
        (0..GROUPS.len(), 0..GROUPS.len()).prop_map(|(a, b)| Op::AddGroupGroup(a, b)),
        (0..GROUPS.len(), 0..GROUPS.len()).prop_map(|(a, b)| Op::RemoveGroupGroup(a, b)),
        (0..USERS.len(), 0u32..3).prop_map(|(u, a)| Op::AddUserComponent(u, a)),
    ]
}

fn uid(i: usize) -> UserId {
    UserId::new(USERS[i]).unwrap()
}

fn gid(i: usize) -> GroupId {
    GroupId::new(GROUPS[i]).unwrap()
}

/// Every group reachable from `group`, built purely from the public
/// `get_group_to_group_mappings` surface (no access to the internal graph).
fn reachable_groups(m: &StrictAccessManager, group: &GroupId) -> Vec<GroupId> {
    let mut seen = vec![group.clone()];
    let mut frontier = vec![group.clone()];
    while let Some(g) = frontier.pop() {
        let Ok(next) = m.get_group_to_group_mappings(&g) else {
            continue;
        };
        for n in next {
            if !seen.contains(&n) {
                seen.push(n.clone());
                frontier.push(n);
            }
        }
    }
    seen
}

fn apply(m: &mut StrictAccessManager, op: Op) {
    match op {
        Op::AddUser(u) => {
            let _ = m.add_user(uid(u));
        }
        Op::RemoveUser(u) => {
            let _ = m.remove_user(&uid(u));
        }
        Op::AddGroup(g) => {
            let _ = m.add_group(gid(g));
        }
        Op::RemoveGroup(g) => {
            let _ = m.remove_group(&gid(g));
        }
        Op::AddUserGroup(u, g) => {
            let _ = m.add_user_to_group_mapping(&uid(u), &gid(g));
        }
        Op::RemoveUserGroup(u, g) => {
            let _ = m.remove_user_to_group_mapping(&uid(u), &gid(g));
        }
        Op::AddGroupGroup(a, b) => {
            let _ = m.add_group_to_group_mapping(&gid(a), &gid(b));
        }
        Op::RemoveGroupGroup(a, b) => {
            let _ = m.remove_group_to_group_mapping(&gid(a), &gid(b));
        }
        Op::AddUserComponent(u, access) => {
            let _ = m.add_user_to_component_mapping(&uid(u), ComponentAccess::new(0.into(), access.into()));
        }
    }
}

proptest! {
    /// I3: the non-leaf subgraph never develops a cycle, for any sequence of
    /// accepted mutations.
    #[test]
    fn non_leaf_subgraph_stays_acyclic(ops in proptest::collection::vec(op_strategy(), 0..300)) {
        let mut m = StrictAccessManager::new();
        for op in ops {
            apply(&mut m, op);
            for i in 0..GROUPS.len() {
                if !m.contains_group(&gid(i)) {
                    continue;
                }
                let reached = reachable_groups(&m, &gid(i));
                let self_count = reached.iter().filter(|g| **g == gid(i)).count();
                prop_assert_eq!(self_count, 1, "group {:?} reaches itself through a non-trivial path", gid(i));
            }
        }
    }

    /// Cascade completeness: once a user is removed, no other vertex's
    /// mappings mention it, and every reachability query treats it as
    /// unknown (false / empty, never an error).
    #[test]
    fn removed_user_leaves_no_trace(ops in proptest::collection::vec(op_strategy(), 0..200)) {
        let mut m = StrictAccessManager::new();
        for op in ops {
            apply(&mut m, op);
        }
        for i in 0..USERS.len() {
            let _ = m.remove_user(&uid(i));
            prop_assert!(!m.contains_user(&uid(i)));
            prop_assert!(!m.has_access_to_component(&uid(i), &ComponentAccess::new(0.into(), 0.into())));
            prop_assert!(m.get_components_accessible_by_user(&uid(i)).is_empty());
        }
    }
}

proptest! {
    /// §8 idempotency: applying the same mutation twice through the
    /// dependency-free layer leaves state identical to applying it once,
    /// and the second application emits no event.
    #[test]
    fn repeated_mutation_is_idempotent(u in 0..USERS.len(), g in 0..GROUPS.len()) {
        use std::sync::{Arc, Mutex};
        use access_domain::{AccessError, EventProcessor, EventRecord};

        #[derive(Clone, Default)]
        struct Counter(Arc<Mutex<usize>>);
        impl EventProcessor for Counter {
            fn process(&mut self, _record: EventRecord) -> Result<(), AccessError> {
                *self.0.lock().unwrap() += 1;
                Ok(())
            }
        }

        let counter = Counter::default();
        let mut m = DependencyFreeAccessManager::new(StrictAccessManager::new())
            .with_event_processor(counter.clone());

        m.add_user_to_group_mapping(&uid(u), &gid(g)).unwrap();
        let after_first = *counter.0.lock().unwrap();
        let users_after_first = m.users();
        let groups_after_first = m.groups();

        m.add_user_to_group_mapping(&uid(u), &gid(g)).unwrap();
        prop_assert_eq!(*counter.0.lock().unwrap(), after_first, "second identical add emitted an event");

        let mut users_after_second = m.users();
        let mut groups_after_second = m.groups();
        let mut users_after_first_sorted = users_after_first;
        let mut groups_after_first_sorted = groups_after_first;
        users_after_second.sort();
        groups_after_second.sort();
        users_after_first_sorted.sort();
        groups_after_first_sorted.sort();
        prop_assert_eq!(users_after_second, users_after_first_sorted);
        prop_assert_eq!(groups_after_second, groups_after_first_sorted);
    }
}
