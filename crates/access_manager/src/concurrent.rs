//! The concurrent access manager (C4): layers a reader/writer locking
//! discipline over the same state [`StrictAccessManager`](crate::strict::StrictAccessManager)
//! holds, split into independently lockable stores rather than wrapped
//! behind one coarse lock (§9 "composition, not inheritance").
//!
//! Unlike [`StrictAccessManager`](crate::strict::StrictAccessManager), every
//! mutator here takes `&self`: the whole point of C4 is that callers share
//! one instance behind an `Arc` and mutate it concurrently, so a `&mut self`
//! surface — which would require exclusive access and make the locks
//! underneath it dead weight — is not offered. For that reason C4 does not
//! implement the shared [`AccessManager`](crate::manager::AccessManager)
//! trait; it is not interchangeable with `StrictAccessManager` behind that
//! trait object, only behind its own method surface.
//!
//! Each store that C3 owns is split into its own [`access_core::sync::RwLock`]
//! so independent resources admit independent readers. A [`LockManager`]
//! computes the one global acquisition order every operation must respect —
//! that single order, not the direction of any one operation, is what rules
//! out deadlock (§4.4 "added" design note, recorded in `DESIGN.md`). Any
//! operation that needs more than one store holds every lock it needs for
//! the duration of the operation, acquired in that order, whether the locks
//! are shared or exclusive.

use access_core::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use access_domain::{
    AccessError, ComponentAccess, ComponentGrants, Entity, EntityCatalog, EntityGrants, EntityType,
    GroupId, UserId,
};
use access_graph::BipartiteGraph;
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use tracing::instrument;

use crate::logic;

/// The six independently lockable resources of §4.4's dependency DAG.
///
/// `Membership` covers the bipartite graph itself (users, groups, and both
/// edge kinds) since [`BipartiteGraph`] keeps that state internally coherent
/// and splitting it further would not admit any extra parallelism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Membership,
    Entities,
    UserComponentMap,
    GroupComponentMap,
    UserEntityMap,
    GroupEntityMap,
}

impl Resource {
    const ALL: [Resource; 6] = [
        Resource::Membership,
        Resource::Entities,
        Resource::UserComponentMap,
        Resource::GroupComponentMap,
        Resource::UserEntityMap,
        Resource::GroupEntityMap,
    ];
}

/// Raised when [`LockManager::new`] is given a dependency table that is not
/// a DAG.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("lock dependency table contains a cycle through {0:?}")]
pub struct LockOrderCycle(pub Resource);

/// Computes and holds the canonical total order over [`Resource`] implied by
/// a declared dependency table (§4.4's diagram: `userToGroupMap` depends on
/// `users`, `userToEntityMap` depends on `users` and `entities`, etc).
///
/// Built once at construction via Kahn's algorithm; every C4 operation
/// acquires only the resources it touches, always walking this order
/// ascending, regardless of whether the operation is conceptually an add
/// (down-to-up the dependency edges) or a remove (up-to-down) — the
/// direction in §4.4 governs *which* resources end up in the locked set, not
/// the order they're taken in.
#[derive(Clone, Debug)]
pub struct LockManager {
    order: IndexMap<Resource, usize>,
}

impl LockManager {
    /// `edges` are `(dependent, dependency)` pairs: a dependent resource is
    /// ordered after everything it depends on.
    pub fn new(edges: &[(Resource, Resource)]) -> Result<Self, LockOrderCycle> {
        let mut deps: IndexMap<Resource, IndexSet<Resource>> =
            Resource::ALL.iter().map(|r| (*r, IndexSet::new())).collect();
        for (dependent, dependency) in edges {
            deps.entry(*dependent).or_default().insert(*dependency);
        }

        let mut in_degree: IndexMap<Resource, usize> =
            deps.iter().map(|(r, d)| (*r, d.len())).collect();
        let mut ready: Vec<Resource> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(r, _)| *r)
            .collect();
        ready.sort();

        let mut order = IndexMap::new();
        while let Some(r) = ready.pop() {
            order.insert(r, order.len());
            for (dependent, dependency_set) in deps.iter() {
                if *dependent == r || !dependency_set.contains(&r) {
                    continue;
                }
                let deg = in_degree.get_mut(dependent).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    ready.push(*dependent);
                }
            }
            ready.sort();
        }

        if order.len() != Resource::ALL.len() {
            let stuck = Resource::ALL.iter().find(|r| !order.contains_key(*r)).unwrap();
            return Err(LockOrderCycle(*stuck));
        }
        Ok(Self { order })
    }

    /// The declared DAG of §4.4: membership depends on nothing extra of its
    /// own, every grant store depends on membership (the user/group vertex
    /// set), and the entity-keyed stores additionally depend on the entity
    /// catalog.
    pub fn canonical() -> Self {
        Self::new(&[
            (Resource::UserComponentMap, Resource::Membership),
            (Resource::GroupComponentMap, Resource::Membership),
            (Resource::UserEntityMap, Resource::Membership),
            (Resource::UserEntityMap, Resource::Entities),
            (Resource::GroupEntityMap, Resource::Membership),
            (Resource::GroupEntityMap, Resource::Entities),
        ])
        .expect("canonical lock dependency table is acyclic by construction")
    }

    /// Returns `resources` sorted into ascending canonical-order position.
    ///
    /// No call site ever names more than four of the six resources, so this
    /// stays on the stack the way `tarjan_scc`'s `SmallVec<[N; 4]>` does for
    /// its node lists.
    fn ordered(&self, resources: &[Resource]) -> SmallVec<[Resource; 4]> {
        let mut out: SmallVec<[Resource; 4]> = resources.iter().copied().collect();
        out.sort_by_key(|r| self.order[r]);
        out.dedup();
        out
    }
}

/// The concurrent access manager (C4): [`StrictAccessManager`](crate::strict::StrictAccessManager)'s
/// stores, each behind its own [`RwLock`], guarded by [`LockManager`]'s
/// canonical acquisition order.
pub struct ConcurrentAccessManager {
    locks: LockManager,
    graph: RwLock<BipartiteGraph<UserId, GroupId>>,
    catalog: RwLock<EntityCatalog>,
    uc: RwLock<ComponentGrants<UserId>>,
    gc: RwLock<ComponentGrants<GroupId>>,
    ue: RwLock<EntityGrants<UserId>>,
    ge: RwLock<EntityGrants<GroupId>>,
}

impl Default for ConcurrentAccessManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds whichever subset of read guards an operation needs, acquired in
/// [`LockManager`]'s canonical order.
#[derive(Default)]
struct ReadGuards<'a> {
    graph: Option<RwLockReadGuard<'a, BipartiteGraph<UserId, GroupId>>>,
    catalog: Option<RwLockReadGuard<'a, EntityCatalog>>,
    uc: Option<RwLockReadGuard<'a, ComponentGrants<UserId>>>,
    gc: Option<RwLockReadGuard<'a, ComponentGrants<GroupId>>>,
    ue: Option<RwLockReadGuard<'a, EntityGrants<UserId>>>,
    ge: Option<RwLockReadGuard<'a, EntityGrants<GroupId>>>,
}

/// Holds whichever subset of write guards an operation needs, acquired in
/// [`LockManager`]'s canonical order. Used whenever an operation mutates one
/// store but must hold another steady while it checks or mutates it (e.g. a
/// component grant add checks the owning user still exists), since two
/// operations racing to acquire overlapping resource sets must always
/// request them in the same order to stay deadlock-free.
#[derive(Default)]
struct WriteGuards<'a> {
    graph: Option<RwLockWriteGuard<'a, BipartiteGraph<UserId, GroupId>>>,
    catalog: Option<RwLockWriteGuard<'a, EntityCatalog>>,
    uc: Option<RwLockWriteGuard<'a, ComponentGrants<UserId>>>,
    gc: Option<RwLockWriteGuard<'a, ComponentGrants<GroupId>>>,
    ue: Option<RwLockWriteGuard<'a, EntityGrants<UserId>>>,
    ge: Option<RwLockWriteGuard<'a, EntityGrants<GroupId>>>,
}

impl ConcurrentAccessManager {
    pub fn new() -> Self {
        Self::with_lock_manager(LockManager::canonical())
    }

    pub fn with_lock_manager(locks: LockManager) -> Self {
        Self {
            locks,
            graph: RwLock::new(BipartiteGraph::new()),
            catalog: RwLock::new(EntityCatalog::new()),
            uc: RwLock::new(ComponentGrants::new()),
            gc: RwLock::new(ComponentGrants::new()),
            ue: RwLock::new(EntityGrants::new()),
            ge: RwLock::new(EntityGrants::new()),
        }
    }

    /// Acquires shared locks on exactly `resources`, in canonical order, and
    /// drops them in reverse order automatically via `ReadGuards`'s field
    /// drop order.
    #[instrument(level = "debug", skip(self))]
    fn read_guards(&self, resources: &[Resource]) -> ReadGuards<'_> {
        let mut guards = ReadGuards::default();
        for r in self.locks.ordered(resources) {
            match r {
                Resource::Membership => guards.graph = Some(self.graph.read()),
                Resource::Entities => guards.catalog = Some(self.catalog.read()),
                Resource::UserComponentMap => guards.uc = Some(self.uc.read()),
                Resource::GroupComponentMap => guards.gc = Some(self.gc.read()),
                Resource::UserEntityMap => guards.ue = Some(self.ue.read()),
                Resource::GroupEntityMap => guards.ge = Some(self.ge.read()),
            }
        }
        guards
    }

    /// Acquires exclusive locks on exactly `resources`, in canonical order.
    #[instrument(level = "debug", skip(self))]
    fn write_guards(&self, resources: &[Resource]) -> WriteGuards<'_> {
        let mut guards = WriteGuards::default();
        for r in self.locks.ordered(resources) {
            match r {
                Resource::Membership => guards.graph = Some(self.graph.write()),
                Resource::Entities => guards.catalog = Some(self.catalog.write()),
                Resource::UserComponentMap => guards.uc = Some(self.uc.write()),
                Resource::GroupComponentMap => guards.gc = Some(self.gc.write()),
                Resource::UserEntityMap => guards.ue = Some(self.ue.write()),
                Resource::GroupEntityMap => guards.ge = Some(self.ge.write()),
            }
        }
        guards
    }
}

impl ConcurrentAccessManager {
    pub fn add_user(&self, user: UserId) -> Result<(), AccessError> {
        let mut graph = self.graph.write();
        graph.add_leaf(user).map_err(logic::convert_graph_error)
    }

    pub fn remove_user(&self, user: &UserId) -> Result<(), AccessError> {
        let mut guards = self.write_guards(&[Resource::Membership, Resource::UserComponentMap, Resource::UserEntityMap]);
        guards.graph.as_mut().unwrap().remove_leaf(user).map_err(logic::convert_graph_error)?;
        guards.uc.as_mut().unwrap().remove_key(user);
        guards.ue.as_mut().unwrap().remove_key(user);
        Ok(())
    }

    pub fn contains_user(&self, user: &UserId) -> bool {
        self.graph.read().contains_leaf(user)
    }

    pub fn users(&self) -> Vec<UserId> {
        self.graph.read().leaves().cloned().collect()
    }

    pub fn add_group(&self, group: GroupId) -> Result<(), AccessError> {
        let mut graph = self.graph.write();
        graph.add_non_leaf(group).map_err(logic::convert_graph_error)
    }

    pub fn remove_group(&self, group: &GroupId) -> Result<(), AccessError> {
        let mut guards = self.write_guards(&[Resource::Membership, Resource::GroupComponentMap, Resource::GroupEntityMap]);
        guards.graph.as_mut().unwrap().remove_non_leaf(group).map_err(logic::convert_graph_error)?;
        guards.gc.as_mut().unwrap().remove_key(group);
        guards.ge.as_mut().unwrap().remove_key(group);
        Ok(())
    }

    pub fn contains_group(&self, group: &GroupId) -> bool {
        self.graph.read().contains_non_leaf(group)
    }

    pub fn groups(&self) -> Vec<GroupId> {
        self.graph.read().non_leaves().cloned().collect()
    }

    pub fn add_entity_type(&self, entity_type: EntityType) -> Result<(), AccessError> {
        self.catalog.write().add_type(entity_type)
    }

    pub fn remove_entity_type(&self, entity_type: &EntityType) -> Result<(), AccessError> {
        let mut guards = self.write_guards(&[Resource::Entities, Resource::UserEntityMap, Resource::GroupEntityMap]);
        guards.catalog.as_mut().unwrap().remove_type(entity_type)?;
        guards.ue.as_mut().unwrap().remove_type(entity_type);
        guards.ge.as_mut().unwrap().remove_type(entity_type);
        Ok(())
    }

    pub fn contains_entity_type(&self, entity_type: &EntityType) -> bool {
        self.catalog.read().contains_type(entity_type)
    }

    pub fn entity_types(&self) -> Vec<EntityType> {
        self.catalog.read().types().cloned().collect()
    }

    pub fn add_entity(&self, entity_type: &EntityType, entity: Entity) -> Result<(), AccessError> {
        self.catalog.write().add_entity(entity_type, entity)
    }

    pub fn remove_entity(&self, entity_type: &EntityType, entity: &Entity) -> Result<(), AccessError> {
        let mut guards = self.write_guards(&[Resource::Entities, Resource::UserEntityMap, Resource::GroupEntityMap]);
        guards.catalog.as_mut().unwrap().remove_entity(entity_type, entity)?;
        guards.ue.as_mut().unwrap().remove_entity(entity_type, entity);
        guards.ge.as_mut().unwrap().remove_entity(entity_type, entity);
        Ok(())
    }

    pub fn contains_entity(&self, entity_type: &EntityType, entity: &Entity) -> bool {
        self.catalog.read().contains_entity(entity_type, entity)
    }

    pub fn entities(&self, entity_type: &EntityType) -> Result<Vec<Entity>, AccessError> {
        let catalog = self.catalog.read();
        if !catalog.contains_type(entity_type) {
            return Err(AccessError::EntityTypeNotFound(entity_type.clone()));
        }
        Ok(catalog.entities(entity_type).cloned().collect())
    }

    pub fn add_user_to_group_mapping(&self, user: &UserId, group: &GroupId) -> Result<(), AccessError> {
        let mut graph = self.graph.write();
        graph.add_leaf_edge(user, group).map_err(logic::convert_graph_error)
    }

    pub fn remove_user_to_group_mapping(&self, user: &UserId, group: &GroupId) -> Result<(), AccessError> {
        let mut graph = self.graph.write();
        graph.remove_leaf_edge(user, group).map_err(logic::convert_graph_error)
    }

    pub fn get_user_to_group_mappings(&self, user: &UserId) -> Result<Vec<GroupId>, AccessError> {
        self.graph.read().get_leaf_edges(user).map(|it| it.collect()).map_err(logic::convert_graph_error)
    }

    pub fn add_group_to_group_mapping(&self, from: &GroupId, to: &GroupId) -> Result<(), AccessError> {
        if from == to {
            return Err(AccessError::SelfMapping(from.clone()));
        }
        let mut graph = self.graph.write();
        graph.add_non_leaf_edge(from, to).map_err(logic::convert_graph_error)
    }

    pub fn remove_group_to_group_mapping(&self, from: &GroupId, to: &GroupId) -> Result<(), AccessError> {
        let mut graph = self.graph.write();
        graph.remove_non_leaf_edge(from, to).map_err(logic::convert_graph_error)
    }

    pub fn get_group_to_group_mappings(&self, from: &GroupId) -> Result<Vec<GroupId>, AccessError> {
        self.graph.read().get_non_leaf_edges(from).map(|it| it.collect()).map_err(logic::convert_graph_error)
    }

    pub fn add_user_to_component_mapping(&self, user: &UserId, access: ComponentAccess) -> Result<(), AccessError> {
        let mut guards = self.write_guards(&[Resource::Membership, Resource::UserComponentMap]);
        if !guards.graph.as_ref().unwrap().contains_leaf(user) {
            return Err(AccessError::UserNotFound(user.clone()));
        }
        if !guards.uc.as_mut().unwrap().add(user.clone(), access) {
            return Err(AccessError::UserComponentMappingAlreadyExists { user: user.clone(), access: access.into() });
        }
        Ok(())
    }

    pub fn remove_user_to_component_mapping(&self, user: &UserId, access: &ComponentAccess) -> Result<(), AccessError> {
        let mut uc = self.uc.write();
        if !uc.remove(user, access) {
            return Err(AccessError::UserComponentMappingNotFound { user: user.clone(), access: (*access).into() });
        }
        Ok(())
    }

    pub fn get_user_to_component_mappings(&self, user: &UserId) -> Result<Vec<ComponentAccess>, AccessError> {
        let guards = self.read_guards(&[Resource::Membership, Resource::UserComponentMap]);
        if !guards.graph.as_ref().unwrap().contains_leaf(user) {
            return Err(AccessError::UserNotFound(user.clone()));
        }
        Ok(guards.uc.as_ref().unwrap().get(user).collect())
    }

    pub fn add_group_to_component_mapping(&self, group: &GroupId, access: ComponentAccess) -> Result<(), AccessError> {
        let mut guards = self.write_guards(&[Resource::Membership, Resource::GroupComponentMap]);
        if !guards.graph.as_ref().unwrap().contains_non_leaf(group) {
            return Err(AccessError::GroupNotFound(group.clone()));
        }
        if !guards.gc.as_mut().unwrap().add(group.clone(), access) {
            return Err(AccessError::GroupComponentMappingAlreadyExists { group: group.clone(), access: access.into() });
        }
        Ok(())
    }

    pub fn remove_group_to_component_mapping(&self, group: &GroupId, access: &ComponentAccess) -> Result<(), AccessError> {
        let mut gc = self.gc.write();
        if !gc.remove(group, access) {
            return Err(AccessError::GroupComponentMappingNotFound { group: group.clone(), access: (*access).into() });
        }
        Ok(())
    }

    pub fn get_group_to_component_mappings(&self, group: &GroupId) -> Result<Vec<ComponentAccess>, AccessError> {
        let guards = self.read_guards(&[Resource::Membership, Resource::GroupComponentMap]);
        if !guards.graph.as_ref().unwrap().contains_non_leaf(group) {
            return Err(AccessError::GroupNotFound(group.clone()));
        }
        Ok(guards.gc.as_ref().unwrap().get(group).collect())
    }

    pub fn add_user_to_entity_mapping(
        &self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        let mut guards = self.write_guards(&[Resource::Membership, Resource::Entities, Resource::UserEntityMap]);
        if !guards.graph.as_ref().unwrap().contains_leaf(user) {
            return Err(AccessError::UserNotFound(user.clone()));
        }
        logic::ensure_entity_exists(guards.catalog.as_ref().unwrap(), entity_type, entity)?;
        if !guards.ue.as_mut().unwrap().add(user.clone(), entity_type.clone(), entity.clone()) {
            return Err(AccessError::UserEntityMappingAlreadyExists {
                user: user.clone(),
                entity_type: entity_type.clone(),
                entity: entity.clone(),
            });
        }
        Ok(())
    }

    pub fn remove_user_to_entity_mapping(
        &self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        let mut ue = self.ue.write();
        if !ue.remove(user, entity_type, entity) {
            return Err(AccessError::UserEntityMappingNotFound {
                user: user.clone(),
                entity_type: entity_type.clone(),
                entity: entity.clone(),
            });
        }
        Ok(())
    }

    pub fn get_user_to_entity_mappings(
        &self,
        user: &UserId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        let guards = self.read_guards(&[Resource::Membership, Resource::Entities, Resource::UserEntityMap]);
        if !guards.graph.as_ref().unwrap().contains_leaf(user) {
            return Err(AccessError::UserNotFound(user.clone()));
        }
        let catalog = guards.catalog.as_ref().unwrap();
        let ue = guards.ue.as_ref().unwrap();
        match entity_type {
            Some(t) => {
                if !catalog.contains_type(t) {
                    return Err(AccessError::EntityTypeNotFound(t.clone()));
                }
                Ok(ue.get(user, t).map(|e| (t.clone(), e)).collect())
            }
            None => Ok(ue.get_all(user).collect()),
        }
    }

    pub fn add_group_to_entity_mapping(
        &self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        let mut guards = self.write_guards(&[Resource::Membership, Resource::Entities, Resource::GroupEntityMap]);
        if !guards.graph.as_ref().unwrap().contains_non_leaf(group) {
            return Err(AccessError::GroupNotFound(group.clone()));
        }
        logic::ensure_entity_exists(guards.catalog.as_ref().unwrap(), entity_type, entity)?;
        if !guards.ge.as_mut().unwrap().add(group.clone(), entity_type.clone(), entity.clone()) {
            return Err(AccessError::GroupEntityMappingAlreadyExists {
                group: group.clone(),
                entity_type: entity_type.clone(),
                entity: entity.clone(),
            });
        }
        Ok(())
    }

    pub fn remove_group_to_entity_mapping(
        &self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        let mut ge = self.ge.write();
        if !ge.remove(group, entity_type, entity) {
            return Err(AccessError::GroupEntityMappingNotFound {
                group: group.clone(),
                entity_type: entity_type.clone(),
                entity: entity.clone(),
            });
        }
        Ok(())
    }

    pub fn get_group_to_entity_mappings(
        &self,
        group: &GroupId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        let guards = self.read_guards(&[Resource::Membership, Resource::Entities, Resource::GroupEntityMap]);
        if !guards.graph.as_ref().unwrap().contains_non_leaf(group) {
            return Err(AccessError::GroupNotFound(group.clone()));
        }
        let catalog = guards.catalog.as_ref().unwrap();
        let ge = guards.ge.as_ref().unwrap();
        match entity_type {
            Some(t) => {
                if !catalog.contains_type(t) {
                    return Err(AccessError::EntityTypeNotFound(t.clone()));
                }
                Ok(ge.get(group, t).map(|e| (t.clone(), e)).collect())
            }
            None => Ok(ge.get_all(group).collect()),
        }
    }

    pub fn has_access_to_component(&self, user: &UserId, access: &ComponentAccess) -> bool {
        let guards = self.read_guards(&[Resource::Membership, Resource::UserComponentMap, Resource::GroupComponentMap]);
        logic::has_access_to_component(
            guards.graph.as_ref().unwrap(),
            guards.uc.as_ref().unwrap(),
            guards.gc.as_ref().unwrap(),
            user,
            access,
        )
    }

    pub fn has_access_to_entity(&self, user: &UserId, entity_type: &EntityType, entity: &Entity) -> Result<bool, AccessError> {
        let guards = self.read_guards(&[
            Resource::Membership,
            Resource::Entities,
            Resource::UserEntityMap,
            Resource::GroupEntityMap,
        ]);
        logic::has_access_to_entity(
            guards.graph.as_ref().unwrap(),
            guards.catalog.as_ref().unwrap(),
            guards.ue.as_ref().unwrap(),
            guards.ge.as_ref().unwrap(),
            user,
            entity_type,
            entity,
        )
    }

    pub fn get_components_accessible_by_user(&self, user: &UserId) -> Vec<ComponentAccess> {
        let guards = self.read_guards(&[Resource::Membership, Resource::UserComponentMap, Resource::GroupComponentMap]);
        logic::components_accessible_by_user(
            guards.graph.as_ref().unwrap(),
            guards.uc.as_ref().unwrap(),
            guards.gc.as_ref().unwrap(),
            user,
        )
    }

    pub fn get_entities_accessible_by_user(
        &self,
        user: &UserId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        let guards = self.read_guards(&[
            Resource::Membership,
            Resource::Entities,
            Resource::UserEntityMap,
            Resource::GroupEntityMap,
        ]);
        logic::entities_accessible_by_user(
            guards.graph.as_ref().unwrap(),
            guards.catalog.as_ref().unwrap(),
            guards.ue.as_ref().unwrap(),
            guards.ge.as_ref().unwrap(),
            user,
            entity_type,
        )
    }

    pub fn has_group_access_to_component(&self, group: &GroupId, access: &ComponentAccess) -> Result<bool, AccessError> {
        let guards = self.read_guards(&[Resource::Membership, Resource::GroupComponentMap]);
        logic::has_group_access_to_component(guards.graph.as_ref().unwrap(), guards.gc.as_ref().unwrap(), group, access)
    }

    pub fn has_group_access_to_entity(
        &self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<bool, AccessError> {
        let guards = self.read_guards(&[Resource::Membership, Resource::Entities, Resource::GroupEntityMap]);
        logic::has_group_access_to_entity(
            guards.graph.as_ref().unwrap(),
            guards.catalog.as_ref().unwrap(),
            guards.ge.as_ref().unwrap(),
            group,
            entity_type,
            entity,
        )
    }

    pub fn get_components_accessible_by_group(&self, group: &GroupId) -> Result<Vec<ComponentAccess>, AccessError> {
        let guards = self.read_guards(&[Resource::Membership, Resource::GroupComponentMap]);
        logic::components_accessible_by_group(guards.graph.as_ref().unwrap(), guards.gc.as_ref().unwrap(), group)
    }

    pub fn get_entities_accessible_by_group(
        &self,
        group: &GroupId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        let guards = self.read_guards(&[Resource::Membership, Resource::Entities, Resource::GroupEntityMap]);
        logic::entities_accessible_by_group(
            guards.graph.as_ref().unwrap(),
            guards.catalog.as_ref().unwrap(),
            guards.ge.as_ref().unwrap(),
            group,
            entity_type,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }
    fn gid(s: &str) -> GroupId {
        GroupId::new(s).unwrap()
    }

    #[test]
    fn canonical_lock_order_is_a_dag() {
        let lm = LockManager::canonical();
        assert_eq!(lm.order.len(), Resource::ALL.len());
        assert!(lm.order[&Resource::Membership] < lm.order[&Resource::UserComponentMap]);
        assert!(lm.order[&Resource::Entities] < lm.order[&Resource::UserEntityMap]);
    }

    #[test]
    fn cyclic_dependency_table_is_rejected() {
        let err = LockManager::new(&[
            (Resource::Membership, Resource::Entities),
            (Resource::Entities, Resource::Membership),
        ])
        .unwrap_err();
        assert!(matches!(err, LockOrderCycle(_)));
    }

    #[test]
    fn concurrent_manager_matches_strict_semantics() {
        let m = ConcurrentAccessManager::new();
        m.add_user(uid("u")).unwrap();
        m.add_group(gid("g")).unwrap();
        m.add_user_to_group_mapping(&uid("u"), &gid("g")).unwrap();
        m.add_group_to_component_mapping(&gid("g"), ComponentAccess::new(1.into(), 1.into())).unwrap();

        assert!(m.has_access_to_component(&uid("u"), &ComponentAccess::new(1.into(), 1.into())));
        assert_eq!(m.get_user_to_group_mappings(&uid("u")).unwrap(), vec![gid("g")]);
    }

    #[test]
    fn concurrent_manager_rejects_cycles() {
        let m = ConcurrentAccessManager::new();
        for g in ["a", "b"] {
            m.add_group(gid(g)).unwrap();
        }
        m.add_group_to_group_mapping(&gid("a"), &gid("b")).unwrap();
        let err = m.add_group_to_group_mapping(&gid("b"), &gid("a")).unwrap_err();
        assert!(matches!(err, AccessError::CircularReference { .. }));
    }

    #[test]
    fn concurrent_writers_through_shared_arc_leave_every_user_mapped() {
        use std::sync::Arc;
        use std::thread;

        let m = Arc::new(ConcurrentAccessManager::new());
        m.add_group(gid("g")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let m = Arc::clone(&m);
                thread::spawn(move || {
                    let user = uid(&format!("u{i}"));
                    m.add_user(user.clone()).unwrap();
                    m.add_user_to_group_mapping(&user, &gid("g")).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut users = m.users();
        users.sort();
        assert_eq!(users, (0..8).map(|i| uid(&format!("u{i}"))).collect::<Vec<_>>());
        for i in 0..8 {
            assert_eq!(m.get_user_to_group_mappings(&uid(&format!("u{i}"))).unwrap(), vec![gid("g")]);
        }
    }
}
