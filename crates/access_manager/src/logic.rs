//! Reachability logic shared by [`crate::strict::StrictAccessManager`] and
//! [`crate::concurrent::ConcurrentAccessManager`] (§9: "shared behavior
//! lives in small helper routines, not in a base class").
//!
//! Every function here is pure: it borrows whichever stores it needs and
//! never decides locking — that's each caller's job.

use access_domain::{
    AccessError, ComponentAccess, ComponentGrants, Entity, EntityCatalog, EntityGrants, EntityType,
    GroupId, UserId,
};
use access_graph::{BipartiteGraph, GraphError};
use indexmap::IndexSet;

pub fn convert_graph_error(e: GraphError<UserId, GroupId>) -> AccessError {
    use GraphError::*;
    match e {
        LeafAlreadyExists(u) => AccessError::UserAlreadyExists(u),
        NonLeafAlreadyExists(g) => AccessError::GroupAlreadyExists(g),
        LeafNotFound(u) => AccessError::UserNotFound(u),
        NonLeafNotFound(g) => AccessError::GroupNotFound(g),
        LeafEdgeExists(user, group) => AccessError::UserGroupMappingAlreadyExists { user, group },
        LeafEdgeNotFound(user, group) => AccessError::UserGroupMappingNotFound { user, group },
        NonLeafEdgeExists(from, to) => AccessError::GroupGroupMappingAlreadyExists { from, to },
        NonLeafEdgeNotFound(from, to) => AccessError::GroupGroupMappingNotFound { from, to },
        CircularReference(from, to) => AccessError::CircularReference { from, to },
    }
}

/// Groups reachable from `user` (ancestors via direct membership then the
/// group hierarchy). Does not include `user` itself.
pub fn reachable_groups_from_user(
    graph: &BipartiteGraph<UserId, GroupId>,
    user: &UserId,
) -> Result<Vec<GroupId>, AccessError> {
    let mut out = Vec::new();
    graph
        .traverse_from_leaf(user, |g| {
            out.push(g.clone());
            true
        })
        .map_err(convert_graph_error)?;
    Ok(out)
}

/// `group` plus every ancestor group reachable from it.
pub fn reachable_groups_from_group(
    graph: &BipartiteGraph<UserId, GroupId>,
    group: &GroupId,
) -> Result<Vec<GroupId>, AccessError> {
    let mut out = vec![group.clone()];
    graph
        .traverse_from_non_leaf(group, |g| {
            out.push(g.clone());
            true
        })
        .map_err(convert_graph_error)?;
    Ok(out)
}

pub fn ensure_entity_exists(
    catalog: &EntityCatalog,
    entity_type: &EntityType,
    entity: &Entity,
) -> Result<(), AccessError> {
    if !catalog.contains_type(entity_type) {
        return Err(AccessError::EntityTypeNotFound(entity_type.clone()));
    }
    if !catalog.contains_entity(entity_type, entity) {
        return Err(AccessError::EntityNotFound {
            entity_type: entity_type.clone(),
            entity: entity.clone(),
        });
    }
    Ok(())
}

pub fn has_access_to_component(
    graph: &BipartiteGraph<UserId, GroupId>,
    uc: &ComponentGrants<UserId>,
    gc: &ComponentGrants<GroupId>,
    user: &UserId,
    access: &ComponentAccess,
) -> bool {
    if !graph.contains_leaf(user) {
        return false;
    }
    if uc.contains(user, access) {
        return true;
    }
    let Ok(groups) = reachable_groups_from_user(graph, user) else {
        return false;
    };
    groups.iter().any(|g| gc.contains(g, access))
}

pub fn has_access_to_entity(
    graph: &BipartiteGraph<UserId, GroupId>,
    catalog: &EntityCatalog,
    ue: &EntityGrants<UserId>,
    ge: &EntityGrants<GroupId>,
    user: &UserId,
    entity_type: &EntityType,
    entity: &Entity,
) -> Result<bool, AccessError> {
    ensure_entity_exists(catalog, entity_type, entity)?;
    if !graph.contains_leaf(user) {
        return Ok(false);
    }
    if ue.contains(user, entity_type, entity) {
        return Ok(true);
    }
    let groups = reachable_groups_from_user(graph, user)?;
    Ok(groups.iter().any(|g| ge.contains(g, entity_type, entity)))
}

pub fn components_accessible_by_user(
    graph: &BipartiteGraph<UserId, GroupId>,
    uc: &ComponentGrants<UserId>,
    gc: &ComponentGrants<GroupId>,
    user: &UserId,
) -> Vec<ComponentAccess> {
    if !graph.contains_leaf(user) {
        return Vec::new();
    }
    let mut out: IndexSet<ComponentAccess> = uc.get(user).collect();
    if let Ok(groups) = reachable_groups_from_user(graph, user) {
        for g in groups {
            out.extend(gc.get(&g));
        }
    }
    out.into_iter().collect()
}

pub fn entities_accessible_by_user(
    graph: &BipartiteGraph<UserId, GroupId>,
    catalog: &EntityCatalog,
    ue: &EntityGrants<UserId>,
    ge: &EntityGrants<GroupId>,
    user: &UserId,
    entity_type: Option<&EntityType>,
) -> Result<Vec<(EntityType, Entity)>, AccessError> {
    if let Some(t) = entity_type {
        if !catalog.contains_type(t) {
            return Err(AccessError::EntityTypeNotFound(t.clone()));
        }
    }
    if !graph.contains_leaf(user) {
        return Ok(Vec::new());
    }
    let mut out: IndexSet<(EntityType, Entity)> = match entity_type {
        Some(t) => ue.get(user, t).map(|e| (t.clone(), e)).collect(),
        None => ue.get_all(user).collect(),
    };
    let groups = reachable_groups_from_user(graph, user)?;
    for g in groups {
        match entity_type {
            Some(t) => out.extend(ge.get(&g, t).map(|e| (t.clone(), e))),
            None => out.extend(ge.get_all(&g)),
        }
    }
    Ok(out.into_iter().collect())
}

pub fn has_group_access_to_component(
    graph: &BipartiteGraph<UserId, GroupId>,
    gc: &ComponentGrants<GroupId>,
    group: &GroupId,
    access: &ComponentAccess,
) -> Result<bool, AccessError> {
    let groups =
        reachable_groups_from_group(graph, group).map_err(|_| AccessError::GroupNotFound(group.clone()))?;
    Ok(groups.iter().any(|g| gc.contains(g, access)))
}

pub fn has_group_access_to_entity(
    graph: &BipartiteGraph<UserId, GroupId>,
    catalog: &EntityCatalog,
    ge: &EntityGrants<GroupId>,
    group: &GroupId,
    entity_type: &EntityType,
    entity: &Entity,
) -> Result<bool, AccessError> {
    ensure_entity_exists(catalog, entity_type, entity)?;
    let groups =
        reachable_groups_from_group(graph, group).map_err(|_| AccessError::GroupNotFound(group.clone()))?;
    Ok(groups.iter().any(|g| ge.contains(g, entity_type, entity)))
}

pub fn components_accessible_by_group(
    graph: &BipartiteGraph<UserId, GroupId>,
    gc: &ComponentGrants<GroupId>,
    group: &GroupId,
) -> Result<Vec<ComponentAccess>, AccessError> {
    let groups =
        reachable_groups_from_group(graph, group).map_err(|_| AccessError::GroupNotFound(group.clone()))?;
    let mut out: IndexSet<ComponentAccess> = IndexSet::new();
    for g in groups {
        out.extend(gc.get(&g));
    }
    Ok(out.into_iter().collect())
}

pub fn entities_accessible_by_group(
    graph: &BipartiteGraph<UserId, GroupId>,
    catalog: &EntityCatalog,
    ge: &EntityGrants<GroupId>,
    group: &GroupId,
    entity_type: Option<&EntityType>,
) -> Result<Vec<(EntityType, Entity)>, AccessError> {
    if let Some(t) = entity_type {
        if !catalog.contains_type(t) {
            return Err(AccessError::EntityTypeNotFound(t.clone()));
        }
    }
    let groups =
        reachable_groups_from_group(graph, group).map_err(|_| AccessError::GroupNotFound(group.clone()))?;
    let mut out: IndexSet<(EntityType, Entity)> = IndexSet::new();
    for g in groups {
        match entity_type {
            Some(t) => out.extend(ge.get(&g, t).map(|e| (t.clone(), e))),
            None => out.extend(ge.get_all(&g)),
        }
    }
    Ok(out.into_iter().collect())
}
