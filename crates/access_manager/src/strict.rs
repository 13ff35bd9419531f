//! The strict access manager base (C3): literal translation of the
//! authorization vocabulary onto [`BipartiteGraph`] + the C2 mapping
//! stores. No idempotency, no locking — every precondition violation is a
//! typed [`AccessError`].

use access_domain::{
    AccessError, ComponentAccess, ComponentGrants, Entity, EntityCatalog, EntityGrants, EntityType,
    GroupId, UserId,
};
use access_graph::BipartiteGraph;

use crate::logic::{self, convert_graph_error};
use crate::manager::AccessManager;

/// The strict, non-idempotent, non-locking access manager (C3).
#[derive(Clone, Default)]
pub struct StrictAccessManager {
    graph: BipartiteGraph<UserId, GroupId>,
    uc: ComponentGrants<UserId>,
    gc: ComponentGrants<GroupId>,
    ue: EntityGrants<UserId>,
    ge: EntityGrants<GroupId>,
    catalog: EntityCatalog,
}

impl StrictAccessManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccessManager for StrictAccessManager {
    fn add_user(&mut self, user: UserId) -> Result<(), AccessError> {
        self.graph.add_leaf(user).map_err(convert_graph_error)
    }

    fn remove_user(&mut self, user: &UserId) -> Result<(), AccessError> {
        self.graph.remove_leaf(user).map_err(convert_graph_error)?;
        self.uc.remove_key(user);
        self.ue.remove_key(user);
        Ok(())
    }

    fn contains_user(&self, user: &UserId) -> bool {
        self.graph.contains_leaf(user)
    }

    fn users(&self) -> Vec<UserId> {
        self.graph.leaves().cloned().collect()
    }

    fn add_group(&mut self, group: GroupId) -> Result<(), AccessError> {
        self.graph.add_non_leaf(group).map_err(convert_graph_error)
    }

    fn remove_group(&mut self, group: &GroupId) -> Result<(), AccessError> {
        self.graph.remove_non_leaf(group).map_err(convert_graph_error)?;
        self.gc.remove_key(group);
        self.ge.remove_key(group);
        Ok(())
    }

    fn contains_group(&self, group: &GroupId) -> bool {
        self.graph.contains_non_leaf(group)
    }

    fn groups(&self) -> Vec<GroupId> {
        self.graph.non_leaves().cloned().collect()
    }

    fn add_entity_type(&mut self, entity_type: EntityType) -> Result<(), AccessError> {
        self.catalog.add_type(entity_type)
    }

    fn remove_entity_type(&mut self, entity_type: &EntityType) -> Result<(), AccessError> {
        self.catalog.remove_type(entity_type)?;
        self.ue.remove_type(entity_type);
        self.ge.remove_type(entity_type);
        Ok(())
    }

    fn contains_entity_type(&self, entity_type: &EntityType) -> bool {
        self.catalog.contains_type(entity_type)
    }

    fn entity_types(&self) -> Vec<EntityType> {
        self.catalog.types().cloned().collect()
    }

    fn add_entity(&mut self, entity_type: &EntityType, entity: Entity) -> Result<(), AccessError> {
        self.catalog.add_entity(entity_type, entity)
    }

    fn remove_entity(&mut self, entity_type: &EntityType, entity: &Entity) -> Result<(), AccessError> {
        self.catalog.remove_entity(entity_type, entity)?;
        self.ue.remove_entity(entity_type, entity);
        self.ge.remove_entity(entity_type, entity);
        Ok(())
    }

    fn contains_entity(&self, entity_type: &EntityType, entity: &Entity) -> bool {
        self.catalog.contains_entity(entity_type, entity)
    }

    fn entities(&self, entity_type: &EntityType) -> Result<Vec<Entity>, AccessError> {
        if !self.catalog.contains_type(entity_type) {
            return Err(AccessError::EntityTypeNotFound(entity_type.clone()));
        }
        Ok(self.catalog.entities(entity_type).cloned().collect())
    }

    fn add_user_to_group_mapping(&mut self, user: &UserId, group: &GroupId) -> Result<(), AccessError> {
        self.graph.add_leaf_edge(user, group).map_err(convert_graph_error)
    }

    fn remove_user_to_group_mapping(&mut self, user: &UserId, group: &GroupId) -> Result<(), AccessError> {
        self.graph.remove_leaf_edge(user, group).map_err(convert_graph_error)
    }

    fn get_user_to_group_mappings(&self, user: &UserId) -> Result<Vec<GroupId>, AccessError> {
        self.graph
            .get_leaf_edges(user)
            .map(|it| it.collect())
            .map_err(convert_graph_error)
    }

    fn add_group_to_group_mapping(&mut self, from: &GroupId, to: &GroupId) -> Result<(), AccessError> {
        if from == to {
            return Err(AccessError::SelfMapping(from.clone()));
        }
        self.graph.add_non_leaf_edge(from, to).map_err(convert_graph_error)
    }

    fn remove_group_to_group_mapping(&mut self, from: &GroupId, to: &GroupId) -> Result<(), AccessError> {
        self.graph.remove_non_leaf_edge(from, to).map_err(convert_graph_error)
    }

    fn get_group_to_group_mappings(&self, from: &GroupId) -> Result<Vec<GroupId>, AccessError> {
        self.graph
            .get_non_leaf_edges(from)
            .map(|it| it.collect())
            .map_err(convert_graph_error)
    }

    fn add_user_to_component_mapping(&mut self, user: &UserId, access: ComponentAccess) -> Result<(), AccessError> {
        if !self.graph.contains_leaf(user) {
            return Err(AccessError::UserNotFound(user.clone()));
        }
        if !self.uc.add(user.clone(), access) {
            return Err(AccessError::UserComponentMappingAlreadyExists {
                user: user.clone(),
                access: access.into(),
            });
        }
        Ok(())
    }

    fn remove_user_to_component_mapping(
        &mut self,
        user: &UserId,
        access: &ComponentAccess,
    ) -> Result<(), AccessError> {
        if !self.uc.remove(user, access) {
            return Err(AccessError::UserComponentMappingNotFound {
                user: user.clone(),
                access: (*access).into(),
            });
        }
        Ok(())
    }

    fn get_user_to_component_mappings(&self, user: &UserId) -> Result<Vec<ComponentAccess>, AccessError> {
        if !self.graph.contains_leaf(user) {
            return Err(AccessError::UserNotFound(user.clone()));
        }
        Ok(self.uc.get(user).collect())
    }

    fn add_group_to_component_mapping(&mut self, group: &GroupId, access: ComponentAccess) -> Result<(), AccessError> {
        if !self.graph.contains_non_leaf(group) {
            return Err(AccessError::GroupNotFound(group.clone()));
        }
        if !self.gc.add(group.clone(), access) {
            return Err(AccessError::GroupComponentMappingAlreadyExists {
                group: group.clone(),
                access: access.into(),
            });
        }
        Ok(())
    }

    fn remove_group_to_component_mapping(
        &mut self,
        group: &GroupId,
        access: &ComponentAccess,
    ) -> Result<(), AccessError> {
        if !self.gc.remove(group, access) {
            return Err(AccessError::GroupComponentMappingNotFound {
                group: group.clone(),
                access: (*access).into(),
            });
        }
        Ok(())
    }

    fn get_group_to_component_mappings(&self, group: &GroupId) -> Result<Vec<ComponentAccess>, AccessError> {
        if !self.graph.contains_non_leaf(group) {
            return Err(AccessError::GroupNotFound(group.clone()));
        }
        Ok(self.gc.get(group).collect())
    }

    fn add_user_to_entity_mapping(
        &mut self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        if !self.graph.contains_leaf(user) {
            return Err(AccessError::UserNotFound(user.clone()));
        }
        logic::ensure_entity_exists(&self.catalog, entity_type, entity)?;
        if !self.ue.add(user.clone(), entity_type.clone(), entity.clone()) {
            return Err(AccessError::UserEntityMappingAlreadyExists {
                user: user.clone(),
                entity_type: entity_type.clone(),
                entity: entity.clone(),
            });
        }
        Ok(())
    }

    fn remove_user_to_entity_mapping(
        &mut self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        if !self.ue.remove(user, entity_type, entity) {
            return Err(AccessError::UserEntityMappingNotFound {
                user: user.clone(),
                entity_type: entity_type.clone(),
                entity: entity.clone(),
            });
        }
        Ok(())
    }

    fn get_user_to_entity_mappings(
        &self,
        user: &UserId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        if !self.graph.contains_leaf(user) {
            return Err(AccessError::UserNotFound(user.clone()));
        }
        match entity_type {
            Some(t) => {
                if !self.catalog.contains_type(t) {
                    return Err(AccessError::EntityTypeNotFound(t.clone()));
                }
                Ok(self.ue.get(user, t).map(|e| (t.clone(), e)).collect())
            }
            None => Ok(self.ue.get_all(user).collect()),
        }
    }

    fn add_group_to_entity_mapping(
        &mut self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        if !self.graph.contains_non_leaf(group) {
            return Err(AccessError::GroupNotFound(group.clone()));
        }
        logic::ensure_entity_exists(&self.catalog, entity_type, entity)?;
        if !self.ge.add(group.clone(), entity_type.clone(), entity.clone()) {
            return Err(AccessError::GroupEntityMappingAlreadyExists {
                group: group.clone(),
                entity_type: entity_type.clone(),
                entity: entity.clone(),
            });
        }
        Ok(())
    }

    fn remove_group_to_entity_mapping(
        &mut self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        if !self.ge.remove(group, entity_type, entity) {
            return Err(AccessError::GroupEntityMappingNotFound {
                group: group.clone(),
                entity_type: entity_type.clone(),
                entity: entity.clone(),
            });
        }
        Ok(())
    }

    fn get_group_to_entity_mappings(
        &self,
        group: &GroupId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        if !self.graph.contains_non_leaf(group) {
            return Err(AccessError::GroupNotFound(group.clone()));
        }
        match entity_type {
            Some(t) => {
                if !self.catalog.contains_type(t) {
                    return Err(AccessError::EntityTypeNotFound(t.clone()));
                }
                Ok(self.ge.get(group, t).map(|e| (t.clone(), e)).collect())
            }
            None => Ok(self.ge.get_all(group).collect()),
        }
    }

    fn has_access_to_component(&self, user: &UserId, access: &ComponentAccess) -> bool {
        logic::has_access_to_component(&self.graph, &self.uc, &self.gc, user, access)
    }

    fn has_access_to_entity(
        &self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<bool, AccessError> {
        logic::has_access_to_entity(&self.graph, &self.catalog, &self.ue, &self.ge, user, entity_type, entity)
    }

    fn get_components_accessible_by_user(&self, user: &UserId) -> Vec<ComponentAccess> {
        logic::components_accessible_by_user(&self.graph, &self.uc, &self.gc, user)
    }

    fn get_entities_accessible_by_user(
        &self,
        user: &UserId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        logic::entities_accessible_by_user(&self.graph, &self.catalog, &self.ue, &self.ge, user, entity_type)
    }

    fn has_group_access_to_component(&self, group: &GroupId, access: &ComponentAccess) -> Result<bool, AccessError> {
        logic::has_group_access_to_component(&self.graph, &self.gc, group, access)
    }

    fn has_group_access_to_entity(
        &self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<bool, AccessError> {
        logic::has_group_access_to_entity(&self.graph, &self.catalog, &self.ge, group, entity_type, entity)
    }

    fn get_components_accessible_by_group(&self, group: &GroupId) -> Result<Vec<ComponentAccess>, AccessError> {
        logic::components_accessible_by_group(&self.graph, &self.gc, group)
    }

    fn get_entities_accessible_by_group(
        &self,
        group: &GroupId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        logic::entities_accessible_by_group(&self.graph, &self.catalog, &self.ge, group, entity_type)
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
    fn et(s: &str) -> EntityType {
        EntityType::new(s).unwrap()
    }
    fn ent(s: &str) -> Entity {
        Entity::new(s).unwrap()
    }

    #[test]
    fn direct_grant_scenario() {
        let mut m = StrictAccessManager::new();
        m.add_user(uid("alice")).unwrap();
        m.add_entity_type(et("account")).unwrap();
        m.add_entity(&et("account"), ent("acme")).unwrap();
        m.add_user_to_entity_mapping(&uid("alice"), &et("account"), &ent("acme")).unwrap();

        assert!(m.has_access_to_entity(&uid("alice"), &et("account"), &ent("acme")).unwrap());

        m.add_entity(&et("account"), ent("other")).unwrap();
        assert!(!m.has_access_to_entity(&uid("alice"), &et("account"), &ent("other")).unwrap());
        assert!(!m.has_access_to_entity(&uid("bob"), &et("account"), &ent("acme")).unwrap());
    }

    #[test]
    fn transitive_grant_scenario() {
        let mut m = StrictAccessManager::new();
        m.add_user(uid("u")).unwrap();
        m.add_group(gid("g1")).unwrap();
        m.add_group(gid("g2")).unwrap();
        m.add_user_to_group_mapping(&uid("u"), &gid("g1")).unwrap();
        m.add_group_to_group_mapping(&gid("g1"), &gid("g2")).unwrap();
        m.add_entity_type(et("t")).unwrap();
        m.add_entity(&et("t"), ent("e")).unwrap();
        m.add_group_to_entity_mapping(&gid("g2"), &et("t"), &ent("e")).unwrap();

        assert!(m.has_access_to_entity(&uid("u"), &et("t"), &ent("e")).unwrap());
        let entities = m.get_entities_accessible_by_user(&uid("u"), Some(&et("t"))).unwrap();
        assert_eq!(entities, vec![(et("t"), ent("e"))]);
    }

    #[test]
    fn cycle_rejected_without_mutation() {
        let mut m = StrictAccessManager::new();
        for g in ["a", "b", "c"] {
            m.add_group(gid(g)).unwrap();
        }
        m.add_group_to_group_mapping(&gid("a"), &gid("b")).unwrap();
        m.add_group_to_group_mapping(&gid("b"), &gid("c")).unwrap();
        let err = m.add_group_to_group_mapping(&gid("c"), &gid("a")).unwrap_err();
        assert!(matches!(err, AccessError::CircularReference { .. }));
        assert!(m.get_group_to_group_mappings(&gid("c")).unwrap().is_empty());
    }

    #[test]
    fn self_mapping_rejected() {
        let mut m = StrictAccessManager::new();
        m.add_group(gid("a")).unwrap();
        let err = m.add_group_to_group_mapping(&gid("a"), &gid("a")).unwrap_err();
        assert!(matches!(err, AccessError::SelfMapping(_)));
    }

    #[test]
    fn cascade_on_group_removal() {
        let mut m = StrictAccessManager::new();
        m.add_user(uid("u")).unwrap();
        m.add_group(gid("g1")).unwrap();
        m.add_group(gid("g2")).unwrap();
        m.add_user_to_group_mapping(&uid("u"), &gid("g1")).unwrap();
        m.add_group_to_group_mapping(&gid("g1"), &gid("g2")).unwrap();
        m.add_entity_type(et("t")).unwrap();
        m.add_entity(&et("t"), ent("e")).unwrap();
        m.add_group_to_entity_mapping(&gid("g2"), &et("t"), &ent("e")).unwrap();

        m.remove_group(&gid("g2")).unwrap();

        assert!(m.get_entities_accessible_by_user(&uid("u"), Some(&et("t"))).unwrap().is_empty());
        assert!(!m.contains_group(&gid("g2")));
        assert!(m.get_group_to_group_mappings(&gid("g1")).unwrap().is_empty());
    }

    #[test]
    fn remove_user_cascades_everywhere() {
        let mut m = StrictAccessManager::new();
        m.add_user(uid("u")).unwrap();
        m.add_group(gid("g")).unwrap();
        m.add_user_to_group_mapping(&uid("u"), &gid("g")).unwrap();
        m.add_user_to_component_mapping(&uid("u"), ComponentAccess::new(1.into(), 1.into())).unwrap();

        m.remove_user(&uid("u")).unwrap();

        assert!(!m.contains_user(&uid("u")));
        assert!(!m.has_access_to_component(&uid("u"), &ComponentAccess::new(1.into(), 1.into())));
        assert!(m.get_group_to_group_mappings(&gid("g")).unwrap().is_empty());
    }
}
