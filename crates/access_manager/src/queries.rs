//! The four orthogonal query-processor contracts of §6, each a thin
//! read-only slice of [`AccessManager`] blanket-implemented for any
//! conforming manager. A hosting adapter (out of scope here) wires one
//! HTTP/gRPC endpoint per method of whichever interface it needs, without
//! depending on the mutating half of the contract.

use access_domain::{AccessError, ComponentAccess, Entity, EntityType, GroupId, UserId};

use crate::manager::AccessManager;

/// Entity catalog reads: existence and enumeration of entity types/entities.
pub trait EntityQuery {
    fn contains_entity_type(&self, entity_type: &EntityType) -> bool;
    fn entity_types(&self) -> Vec<EntityType>;
    fn contains_entity(&self, entity_type: &EntityType, entity: &Entity) -> bool;
    fn entities(&self, entity_type: &EntityType) -> Result<Vec<Entity>, AccessError>;
}

impl<T: AccessManager + ?Sized> EntityQuery for T {
    fn contains_entity_type(&self, entity_type: &EntityType) -> bool {
        AccessManager::contains_entity_type(self, entity_type)
    }
    fn entity_types(&self) -> Vec<EntityType> {
        AccessManager::entity_types(self)
    }
    fn contains_entity(&self, entity_type: &EntityType, entity: &Entity) -> bool {
        AccessManager::contains_entity(self, entity_type, entity)
    }
    fn entities(&self, entity_type: &EntityType) -> Result<Vec<Entity>, AccessError> {
        AccessManager::entities(self, entity_type)
    }
}

/// A group's own existence and direct mapping reads (not its ancestry).
pub trait GroupQuery {
    fn contains_group(&self, group: &GroupId) -> bool;
    fn groups(&self) -> Vec<GroupId>;
    fn get_group_to_component_mappings(&self, group: &GroupId) -> Result<Vec<ComponentAccess>, AccessError>;
    fn get_group_to_entity_mappings(
        &self,
        group: &GroupId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError>;
}

impl<T: AccessManager + ?Sized> GroupQuery for T {
    fn contains_group(&self, group: &GroupId) -> bool {
        AccessManager::contains_group(self, group)
    }
    fn groups(&self) -> Vec<GroupId> {
        AccessManager::groups(self)
    }
    fn get_group_to_component_mappings(&self, group: &GroupId) -> Result<Vec<ComponentAccess>, AccessError> {
        AccessManager::get_group_to_component_mappings(self, group)
    }
    fn get_group_to_entity_mappings(
        &self,
        group: &GroupId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        AccessManager::get_group_to_entity_mappings(self, group, entity_type)
    }
}

/// Group hierarchy reads: direct group→group edges plus reachability
/// queries rooted at a group.
pub trait GroupToGroupQuery {
    fn get_group_to_group_mappings(&self, from: &GroupId) -> Result<Vec<GroupId>, AccessError>;
    fn has_group_access_to_component(&self, group: &GroupId, access: &ComponentAccess) -> Result<bool, AccessError>;
    fn has_group_access_to_entity(
        &self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<bool, AccessError>;
    fn get_components_accessible_by_group(&self, group: &GroupId) -> Result<Vec<ComponentAccess>, AccessError>;
    fn get_entities_accessible_by_group(
        &self,
        group: &GroupId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError>;
}

impl<T: AccessManager + ?Sized> GroupToGroupQuery for T {
    fn get_group_to_group_mappings(&self, from: &GroupId) -> Result<Vec<GroupId>, AccessError> {
        AccessManager::get_group_to_group_mappings(self, from)
    }
    fn has_group_access_to_component(&self, group: &GroupId, access: &ComponentAccess) -> Result<bool, AccessError> {
        AccessManager::has_group_access_to_component(self, group, access)
    }
    fn has_group_access_to_entity(
        &self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<bool, AccessError> {
        AccessManager::has_group_access_to_entity(self, group, entity_type, entity)
    }
    fn get_components_accessible_by_group(&self, group: &GroupId) -> Result<Vec<ComponentAccess>, AccessError> {
        AccessManager::get_components_accessible_by_group(self, group)
    }
    fn get_entities_accessible_by_group(
        &self,
        group: &GroupId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        AccessManager::get_entities_accessible_by_group(self, group, entity_type)
    }
}

/// User-rooted reads: existence, direct group memberships, and the
/// reachability queries (`HasAccessTo*`, `GetAccessibleBy*`).
pub trait UserQuery {
    fn contains_user(&self, user: &UserId) -> bool;
    fn users(&self) -> Vec<UserId>;
    fn get_user_to_group_mappings(&self, user: &UserId) -> Result<Vec<GroupId>, AccessError>;
    fn has_access_to_component(&self, user: &UserId, access: &ComponentAccess) -> bool;
    fn has_access_to_entity(
        &self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<bool, AccessError>;
    fn get_components_accessible_by_user(&self, user: &UserId) -> Vec<ComponentAccess>;
    fn get_entities_accessible_by_user(
        &self,
        user: &UserId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError>;
}

impl<T: AccessManager + ?Sized> UserQuery for T {
    fn contains_user(&self, user: &UserId) -> bool {
        AccessManager::contains_user(self, user)
    }
    fn users(&self) -> Vec<UserId> {
        AccessManager::users(self)
    }
    fn get_user_to_group_mappings(&self, user: &UserId) -> Result<Vec<GroupId>, AccessError> {
        AccessManager::get_user_to_group_mappings(self, user)
    }
    fn has_access_to_component(&self, user: &UserId, access: &ComponentAccess) -> bool {
        AccessManager::has_access_to_component(self, user, access)
    }
    fn has_access_to_entity(
        &self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<bool, AccessError> {
        AccessManager::has_access_to_entity(self, user, entity_type, entity)
    }
    fn get_components_accessible_by_user(&self, user: &UserId) -> Vec<ComponentAccess> {
        AccessManager::get_components_accessible_by_user(self, user)
    }
    fn get_entities_accessible_by_user(
        &self,
        user: &UserId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        AccessManager::get_entities_accessible_by_user(self, user, entity_type)
    }
}
