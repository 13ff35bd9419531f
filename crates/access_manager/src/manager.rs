use access_domain::{AccessError, ComponentAccess, Entity, EntityType, GroupId, UserId};

/// The canonical C3 surface (§4.3): strict adds/removes over users, groups,
/// entities, and the four mapping relations, plus the reachability queries.
///
/// Expressed as a trait (§9 "composition, not inheritance") rather than a
/// concrete base struct so [`crate::dependency_free::DependencyFreeAccessManager`]
/// can wrap any conforming manager by ownership. [`crate::strict::StrictAccessManager`]
/// is the only implementer: [`crate::concurrent::ConcurrentAccessManager`]
/// needs `&self` mutators to make its locking discipline worth anything, so
/// it exposes the same operations as inherent methods instead of through
/// this trait.
///
/// Every failure mode named in §4.3's failure model is a typed
/// [`AccessError`] variant; there is no string-typed error anywhere in this
/// surface.
pub trait AccessManager {
    // --- users / groups ------------------------------------------------

    fn add_user(&mut self, user: UserId) -> Result<(), AccessError>;
    fn remove_user(&mut self, user: &UserId) -> Result<(), AccessError>;
    fn contains_user(&self, user: &UserId) -> bool;
    fn users(&self) -> Vec<UserId>;

    fn add_group(&mut self, group: GroupId) -> Result<(), AccessError>;
    fn remove_group(&mut self, group: &GroupId) -> Result<(), AccessError>;
    fn contains_group(&self, group: &GroupId) -> bool;
    fn groups(&self) -> Vec<GroupId>;

    // --- entity catalog --------------------------------------------------

    fn add_entity_type(&mut self, entity_type: EntityType) -> Result<(), AccessError>;
    fn remove_entity_type(&mut self, entity_type: &EntityType) -> Result<(), AccessError>;
    fn contains_entity_type(&self, entity_type: &EntityType) -> bool;
    fn entity_types(&self) -> Vec<EntityType>;

    fn add_entity(&mut self, entity_type: &EntityType, entity: Entity) -> Result<(), AccessError>;
    fn remove_entity(&mut self, entity_type: &EntityType, entity: &Entity) -> Result<(), AccessError>;
    fn contains_entity(&self, entity_type: &EntityType, entity: &Entity) -> bool;
    fn entities(&self, entity_type: &EntityType) -> Result<Vec<Entity>, AccessError>;

    // --- mappings --------------------------------------------------------

    fn add_user_to_group_mapping(&mut self, user: &UserId, group: &GroupId) -> Result<(), AccessError>;
    fn remove_user_to_group_mapping(&mut self, user: &UserId, group: &GroupId) -> Result<(), AccessError>;
    fn get_user_to_group_mappings(&self, user: &UserId) -> Result<Vec<GroupId>, AccessError>;

    /// Fails with [`AccessError::SelfMapping`] if `from == to`; fails with
    /// [`AccessError::CircularReference`] if the edge would close a cycle
    /// in the non-leaf subgraph.
    fn add_group_to_group_mapping(&mut self, from: &GroupId, to: &GroupId) -> Result<(), AccessError>;
    fn remove_group_to_group_mapping(&mut self, from: &GroupId, to: &GroupId) -> Result<(), AccessError>;
    fn get_group_to_group_mappings(&self, from: &GroupId) -> Result<Vec<GroupId>, AccessError>;

    fn add_user_to_component_mapping(&mut self, user: &UserId, access: ComponentAccess) -> Result<(), AccessError>;
    fn remove_user_to_component_mapping(&mut self, user: &UserId, access: &ComponentAccess) -> Result<(), AccessError>;
    fn get_user_to_component_mappings(&self, user: &UserId) -> Result<Vec<ComponentAccess>, AccessError>;

    fn add_group_to_component_mapping(&mut self, group: &GroupId, access: ComponentAccess) -> Result<(), AccessError>;
    fn remove_group_to_component_mapping(&mut self, group: &GroupId, access: &ComponentAccess) -> Result<(), AccessError>;
    fn get_group_to_component_mappings(&self, group: &GroupId) -> Result<Vec<ComponentAccess>, AccessError>;

    fn add_user_to_entity_mapping(
        &mut self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError>;
    fn remove_user_to_entity_mapping(
        &mut self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError>;
    fn get_user_to_entity_mappings(
        &self,
        user: &UserId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError>;

    fn add_group_to_entity_mapping(
        &mut self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError>;
    fn remove_group_to_entity_mapping(
        &mut self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError>;
    fn get_group_to_entity_mappings(
        &self,
        group: &GroupId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError>;

    // --- queries -----------------------------------------------------------

    /// `true` iff `user` holds `access` directly or via a reachable group.
    /// A missing `user` is not a failure: it simply has no access.
    fn has_access_to_component(&self, user: &UserId, access: &ComponentAccess) -> bool;

    /// `true` iff `user` holds access to `entity` directly or via a
    /// reachable group. Fails if `entity_type`/`entity` are not registered
    /// in the entity catalog; a missing `user` is not a failure.
    fn has_access_to_entity(
        &self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<bool, AccessError>;

    /// The union of `user`'s direct component grants and those of every
    /// group reachable from `user`. Empty (not an error) for an unknown
    /// user.
    fn get_components_accessible_by_user(&self, user: &UserId) -> Vec<ComponentAccess>;

    /// The union of `user`'s direct entity grants and those of every group
    /// reachable from `user`, optionally filtered to one entity type.
    fn get_entities_accessible_by_user(
        &self,
        user: &UserId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError>;

    // --- group-rooted variants ----------------------------------------

    fn has_group_access_to_component(
        &self,
        group: &GroupId,
        access: &ComponentAccess,
    ) -> Result<bool, AccessError>;

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
