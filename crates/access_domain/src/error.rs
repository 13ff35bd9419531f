use crate::ids::{AccessLevel, ComponentId, Entity, EntityType, GroupId, UserId};

/// Wire-stable discriminant for [`AccessError`] (§6 "bit-exact mapping").
///
/// A hosting gRPC/REST adapter maps each kind to a status code; adding a new
/// [`AccessError`] variant must not change an existing [`AccessErrorKind`]
/// discriminant, hence `#[non_exhaustive]`.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessErrorKind {
    NotFound,
    AlreadyExists,
    CircularReference,
    SelfMapping,
    InvalidArgument,
}

/// The error taxonomy of §7, covering both the graph (C1) and the strict
/// access-manager surface (C3). Every variant carries the offending
/// parameter(s) as typed data, not just a rendered message, so callers can
/// build structured wire errors without parsing [`std::fmt::Display`] output.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("group {0} not found")]
    GroupNotFound(GroupId),
    #[error("entity type {0} not found")]
    EntityTypeNotFound(EntityType),
    #[error("entity {entity} of type {entity_type} not found")]
    EntityNotFound { entity_type: EntityType, entity: Entity },

    #[error("user {0} already exists")]
    UserAlreadyExists(UserId),
    #[error("group {0} already exists")]
    GroupAlreadyExists(GroupId),
    #[error("entity type {0} already exists")]
    EntityTypeAlreadyExists(EntityType),
    #[error("entity {entity} of type {entity_type} already exists")]
    EntityAlreadyExists { entity_type: EntityType, entity: Entity },

    #[error("mapping {user} -> {group} already exists")]
    UserGroupMappingAlreadyExists { user: UserId, group: GroupId },
    #[error("mapping {user} -> {group} not found")]
    UserGroupMappingNotFound { user: UserId, group: GroupId },
    #[error("mapping {from} -> {to} already exists")]
    GroupGroupMappingAlreadyExists { from: GroupId, to: GroupId },
    #[error("mapping {from} -> {to} not found")]
    GroupGroupMappingNotFound { from: GroupId, to: GroupId },
    #[error("mapping {user} -> {access} already exists")]
    UserComponentMappingAlreadyExists { user: UserId, access: ComponentAccessRef },
    #[error("mapping {user} -> {access} not found")]
    UserComponentMappingNotFound { user: UserId, access: ComponentAccessRef },
    #[error("mapping {group} -> {access} already exists")]
    GroupComponentMappingAlreadyExists { group: GroupId, access: ComponentAccessRef },
    #[error("mapping {group} -> {access} not found")]
    GroupComponentMappingNotFound { group: GroupId, access: ComponentAccessRef },
    #[error("mapping {user} -> {entity_type}:{entity} already exists")]
    UserEntityMappingAlreadyExists { user: UserId, entity_type: EntityType, entity: Entity },
    #[error("mapping {user} -> {entity_type}:{entity} not found")]
    UserEntityMappingNotFound { user: UserId, entity_type: EntityType, entity: Entity },
    #[error("mapping {group} -> {entity_type}:{entity} already exists")]
    GroupEntityMappingAlreadyExists { group: GroupId, entity_type: EntityType, entity: Entity },
    #[error("mapping {group} -> {entity_type}:{entity} not found")]
    GroupEntityMappingNotFound { group: GroupId, entity_type: EntityType, entity: Entity },

    #[error("group {0} cannot be mapped to itself")]
    SelfMapping(GroupId),
    #[error("group mapping {from} -> {to} would close a cycle")]
    CircularReference { from: GroupId, to: GroupId },

    #[error("invalid argument for {parameter}: {message}")]
    InvalidArgument { parameter: &'static str, message: String },
}

/// Helper newtype so `ComponentId`/`AccessLevel` pairs render as a single
/// `Display` argument in [`AccessError`] messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentAccessRef {
    pub component: ComponentId,
    pub access_level: AccessLevel,
}

impl std::fmt::Display for ComponentAccessRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.component, self.access_level)
    }
}

impl From<crate::ids::ComponentAccess> for ComponentAccessRef {
    fn from(value: crate::ids::ComponentAccess) -> Self {
        Self { component: value.component, access_level: value.access_level }
    }
}

impl AccessError {
    /// The wire-stable discriminant for this error, per §6.
    pub fn kind(&self) -> AccessErrorKind {
        use AccessError::*;
        match self {
            UserNotFound(_)
            | GroupNotFound(_)
            | EntityTypeNotFound(_)
            | EntityNotFound { .. }
            | UserGroupMappingNotFound { .. }
            | GroupGroupMappingNotFound { .. }
            | UserComponentMappingNotFound { .. }
            | GroupComponentMappingNotFound { .. }
            | UserEntityMappingNotFound { .. }
            | GroupEntityMappingNotFound { .. } => AccessErrorKind::NotFound,

            UserAlreadyExists(_)
            | GroupAlreadyExists(_)
            | EntityTypeAlreadyExists(_)
            | EntityAlreadyExists { .. }
            | UserGroupMappingAlreadyExists { .. }
            | GroupGroupMappingAlreadyExists { .. }
            | UserComponentMappingAlreadyExists { .. }
            | GroupComponentMappingAlreadyExists { .. }
            | UserEntityMappingAlreadyExists { .. }
            | GroupEntityMappingAlreadyExists { .. } => AccessErrorKind::AlreadyExists,

            CircularReference { .. } => AccessErrorKind::CircularReference,
            SelfMapping(_) => AccessErrorKind::SelfMapping,
            InvalidArgument { .. } => AccessErrorKind::InvalidArgument,
        }
    }

    /// `true` for the "uniqueness violation" family (§7 `AlreadyExists`),
    /// which C5 collapses into a no-op rather than surfacing to callers.
    pub fn is_already_exists(&self) -> bool {
        self.kind() == AccessErrorKind::AlreadyExists
    }

    /// `true` for the "referenced element absent" family (§7 `NotFound`),
    /// which C5 resolves by prepending the missing prerequisite.
    pub fn is_not_found(&self) -> bool {
        self.kind() == AccessErrorKind::NotFound
    }
}
