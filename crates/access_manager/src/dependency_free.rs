//! The dependency-free access manager (C5): wraps any [`AccessManager`] to
//! make every mutation idempotent and dependency-auto-creating, and emits
//! the canonical event stream (§4.5).
//!
//! Holds the wrapped manager by ownership (§9 "composition, not
//! inheritance") rather than inheriting from it, so it works over any
//! conforming `M: AccessManager` — in practice
//! [`crate::strict::StrictAccessManager`], since
//! [`crate::concurrent::ConcurrentAccessManager`]'s `&self` mutators don't
//! implement this trait (see that module).

use std::sync::Arc;

use access_domain::{
    AccessError, ComponentAccess, Entity, EntityType, EventAction, EventMeta, EventPayload,
    EventProcessor, EventRecord, GroupId, NullEventProcessor, UserId,
};
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::hash_provider::{FoldHashCodeProvider, HashCodeProvider};
use crate::id_gen::{IdGenerator, UuidV4Generator};
use crate::manager::AccessManager;

/// Which family of operation produced an idempotency signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdempotencyKind {
    Add,
    Remove,
}

/// Side-channel invoked when `signal_idempotency` is enabled and a mutation
/// had no effect (§7: `IdempotentAddFailure`/`IdempotentRemoveFailure` "never
/// crosses the process boundary" — callers only ever see `Ok(())`, this hook
/// is the only place the signal is observable, and it is meant for
/// metric-logging wrappers outside this crate).
pub type IdempotencyHook = Arc<dyn Fn(IdempotencyKind, &'static str) + Send + Sync>;

/// The dependency-free, idempotent, event-emitting layer (C5).
pub struct DependencyFreeAccessManager<M: AccessManager> {
    inner: M,
    processor: Box<dyn EventProcessor + Send>,
    clock: Box<dyn Clock>,
    id_gen: Box<dyn IdGenerator>,
    hash_provider: Box<dyn HashCodeProvider>,
    signal_idempotency: bool,
    idempotency_hook: Option<IdempotencyHook>,
}

impl<M: AccessManager + Default> Default for DependencyFreeAccessManager<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<M: AccessManager> DependencyFreeAccessManager<M> {
    /// Builds a wrapper with the default, `std`-backed dependencies and
    /// idempotency signalling off, matching §4.5's default.
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            processor: Box::new(NullEventProcessor),
            clock: Box::new(SystemClock),
            id_gen: Box::new(UuidV4Generator),
            hash_provider: Box::new(FoldHashCodeProvider),
            signal_idempotency: false,
            idempotency_hook: None,
        }
    }

    pub fn with_event_processor(mut self, processor: impl EventProcessor + Send + 'static) -> Self {
        self.processor = Box::new(processor);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_id_generator(mut self, id_gen: impl IdGenerator + 'static) -> Self {
        self.id_gen = Box::new(id_gen);
        self
    }

    pub fn with_hash_provider(mut self, hash_provider: impl HashCodeProvider + 'static) -> Self {
        self.hash_provider = Box::new(hash_provider);
        self
    }

    pub fn with_idempotency_signalling(mut self, hook: IdempotencyHook) -> Self {
        self.signal_idempotency = true;
        self.idempotency_hook = Some(hook);
        self
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    fn signal(&self, kind: IdempotencyKind, op: &'static str) {
        if !self.signal_idempotency {
            return;
        }
        if let Some(hook) = &self.idempotency_hook {
            hook(kind, op);
        }
    }

    fn stamp(&self, payload: EventPayload, action: EventAction) -> EventRecord {
        let meta = EventMeta {
            event_id: self.id_gen.next_id(),
            occurred_at: self.clock.now(),
            hash_code: self.hash_provider.hash_code(payload.routing_key()),
        };
        EventRecord { meta, action, payload }
    }

    /// Emits `record` to the configured processor. On failure, rolls back
    /// `undo` against `self.inner` and propagates the processor's error — the
    /// resolved Open Question of §9: either both the local mutation and the
    /// emission commit, or neither does.
    ///
    /// Used where `undo` is cheap and lossless: adds (undo is the matching
    /// remove) and the six leaf-mapping removes (undo is re-adding the same
    /// mapping). The four cascading removes (`remove_user`, `remove_group`,
    /// `remove_entity_type`, `remove_entity`) cannot use this helper — their
    /// cascade deletes state an `undo` closure could not reconstruct — so
    /// they emit before mutating instead; see their doc comments.
    fn emit_or_rollback(
        &mut self,
        record: EventRecord,
        undo: impl FnOnce(&mut M),
    ) -> Result<(), AccessError> {
        trace!(event_id = %record.meta.event_id, "emitting event");
        if let Err(err) = self.processor.process(record) {
            debug!(error = %err, "event processor rejected emission, rolling back local mutation");
            undo(&mut self.inner);
            return Err(err);
        }
        Ok(())
    }

    /// Ensures `user` exists, prepending `AddUser` (mutate + emit) if not.
    /// Returns `Ok(())` once `user` is present one way or another.
    fn ensure_user(&mut self, user: &UserId) -> Result<(), AccessError> {
        if self.inner.contains_user(user) {
            return Ok(());
        }
        self.inner.add_user(user.clone())?;
        let record = self.stamp(EventPayload::UserEvent { user: user.clone() }, EventAction::Add);
        let undo_user = user.clone();
        self.emit_or_rollback(record, |m| {
            let _ = m.remove_user(&undo_user);
        })
    }

    fn ensure_group(&mut self, group: &GroupId) -> Result<(), AccessError> {
        if self.inner.contains_group(group) {
            return Ok(());
        }
        self.inner.add_group(group.clone())?;
        let record = self.stamp(EventPayload::GroupEvent { group: group.clone() }, EventAction::Add);
        let undo_group = group.clone();
        self.emit_or_rollback(record, |m| {
            let _ = m.remove_group(&undo_group);
        })
    }

    fn ensure_entity_type(&mut self, entity_type: &EntityType) -> Result<(), AccessError> {
        if self.inner.contains_entity_type(entity_type) {
            return Ok(());
        }
        self.inner.add_entity_type(entity_type.clone())?;
        let record =
            self.stamp(EventPayload::EntityTypeEvent { entity_type: entity_type.clone() }, EventAction::Add);
        let undo_type = entity_type.clone();
        self.emit_or_rollback(record, |m| {
            let _ = m.remove_entity_type(&undo_type);
        })
    }

    fn ensure_entity(&mut self, entity_type: &EntityType, entity: &Entity) -> Result<(), AccessError> {
        self.ensure_entity_type(entity_type)?;
        if self.inner.contains_entity(entity_type, entity) {
            return Ok(());
        }
        self.inner.add_entity(entity_type, entity.clone())?;
        let record = self.stamp(
            EventPayload::EntityEvent { entity_type: entity_type.clone(), entity: entity.clone() },
            EventAction::Add,
        );
        let undo_type = entity_type.clone();
        let undo_entity = entity.clone();
        self.emit_or_rollback(record, move |m| {
            let _ = m.remove_entity(&undo_type, &undo_entity);
        })
    }

    pub fn add_user(&mut self, user: UserId) -> Result<(), AccessError> {
        match self.inner.add_user(user.clone()) {
            Ok(()) => {
                let record = self.stamp(EventPayload::UserEvent { user: user.clone() }, EventAction::Add);
                self.emit_or_rollback(record, move |m| {
                    let _ = m.remove_user(&user);
                })
            }
            Err(e) if e.is_already_exists() => {
                self.signal(IdempotencyKind::Add, "add_user");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Removing a user cascades through `UC[user]`, `UE[user]`, and every
    /// edge touching it, which an `undo` closure cannot losslessly rebuild —
    /// unlike an add, where the inverse mutation is always just the matching
    /// remove. So this emits first and only applies the cascade once the
    /// processor has accepted the event: a rejected emission leaves local
    /// state untouched rather than needing to be unwound.
    pub fn remove_user(&mut self, user: &UserId) -> Result<(), AccessError> {
        if !self.inner.contains_user(user) {
            self.signal(IdempotencyKind::Remove, "remove_user");
            return Ok(());
        }
        let record = self.stamp(EventPayload::UserEvent { user: user.clone() }, EventAction::Remove);
        trace!(event_id = %record.meta.event_id, "emitting event");
        self.processor.process(record)?;
        self.inner.remove_user(user)
    }

    pub fn add_group(&mut self, group: GroupId) -> Result<(), AccessError> {
        match self.inner.add_group(group.clone()) {
            Ok(()) => {
                let record = self.stamp(EventPayload::GroupEvent { group: group.clone() }, EventAction::Add);
                self.emit_or_rollback(record, move |m| {
                    let _ = m.remove_group(&group);
                })
            }
            Err(e) if e.is_already_exists() => {
                self.signal(IdempotencyKind::Add, "add_group");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Cascades through `GC[group]`/`GE[group]` and its edges; see
    /// [`Self::remove_user`] for why that rules out `emit_or_rollback`.
    pub fn remove_group(&mut self, group: &GroupId) -> Result<(), AccessError> {
        if !self.inner.contains_group(group) {
            self.signal(IdempotencyKind::Remove, "remove_group");
            return Ok(());
        }
        let record = self.stamp(EventPayload::GroupEvent { group: group.clone() }, EventAction::Remove);
        trace!(event_id = %record.meta.event_id, "emitting event");
        self.processor.process(record)?;
        self.inner.remove_group(group)
    }

    pub fn add_entity_type(&mut self, entity_type: EntityType) -> Result<(), AccessError> {
        match self.inner.add_entity_type(entity_type.clone()) {
            Ok(()) => {
                let record =
                    self.stamp(EventPayload::EntityTypeEvent { entity_type: entity_type.clone() }, EventAction::Add);
                self.emit_or_rollback(record, move |m| {
                    let _ = m.remove_entity_type(&entity_type);
                })
            }
            Err(e) if e.is_already_exists() => {
                self.signal(IdempotencyKind::Add, "add_entity_type");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Cascades through every `UE`/`GE` entry naming this type and the
    /// entities it owns; see [`Self::remove_user`] for why that rules out
    /// `emit_or_rollback`.
    pub fn remove_entity_type(&mut self, entity_type: &EntityType) -> Result<(), AccessError> {
        if !self.inner.contains_entity_type(entity_type) {
            self.signal(IdempotencyKind::Remove, "remove_entity_type");
            return Ok(());
        }
        let record = self.stamp(EventPayload::EntityTypeEvent { entity_type: entity_type.clone() }, EventAction::Remove);
        trace!(event_id = %record.meta.event_id, "emitting event");
        self.processor.process(record)?;
        self.inner.remove_entity_type(entity_type)
    }

    pub fn add_entity(&mut self, entity_type: &EntityType, entity: Entity) -> Result<(), AccessError> {
        self.ensure_entity_type(entity_type)?;
        match self.inner.add_entity(entity_type, entity.clone()) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::EntityEvent { entity_type: entity_type.clone(), entity: entity.clone() },
                    EventAction::Add,
                );
                let undo_type = entity_type.clone();
                self.emit_or_rollback(record, move |m| {
                    let _ = m.remove_entity(&undo_type, &entity);
                })
            }
            Err(e) if e.is_already_exists() => {
                self.signal(IdempotencyKind::Add, "add_entity");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Cascades through every `UE`/`GE` entry naming this entity; see
    /// [`Self::remove_user`] for why that rules out `emit_or_rollback`.
    pub fn remove_entity(&mut self, entity_type: &EntityType, entity: &Entity) -> Result<(), AccessError> {
        if !self.inner.contains_entity(entity_type, entity) {
            self.signal(IdempotencyKind::Remove, "remove_entity");
            return Ok(());
        }
        let record = self.stamp(
            EventPayload::EntityEvent { entity_type: entity_type.clone(), entity: entity.clone() },
            EventAction::Remove,
        );
        trace!(event_id = %record.meta.event_id, "emitting event");
        self.processor.process(record)?;
        self.inner.remove_entity(entity_type, entity)
    }

    pub fn add_user_to_group_mapping(&mut self, user: &UserId, group: &GroupId) -> Result<(), AccessError> {
        self.ensure_user(user)?;
        self.ensure_group(group)?;
        match self.inner.add_user_to_group_mapping(user, group) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::UserGroupMappingEvent { user: user.clone(), group: group.clone() },
                    EventAction::Add,
                );
                let (u, g) = (user.clone(), group.clone());
                self.emit_or_rollback(record, move |m| {
                    let _ = m.remove_user_to_group_mapping(&u, &g);
                })
            }
            Err(e) if e.is_already_exists() => {
                self.signal(IdempotencyKind::Add, "add_user_to_group_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn remove_user_to_group_mapping(&mut self, user: &UserId, group: &GroupId) -> Result<(), AccessError> {
        match self.inner.remove_user_to_group_mapping(user, group) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::UserGroupMappingEvent { user: user.clone(), group: group.clone() },
                    EventAction::Remove,
                );
                let (u, g) = (user.clone(), group.clone());
                self.emit_or_rollback(record, move |m| {
                    let _ = m.add_user_to_group_mapping(&u, &g);
                })
            }
            Err(e) if e.is_not_found() => {
                self.signal(IdempotencyKind::Remove, "remove_user_to_group_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Self-mapping and cycle rejection (§4.5 "the self-mapping check
    /// remains a hard failure... and cycle detection... is preserved") are
    /// never swallowed: only `AlreadyExists` triggers idempotent no-op.
    pub fn add_group_to_group_mapping(&mut self, from: &GroupId, to: &GroupId) -> Result<(), AccessError> {
        self.ensure_group(from)?;
        self.ensure_group(to)?;
        match self.inner.add_group_to_group_mapping(from, to) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::GroupGroupMappingEvent { from: from.clone(), to: to.clone() },
                    EventAction::Add,
                );
                let (f, t) = (from.clone(), to.clone());
                self.emit_or_rollback(record, move |m| {
                    let _ = m.remove_group_to_group_mapping(&f, &t);
                })
            }
            Err(e) if e.is_already_exists() => {
                self.signal(IdempotencyKind::Add, "add_group_to_group_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn remove_group_to_group_mapping(&mut self, from: &GroupId, to: &GroupId) -> Result<(), AccessError> {
        match self.inner.remove_group_to_group_mapping(from, to) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::GroupGroupMappingEvent { from: from.clone(), to: to.clone() },
                    EventAction::Remove,
                );
                let (f, t) = (from.clone(), to.clone());
                self.emit_or_rollback(record, move |m| {
                    let _ = m.add_group_to_group_mapping(&f, &t);
                })
            }
            Err(e) if e.is_not_found() => {
                self.signal(IdempotencyKind::Remove, "remove_group_to_group_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn add_user_to_component_mapping(&mut self, user: &UserId, access: ComponentAccess) -> Result<(), AccessError> {
        self.ensure_user(user)?;
        match self.inner.add_user_to_component_mapping(user, access) {
            Ok(()) => {
                let record =
                    self.stamp(EventPayload::UserComponentEvent { user: user.clone(), access }, EventAction::Add);
                let u = user.clone();
                self.emit_or_rollback(record, move |m| {
                    let _ = m.remove_user_to_component_mapping(&u, &access);
                })
            }
            Err(e) if e.is_already_exists() => {
                self.signal(IdempotencyKind::Add, "add_user_to_component_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn remove_user_to_component_mapping(&mut self, user: &UserId, access: &ComponentAccess) -> Result<(), AccessError> {
        match self.inner.remove_user_to_component_mapping(user, access) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::UserComponentEvent { user: user.clone(), access: *access },
                    EventAction::Remove,
                );
                let u = user.clone();
                let access = *access;
                self.emit_or_rollback(record, move |m| {
                    let _ = m.add_user_to_component_mapping(&u, access);
                })
            }
            Err(e) if e.is_not_found() => {
                self.signal(IdempotencyKind::Remove, "remove_user_to_component_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn add_group_to_component_mapping(&mut self, group: &GroupId, access: ComponentAccess) -> Result<(), AccessError> {
        self.ensure_group(group)?;
        match self.inner.add_group_to_component_mapping(group, access) {
            Ok(()) => {
                let record =
                    self.stamp(EventPayload::GroupComponentEvent { group: group.clone(), access }, EventAction::Add);
                let g = group.clone();
                self.emit_or_rollback(record, move |m| {
                    let _ = m.remove_group_to_component_mapping(&g, &access);
                })
            }
            Err(e) if e.is_already_exists() => {
                self.signal(IdempotencyKind::Add, "add_group_to_component_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn remove_group_to_component_mapping(&mut self, group: &GroupId, access: &ComponentAccess) -> Result<(), AccessError> {
        match self.inner.remove_group_to_component_mapping(group, access) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::GroupComponentEvent { group: group.clone(), access: *access },
                    EventAction::Remove,
                );
                let g = group.clone();
                let access = *access;
                self.emit_or_rollback(record, move |m| {
                    let _ = m.add_group_to_component_mapping(&g, access);
                })
            }
            Err(e) if e.is_not_found() => {
                self.signal(IdempotencyKind::Remove, "remove_group_to_component_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn add_user_to_entity_mapping(
        &mut self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        self.ensure_user(user)?;
        self.ensure_entity(entity_type, entity)?;
        match self.inner.add_user_to_entity_mapping(user, entity_type, entity) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::UserEntityMappingEvent {
                        user: user.clone(),
                        entity_type: entity_type.clone(),
                        entity: entity.clone(),
                    },
                    EventAction::Add,
                );
                let (u, t, e) = (user.clone(), entity_type.clone(), entity.clone());
                self.emit_or_rollback(record, move |m| {
                    let _ = m.remove_user_to_entity_mapping(&u, &t, &e);
                })
            }
            Err(e) if e.is_already_exists() => {
                self.signal(IdempotencyKind::Add, "add_user_to_entity_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn remove_user_to_entity_mapping(
        &mut self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        match self.inner.remove_user_to_entity_mapping(user, entity_type, entity) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::UserEntityMappingEvent {
                        user: user.clone(),
                        entity_type: entity_type.clone(),
                        entity: entity.clone(),
                    },
                    EventAction::Remove,
                );
                let (u, t, e) = (user.clone(), entity_type.clone(), entity.clone());
                self.emit_or_rollback(record, move |m| {
                    let _ = m.add_user_to_entity_mapping(&u, &t, &e);
                })
            }
            Err(e) if e.is_not_found() => {
                self.signal(IdempotencyKind::Remove, "remove_user_to_entity_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn add_group_to_entity_mapping(
        &mut self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        self.ensure_group(group)?;
        self.ensure_entity(entity_type, entity)?;
        match self.inner.add_group_to_entity_mapping(group, entity_type, entity) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::GroupEntityMappingEvent {
                        group: group.clone(),
                        entity_type: entity_type.clone(),
                        entity: entity.clone(),
                    },
                    EventAction::Add,
                );
                let (g, t, e) = (group.clone(), entity_type.clone(), entity.clone());
                self.emit_or_rollback(record, move |m| {
                    let _ = m.remove_group_to_entity_mapping(&g, &t, &e);
                })
            }
            Err(e) if e.is_already_exists() => {
                self.signal(IdempotencyKind::Add, "add_group_to_entity_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn remove_group_to_entity_mapping(
        &mut self,
        group: &GroupId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<(), AccessError> {
        match self.inner.remove_group_to_entity_mapping(group, entity_type, entity) {
            Ok(()) => {
                let record = self.stamp(
                    EventPayload::GroupEntityMappingEvent {
                        group: group.clone(),
                        entity_type: entity_type.clone(),
                        entity: entity.clone(),
                    },
                    EventAction::Remove,
                );
                let (g, t, e) = (group.clone(), entity_type.clone(), entity.clone());
                self.emit_or_rollback(record, move |m| {
                    let _ = m.add_group_to_entity_mapping(&g, &t, &e);
                })
            }
            Err(e) if e.is_not_found() => {
                self.signal(IdempotencyKind::Remove, "remove_group_to_entity_mapping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // --- pass-through reads -------------------------------------------------

    pub fn contains_user(&self, user: &UserId) -> bool {
        self.inner.contains_user(user)
    }
    pub fn users(&self) -> Vec<UserId> {
        self.inner.users()
    }
    pub fn contains_group(&self, group: &GroupId) -> bool {
        self.inner.contains_group(group)
    }
    pub fn groups(&self) -> Vec<GroupId> {
        self.inner.groups()
    }
    pub fn has_access_to_component(&self, user: &UserId, access: &ComponentAccess) -> bool {
        self.inner.has_access_to_component(user, access)
    }
    pub fn has_access_to_entity(
        &self,
        user: &UserId,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<bool, AccessError> {
        self.inner.has_access_to_entity(user, entity_type, entity)
    }
    pub fn get_components_accessible_by_user(&self, user: &UserId) -> Vec<ComponentAccess> {
        self.inner.get_components_accessible_by_user(user)
    }
    pub fn get_entities_accessible_by_user(
        &self,
        user: &UserId,
        entity_type: Option<&EntityType>,
    ) -> Result<Vec<(EntityType, Entity)>, AccessError> {
        self.inner.get_entities_accessible_by_user(user, entity_type)
    }
}

/// A local, non-forwarding replay target (§4.5 "added"): applies each
/// record directly to the wrapped manager without re-entering the
/// prepend/idempotency pipeline, which is what lets C7 rebuild a fresh
/// instance from a captured event stream without re-triggering prepension.
impl<M: AccessManager> EventProcessor for DependencyFreeAccessManager<M> {
    fn process(&mut self, record: EventRecord) -> Result<(), AccessError> {
        use EventPayload::*;
        match (record.action, record.payload) {
            (EventAction::Add, UserEvent { user }) => ignore_already_exists(self.inner.add_user(user)),
            (EventAction::Remove, UserEvent { user }) => ignore_not_found(self.inner.remove_user(&user)),
            (EventAction::Add, GroupEvent { group }) => ignore_already_exists(self.inner.add_group(group)),
            (EventAction::Remove, GroupEvent { group }) => ignore_not_found(self.inner.remove_group(&group)),
            (EventAction::Add, UserGroupMappingEvent { user, group }) => {
                ignore_already_exists(self.inner.add_user_to_group_mapping(&user, &group))
            }
            (EventAction::Remove, UserGroupMappingEvent { user, group }) => {
                ignore_not_found(self.inner.remove_user_to_group_mapping(&user, &group))
            }
            (EventAction::Add, GroupGroupMappingEvent { from, to }) => {
                ignore_already_exists(self.inner.add_group_to_group_mapping(&from, &to))
            }
            (EventAction::Remove, GroupGroupMappingEvent { from, to }) => {
                ignore_not_found(self.inner.remove_group_to_group_mapping(&from, &to))
            }
            (EventAction::Add, UserComponentEvent { user, access }) => {
                ignore_already_exists(self.inner.add_user_to_component_mapping(&user, access))
            }
            (EventAction::Remove, UserComponentEvent { user, access }) => {
                ignore_not_found(self.inner.remove_user_to_component_mapping(&user, &access))
            }
            (EventAction::Add, GroupComponentEvent { group, access }) => {
                ignore_already_exists(self.inner.add_group_to_component_mapping(&group, access))
            }
            (EventAction::Remove, GroupComponentEvent { group, access }) => {
                ignore_not_found(self.inner.remove_group_to_component_mapping(&group, &access))
            }
            (EventAction::Add, EntityTypeEvent { entity_type }) => {
                ignore_already_exists(self.inner.add_entity_type(entity_type))
            }
            (EventAction::Remove, EntityTypeEvent { entity_type }) => {
                ignore_not_found(self.inner.remove_entity_type(&entity_type))
            }
            (EventAction::Add, EntityEvent { entity_type, entity }) => {
                ignore_already_exists(self.inner.add_entity(&entity_type, entity))
            }
            (EventAction::Remove, EntityEvent { entity_type, entity }) => {
                ignore_not_found(self.inner.remove_entity(&entity_type, &entity))
            }
            (EventAction::Add, UserEntityMappingEvent { user, entity_type, entity }) => {
                ignore_already_exists(self.inner.add_user_to_entity_mapping(&user, &entity_type, &entity))
            }
            (EventAction::Remove, UserEntityMappingEvent { user, entity_type, entity }) => {
                ignore_not_found(self.inner.remove_user_to_entity_mapping(&user, &entity_type, &entity))
            }
            (EventAction::Add, GroupEntityMappingEvent { group, entity_type, entity }) => {
                ignore_already_exists(self.inner.add_group_to_entity_mapping(&group, &entity_type, &entity))
            }
            (EventAction::Remove, GroupEntityMappingEvent { group, entity_type, entity }) => {
                ignore_not_found(self.inner.remove_group_to_entity_mapping(&group, &entity_type, &entity))
            }
        }
    }
}

fn ignore_already_exists(result: Result<(), AccessError>) -> Result<(), AccessError> {
    match result {
        Err(e) if e.is_already_exists() => Ok(()),
        other => other,
    }
}

fn ignore_not_found(result: Result<(), AccessError>) -> Result<(), AccessError> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use access_domain::{AccessLevel, ComponentId};

    use super::*;
    use crate::strict::StrictAccessManager;

    /// A recording [`EventProcessor`] test double, cloneable so the test can
    /// hand one handle to the manager and keep another to inspect.
    #[derive(Clone, Default)]
    struct RecordingProcessor {
        records: Arc<Mutex<Vec<EventRecord>>>,
    }

    impl EventProcessor for RecordingProcessor {
        fn process(&mut self, record: EventRecord) -> Result<(), AccessError> {
            self.records.lock().unwrap().push(record);
            Ok(())
        }
    }

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

    /// A processor that fails on its `fail_at`-th call, to exercise the
    /// rollback path.
    struct FailingOnNth {
        seen: usize,
        fail_at: usize,
    }

    impl EventProcessor for FailingOnNth {
        fn process(&mut self, _record: EventRecord) -> Result<(), AccessError> {
            if self.seen == self.fail_at {
                return Err(AccessError::InvalidArgument { parameter: "test", message: "boom".into() });
            }
            self.seen += 1;
            Ok(())
        }
    }

    #[test]
    fn prepends_missing_prerequisites_in_order() {
        let capture = RecordingProcessor::default();
        let mut m =
            DependencyFreeAccessManager::new(StrictAccessManager::new()).with_event_processor(capture.clone());

        m.add_user_to_entity_mapping(&uid("x"), &et("t1"), &ent("v1")).unwrap();

        let seen = capture.records.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(matches!(seen[0].payload, EventPayload::UserEvent { .. }));
        assert!(matches!(seen[1].payload, EventPayload::EntityTypeEvent { .. }));
        assert!(matches!(seen[2].payload, EventPayload::EntityEvent { .. }));
        assert!(matches!(seen[3].payload, EventPayload::UserEntityMappingEvent { .. }));
    }

    #[test]
    fn second_identical_add_is_a_silent_no_op() {
        let capture = RecordingProcessor::default();
        let mut m =
            DependencyFreeAccessManager::new(StrictAccessManager::new()).with_event_processor(capture.clone());

        m.add_user_to_entity_mapping(&uid("x"), &et("t1"), &ent("v1")).unwrap();
        let after_first = capture.records.lock().unwrap().len();

        m.add_user_to_entity_mapping(&uid("x"), &et("t1"), &ent("v1")).unwrap();
        assert_eq!(capture.records.lock().unwrap().len(), after_first);
    }

    #[test]
    fn self_mapping_and_cycles_are_never_swallowed() {
        let mut m = DependencyFreeAccessManager::new(StrictAccessManager::new());
        let err = m.add_group_to_group_mapping(&gid("a"), &gid("a")).unwrap_err();
        assert!(matches!(err, AccessError::SelfMapping(_)));

        m.add_group_to_group_mapping(&gid("a"), &gid("b")).unwrap();
        m.add_group_to_group_mapping(&gid("b"), &gid("c")).unwrap();
        let err = m.add_group_to_group_mapping(&gid("c"), &gid("a")).unwrap_err();
        assert!(matches!(err, AccessError::CircularReference { .. }));
    }

    #[test]
    fn rejected_emission_rolls_back_local_state() {
        let processor = FailingOnNth { seen: 0, fail_at: 0 };
        let mut m = DependencyFreeAccessManager::new(StrictAccessManager::new()).with_event_processor(processor);

        let err = m.add_user(uid("x")).unwrap_err();
        assert!(matches!(err, AccessError::InvalidArgument { .. }));
        assert!(!m.contains_user(&uid("x")));
    }

    #[test]
    fn rejected_emission_rolls_back_a_leaf_mapping_remove() {
        let mut m = DependencyFreeAccessManager::new(StrictAccessManager::new());
        m.add_user_to_group_mapping(&uid("u"), &gid("g")).unwrap();

        m = m.with_event_processor(FailingOnNth { seen: 0, fail_at: 0 });
        let err = m.remove_user_to_group_mapping(&uid("u"), &gid("g")).unwrap_err();
        assert!(matches!(err, AccessError::InvalidArgument { .. }));
        assert_eq!(m.inner().get_user_to_group_mappings(&uid("u")).unwrap(), vec![gid("g")]);
    }

    /// A cascading remove (`remove_user`) emits before it mutates, so a
    /// rejected emission must leave the user (and its cascade) untouched —
    /// there is no `undo` closure that could rebuild it after the fact.
    #[test]
    fn rejected_emission_leaves_a_cascading_remove_unapplied() {
        let mut m = DependencyFreeAccessManager::new(StrictAccessManager::new());
        m.add_user_to_component_mapping(&uid("x"), ComponentAccess::new(ComponentId::new(1), AccessLevel::new(1)))
            .unwrap();

        m = m.with_event_processor(FailingOnNth { seen: 0, fail_at: 0 });
        let err = m.remove_user(&uid("x")).unwrap_err();
        assert!(matches!(err, AccessError::InvalidArgument { .. }));
        assert!(m.contains_user(&uid("x")));
        assert!(m.has_access_to_component(&uid("x"), &ComponentAccess::new(ComponentId::new(1), AccessLevel::new(1))));
    }

    #[test]
    fn direct_component_grant_emits_prepended_user() {
        let capture = RecordingProcessor::default();
        let mut m =
            DependencyFreeAccessManager::new(StrictAccessManager::new()).with_event_processor(capture.clone());

        m.add_user_to_component_mapping(&uid("x"), ComponentAccess::new(ComponentId::new(1), AccessLevel::new(1)))
            .unwrap();
        assert_eq!(capture.records.lock().unwrap().len(), 2);
        assert!(m.has_access_to_component(&uid("x"), &ComponentAccess::new(ComponentId::new(1), AccessLevel::new(1))));
    }
}
