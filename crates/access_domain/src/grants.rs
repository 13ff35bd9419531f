use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use crate::error::AccessError;
use crate::ids::{ComponentAccess, Entity, EntityType};

/// `key ↦ set of (component, access level)`, i.e. UC or GC.
///
/// Insertion is strict (non-idempotent): a duplicate `(key, grant)` pair
/// reports `already_exists` rather than being silently absorbed —
/// idempotency is purely a C5 concern (§4.2).
#[derive(Clone, Debug, Default)]
pub struct ComponentGrants<K: Eq + Hash + Clone> {
    map: IndexMap<K, IndexSet<ComponentAccess>>,
}

impl<K: Eq + Hash + Clone> ComponentGrants<K> {
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    /// Adds `grant` under `key`. Returns `Ok(true)` if newly added,
    /// `Ok(false)` if it already existed — callers decide what error to
    /// surface for their own vocabulary (`UserComponentMappingAlreadyExists`
    /// vs. `GroupComponentMappingAlreadyExists`).
    pub fn add(&mut self, key: K, grant: ComponentAccess) -> bool {
        self.map.entry(key).or_default().insert(grant)
    }

    /// Removes `grant` from `key`. Prunes the key entirely if its set
    /// becomes empty (I7). Returns `true` if the grant was present.
    pub fn remove(&mut self, key: &K, grant: &ComponentAccess) -> bool {
        let Some(set) = self.map.get_mut(key) else {
            return false;
        };
        let removed = set.shift_remove(grant);
        if set.is_empty() {
            self.map.shift_remove(key);
        }
        removed
    }

    /// Removes every grant under `key` (cascades from vertex removal).
    pub fn remove_key(&mut self, key: &K) {
        self.map.shift_remove(key);
    }

    pub fn contains(&self, key: &K, grant: &ComponentAccess) -> bool {
        self.map.get(key).is_some_and(|s| s.contains(grant))
    }

    pub fn get(&self, key: &K) -> impl Iterator<Item = ComponentAccess> + '_ {
        self.map.get(key).into_iter().flatten().copied()
    }

    pub fn has_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }
}

/// `key ↦ entityType ↦ set of entity`, i.e. UE or GE.
#[derive(Clone, Debug, Default)]
pub struct EntityGrants<K: Eq + Hash + Clone> {
    map: IndexMap<K, IndexMap<EntityType, IndexSet<Entity>>>,
}

impl<K: Eq + Hash + Clone> EntityGrants<K> {
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    /// Adds `(entity_type, entity)` under `key`. Returns `true` if newly
    /// added.
    pub fn add(&mut self, key: K, entity_type: EntityType, entity: Entity) -> bool {
        self.map
            .entry(key)
            .or_default()
            .entry(entity_type)
            .or_default()
            .insert(entity)
    }

    /// Removes `(entity_type, entity)` from `key`, pruning the inner and
    /// then outer maps when they become empty (I7).
    pub fn remove(&mut self, key: &K, entity_type: &EntityType, entity: &Entity) -> bool {
        let Some(by_type) = self.map.get_mut(key) else {
            return false;
        };
        let Some(set) = by_type.get_mut(entity_type) else {
            return false;
        };
        let removed = set.shift_remove(entity);
        if set.is_empty() {
            by_type.shift_remove(entity_type);
        }
        if by_type.is_empty() {
            self.map.shift_remove(key);
        }
        removed
    }

    pub fn remove_key(&mut self, key: &K) {
        self.map.shift_remove(key);
    }

    /// Purges `entity_type` from every key (entityType removal cascade).
    pub fn remove_type(&mut self, entity_type: &EntityType) {
        self.map.retain(|_, by_type| {
            by_type.shift_remove(entity_type);
            !by_type.is_empty()
        });
    }

    /// Purges `entity` of `entity_type` from every key (entity removal
    /// cascade).
    pub fn remove_entity(&mut self, entity_type: &EntityType, entity: &Entity) {
        self.map.retain(|_, by_type| {
            if let Some(set) = by_type.get_mut(entity_type) {
                set.shift_remove(entity);
                if set.is_empty() {
                    by_type.shift_remove(entity_type);
                }
            }
            !by_type.is_empty()
        });
    }

    pub fn contains(&self, key: &K, entity_type: &EntityType, entity: &Entity) -> bool {
        self.map
            .get(key)
            .and_then(|by_type| by_type.get(entity_type))
            .is_some_and(|s| s.contains(entity))
    }

    pub fn get(&self, key: &K, entity_type: &EntityType) -> impl Iterator<Item = Entity> + '_ {
        self.map
            .get(key)
            .and_then(|by_type| by_type.get(entity_type))
            .into_iter()
            .flatten()
            .cloned()
    }

    /// All `(entity_type, entity)` pairs granted to `key`, regardless of
    /// type — used by `GetEntitiesAccessibleByUser(user)` with no type
    /// filter.
    pub fn get_all(&self, key: &K) -> impl Iterator<Item = (EntityType, Entity)> + '_ {
        self.map.get(key).into_iter().flat_map(|by_type| {
            by_type
                .iter()
                .flat_map(|(t, set)| set.iter().map(move |e| (t.clone(), e.clone())))
        })
    }

    pub fn has_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }
}

/// `entityType ↦ set of entity` — the entity catalog.
#[derive(Clone, Debug, Default)]
pub struct EntityCatalog {
    map: IndexMap<EntityType, IndexSet<Entity>>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    pub fn add_type(&mut self, entity_type: EntityType) -> Result<(), AccessError> {
        if self.map.contains_key(&entity_type) {
            return Err(AccessError::EntityTypeAlreadyExists(entity_type));
        }
        self.map.insert(entity_type, IndexSet::new());
        Ok(())
    }

    /// Removes `entity_type` and every entity registered under it. Returns
    /// the removed entities so callers can cascade the removal into UE/GE.
    pub fn remove_type(&mut self, entity_type: &EntityType) -> Result<IndexSet<Entity>, AccessError> {
        self.map
            .shift_remove(entity_type)
            .ok_or_else(|| AccessError::EntityTypeNotFound(entity_type.clone()))
    }

    pub fn add_entity(&mut self, entity_type: &EntityType, entity: Entity) -> Result<(), AccessError> {
        let Some(set) = self.map.get_mut(entity_type) else {
            return Err(AccessError::EntityTypeNotFound(entity_type.clone()));
        };
        if !set.insert(entity.clone()) {
            return Err(AccessError::EntityAlreadyExists {
                entity_type: entity_type.clone(),
                entity,
            });
        }
        Ok(())
    }

    pub fn remove_entity(&mut self, entity_type: &EntityType, entity: &Entity) -> Result<(), AccessError> {
        let Some(set) = self.map.get_mut(entity_type) else {
            return Err(AccessError::EntityTypeNotFound(entity_type.clone()));
        };
        if !set.shift_remove(entity) {
            return Err(AccessError::EntityNotFound {
                entity_type: entity_type.clone(),
                entity: entity.clone(),
            });
        }
        Ok(())
    }

    pub fn contains_type(&self, entity_type: &EntityType) -> bool {
        self.map.contains_key(entity_type)
    }

    pub fn contains_entity(&self, entity_type: &EntityType, entity: &Entity) -> bool {
        self.map.get(entity_type).is_some_and(|s| s.contains(entity))
    }

    pub fn types(&self) -> impl Iterator<Item = &EntityType> {
        self.map.keys()
    }

    pub fn entities(&self, entity_type: &EntityType) -> impl Iterator<Item = &Entity> {
        self.map.get(entity_type).into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AccessLevel, ComponentId};

    #[test]
    fn component_grants_prune_empty_keys() {
        let mut g: ComponentGrants<String> = ComponentGrants::new();
        let grant = ComponentAccess::new(ComponentId::new(1), AccessLevel::new(1));
        assert!(g.add("alice".into(), grant));
        assert!(!g.add("alice".into(), grant));
        assert!(g.has_key(&"alice".to_string()));
        assert!(g.remove(&"alice".to_string(), &grant));
        assert!(!g.has_key(&"alice".to_string()));
    }

    #[test]
    fn entity_grants_prune_empty_type_then_key() {
        let mut g: EntityGrants<String> = EntityGrants::new();
        let t = EntityType::new("account").unwrap();
        let e = Entity::new("acme").unwrap();
        assert!(g.add("u".into(), t.clone(), e.clone()));
        assert!(g.has_key(&"u".to_string()));
        assert!(g.remove(&"u".to_string(), &t, &e));
        assert!(!g.has_key(&"u".to_string()));
    }

    #[test]
    fn entity_catalog_remove_type_cascades() {
        let mut cat = EntityCatalog::new();
        let t = EntityType::new("account").unwrap();
        cat.add_type(t.clone()).unwrap();
        cat.add_entity(&t, Entity::new("acme").unwrap()).unwrap();
        let removed = cat.remove_type(&t).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(!cat.contains_type(&t));
    }

    proptest::proptest! {
        /// I7: neither `map` entry is ever left with an empty inner
        /// collection after any sequence of adds/removes.
        #[test]
        fn entity_grants_never_leaves_empty_inner_sets(
            ops in proptest::collection::vec((0u8..2, 0usize..3, 0usize..2, 0usize..2), 0..100),
        ) {
            let mut g: EntityGrants<String> = EntityGrants::new();
            let keys: Vec<String> = (0..3).map(|i| format!("k{i}")).collect();
            let types: Vec<EntityType> = (0..2).map(|i| EntityType::new(format!("t{i}")).unwrap()).collect();
            let entities: Vec<Entity> = (0..2).map(|i| Entity::new(format!("e{i}")).unwrap()).collect();

            for (op, k, t, e) in ops {
                let key = keys[k].clone();
                let ty = types[t].clone();
                let entity = entities[e].clone();
                match op {
                    0 => { g.add(key, ty, entity); }
                    _ => { g.remove(&key, &ty, &entity); }
                }
                for key in &keys {
                    if let Some(by_type) = g.map.get(key) {
                        prop_assert!(!by_type.is_empty(), "key {key} left with an empty by-type map");
                        for (ty, set) in by_type {
                            prop_assert!(!set.is_empty(), "key {key} type {ty} left with an empty entity set");
                        }
                    }
                }
            }
        }
    }
}
