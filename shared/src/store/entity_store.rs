use std::{collections::BTreeMap, sync::Arc};

use crate::{
    registry::EntityType,
    store::{entity::Entity, error::StoreError, reference_validator::find_dangling_reference},
    types::{ChangeVersion, EntityId},
    value::Value,
};

/// Owning container of live entities, keyed by a store-unique id that is
/// never reused. Exists independently on the server (authoritative) and on
/// each client (mirror). BTreeMap storage keeps iteration in ascending id
/// order, which teardown relies on for determinism.
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    version: ChangeVersion,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
            version: 0,
        }
    }

    /// The store-wide mutation counter. Connections watermark against this.
    pub fn version(&self) -> ChangeVersion {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Lookups are expected to be queried defensively, so absence is an
    /// Option, not an error.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Allocates a fresh id and constructs an entity with every declared
    /// field marked changed at the current version. Undeclared initial
    /// fields fail before anything is allocated.
    pub fn create(
        &mut self,
        entity_type: &Arc<EntityType>,
        initial_fields: &[(&str, Value)],
    ) -> Result<EntityId, StoreError> {
        for (field, _) in initial_fields {
            if !entity_type.has_field(field) {
                return Err(StoreError::UnknownField {
                    type_name: entity_type.name().to_owned(),
                    field: (*field).to_owned(),
                });
            }
        }

        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.version += 1;

        let mut entity = Entity::new(id, entity_type.clone(), self.version);
        for (field, value) in initial_fields {
            entity.set_field(field, value.clone(), self.version)?;
        }
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Inserts an entity under a peer-assigned id. Used by the client sync
    /// engine when applying a spawn message; keeps the local allocator above
    /// every mirrored id so ids stay store-unique.
    pub fn insert_mirrored(
        &mut self,
        id: EntityId,
        entity_type: &Arc<EntityType>,
        fields: &[(String, Value)],
    ) -> Result<(), StoreError> {
        if self.entities.contains_key(&id) {
            return Err(StoreError::IdInUse { id });
        }
        for (field, _) in fields {
            if !entity_type.has_field(field) {
                return Err(StoreError::UnknownField {
                    type_name: entity_type.name().to_owned(),
                    field: field.clone(),
                });
            }
        }

        self.version += 1;
        let mut entity = Entity::new(id, entity_type.clone(), self.version);
        for (field, value) in fields {
            entity.set_field(field, value.clone(), self.version)?;
        }
        self.entities.insert(id, entity);
        self.next_id = self.next_id.max(id.to_u64() + 1);
        Ok(())
    }

    /// Removes an entity after the reference validator confirms no other
    /// entity's field still points at it. The id is permanently retired.
    pub fn destroy(&mut self, id: EntityId) -> Result<Entity, StoreError> {
        if !self.entities.contains_key(&id) {
            return Err(StoreError::NotFound { id });
        }
        if let Some((referencer, field)) = find_dangling_reference(self, id) {
            return Err(StoreError::DanglingReference {
                target: id,
                referencer,
                field,
            });
        }
        self.version += 1;
        Ok(self
            .entities
            .remove(&id)
            .unwrap_or_else(|| unreachable!("presence checked above")))
    }

    /// Removes an entity without running the reference validator. Reserved
    /// for replication-driven removal where the remote store is
    /// authoritative.
    pub fn force_remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id);
        if entity.is_some() {
            self.version += 1;
        }
        entity
    }

    /// Writes a field and bumps the store version if the value actually
    /// changed. Identical writes are a no-op.
    pub fn set_field(&mut self, id: EntityId, field: &str, value: Value) -> Result<bool, StoreError> {
        let next_version = self.version + 1;
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;
        let changed = entity.set_field(field, value, next_version)?;
        if changed {
            self.version = next_version;
        }
        Ok(changed)
    }

    /// Live ids in ascending order. Components that mutate the store while
    /// walking it iterate over this snapshot instead of a live borrow.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
