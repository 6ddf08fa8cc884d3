use std::sync::Arc;

use crate::{
    registry::EntityType,
    store::error::StoreError,
    types::{ChangeVersion, EntityId},
    value::Value,
};

#[derive(Clone, Debug)]
struct FieldSlot {
    value: Value,
    version: ChangeVersion,
}

/// A typed, uniquely-identified mutable record. Authoritative on the server,
/// a mirror on clients. Field slots run parallel to the schema's declaration
/// order, which keeps wire output deterministic.
pub struct Entity {
    id: EntityId,
    entity_type: Arc<EntityType>,
    slots: Vec<FieldSlot>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, entity_type: Arc<EntityType>, version: ChangeVersion) -> Self {
        let slots = (0..entity_type.field_count())
            .map(|_| FieldSlot {
                value: Value::Null,
                version,
            })
            .collect();
        Self {
            id,
            entity_type,
            slots,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    pub fn type_name(&self) -> &str {
        self.entity_type.name()
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        let index = self.entity_type.field_index(name)?;
        Some(&self.slots[index].value)
    }

    /// Writes a field, stamping `version` onto it. Returns false (leaving the
    /// stamp untouched) when the value is identical to the current one, so
    /// redundant writes produce no delta traffic.
    pub(crate) fn set_field(
        &mut self,
        name: &str,
        value: Value,
        version: ChangeVersion,
    ) -> Result<bool, StoreError> {
        let index =
            self.entity_type
                .field_index(name)
                .ok_or_else(|| StoreError::UnknownField {
                    type_name: self.type_name().to_owned(),
                    field: name.to_owned(),
                })?;
        let slot = &mut self.slots[index];
        if slot.value == value {
            return Ok(false);
        }
        slot.value = value;
        slot.version = version;
        Ok(true)
    }

    /// All replicated fields with their current values, in declaration order.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.entity_type.field_is_local(*index))
            .map(|(index, slot)| {
                let name = self
                    .entity_type
                    .field_name(index)
                    .unwrap_or_default()
                    .to_owned();
                (name, slot.value.clone())
            })
            .collect()
    }

    /// Replicated fields stamped after `watermark`, in declaration order.
    pub fn changed_since(&self, watermark: ChangeVersion) -> Vec<(String, Value)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(index, slot)| {
                slot.version > watermark && !self.entity_type.field_is_local(*index)
            })
            .map(|(index, slot)| {
                let name = self
                    .entity_type
                    .field_name(index)
                    .unwrap_or_default()
                    .to_owned();
                (name, slot.value.clone())
            })
            .collect()
    }

    /// Name of the first field referencing `target`, if any. Used by the
    /// reference validator at despawn time.
    pub fn references(&self, target: EntityId) -> Option<&str> {
        self.slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.value.entity_ref() == Some(target))
            .and_then(|(index, _)| self.entity_type.field_name(index))
    }
}
