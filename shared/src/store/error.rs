use thiserror::Error;

use crate::types::EntityId;

/// Errors raised by EntityStore operations. All of these indicate schema or
/// lifetime misuse by application code and propagate synchronously to the
/// caller that triggered them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Addressed an entity that does not live in this store
    #[error("Entity {id} does not exist in this store")]
    NotFound { id: EntityId },

    /// Attempted to occupy an id that is already live
    #[error("Entity id {id} is already occupied in this store")]
    IdInUse { id: EntityId },

    /// Set or read a field the entity's schema does not declare
    #[error("Type `{type_name}` declares no field `{field}`")]
    UnknownField { type_name: String, field: String },

    /// Despawned an entity while another entity's field still references it
    #[error("Cannot despawn {target}: field `{field}` of {referencer} still references it")]
    DanglingReference {
        target: EntityId,
        referencer: EntityId,
        field: String,
    },
}
