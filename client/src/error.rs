use replica_shared::{EntityId, ProtocolError, RegistryError, StoreError};

/// An Error type specifically related to the replica-client crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Violation in the inbound byte stream. The offending message was
    /// dropped; the connection survives until the violation limit is hit.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("not connected to a server")]
    NotConnected,
    /// Mirrored entities accept direct writes only through fields the schema
    /// declares local.
    #[error("field `{field}` of type `{type_name}` is replicated and cannot be written on {id}")]
    FieldNotLocal {
        id: EntityId,
        type_name: String,
        field: String,
    },
}
