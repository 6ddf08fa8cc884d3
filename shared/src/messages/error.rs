use thiserror::Error;

use crate::types::EntityId;

/// Protocol violations by a remote peer. The offending packet or message is
/// dropped and logged; the connection survives unless a configured threshold
/// of consecutive violations is exceeded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The packet failed to decode
    #[error("Packet failed to decode")]
    Malformed,

    /// A packet kind arrived outside its protocol phase
    #[error("Received `{kind}` packet out of protocol phase")]
    UnexpectedPacket { kind: &'static str },

    /// A message kind arrived from a peer that may not send it
    #[error("Received `{kind}` message this peer may not send")]
    UnexpectedMessage { kind: &'static str },

    /// A spawn message named a type this process never registered
    #[error("Spawn for {id} names unknown type `{type_name}`")]
    SpawnUnknownType { id: EntityId, type_name: String },

    /// A spawn or update message carried a field the schema does not declare
    #[error("Message for {id} carries undeclared field `{field}`")]
    UndeclaredField { id: EntityId, field: String },

    /// A spawn message re-used an id that is still live in the mirror
    #[error("Spawn re-uses live entity id {id}")]
    SpawnIdInUse { id: EntityId },

    /// An RPC call named a method the target's schema does not declare
    #[error("Rpc call names method `{method}` not declared on type `{type_name}`")]
    RpcUnknownMethod { type_name: String, method: String },
}
