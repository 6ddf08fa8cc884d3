use crate::{
    serde::{ByteReader, ByteWriter, Serde, SerdeErr},
    types::{EntityId, MessageSeq},
    value::Value,
};

/// The logical wire messages carried inside a data packet.
///
/// Spawn/Update/Despawn flow server-to-client only; RpcCall flows
/// client-to-server only. `RpcCall.seq` comes from its own per-connection
/// counter so the server can drop duplicate deliveries.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncMessage {
    Spawn {
        id: EntityId,
        type_name: String,
        fields: Vec<(String, Value)>,
    },
    Update {
        id: EntityId,
        fields: Vec<(String, Value)>,
    },
    Despawn {
        id: EntityId,
    },
    RpcCall {
        target: EntityId,
        method: String,
        args: Vec<Value>,
        seq: MessageSeq,
    },
}

impl SyncMessage {
    pub fn kind_label(&self) -> &'static str {
        match self {
            SyncMessage::Spawn { .. } => "Spawn",
            SyncMessage::Update { .. } => "Update",
            SyncMessage::Despawn { .. } => "Despawn",
            SyncMessage::RpcCall { .. } => "RpcCall",
        }
    }
}

impl Serde for SyncMessage {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            SyncMessage::Spawn {
                id,
                type_name,
                fields,
            } => {
                0u8.ser(writer);
                id.ser(writer);
                type_name.ser(writer);
                fields.ser(writer);
            }
            SyncMessage::Update { id, fields } => {
                1u8.ser(writer);
                id.ser(writer);
                fields.ser(writer);
            }
            SyncMessage::Despawn { id } => {
                2u8.ser(writer);
                id.ser(writer);
            }
            SyncMessage::RpcCall {
                target,
                method,
                args,
                seq,
            } => {
                3u8.ser(writer);
                target.ser(writer);
                method.ser(writer);
                args.ser(writer);
                seq.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(SyncMessage::Spawn {
                id: EntityId::de(reader)?,
                type_name: String::de(reader)?,
                fields: Vec::de(reader)?,
            }),
            1 => Ok(SyncMessage::Update {
                id: EntityId::de(reader)?,
                fields: Vec::de(reader)?,
            }),
            2 => Ok(SyncMessage::Despawn {
                id: EntityId::de(reader)?,
            }),
            3 => Ok(SyncMessage::RpcCall {
                target: EntityId::de(reader)?,
                method: String::de(reader)?,
                args: Vec::de(reader)?,
                seq: MessageSeq::de(reader)?,
            }),
            _ => Err(SerdeErr),
        }
    }
}
