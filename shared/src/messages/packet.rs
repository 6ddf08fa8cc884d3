use crate::{
    messages::sync_message::SyncMessage,
    serde::{ByteReader, ByteWriter, Serde, SerdeErr},
    types::{EntityId, MessageSeq},
};

/// One transport payload. Hello/Welcome bracket the handshake, Heartbeat
/// keeps an otherwise idle connection alive, and Data carries the sequenced
/// message batch for one tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Packet {
    /// Client requests a session
    ClientHello,
    /// Server completes the handshake and names the client's Controller.
    /// The snapshot itself follows as ordinary Spawn messages.
    ServerWelcome { controller: EntityId },
    /// Sent when nothing else was, to prevent a liveness timeout
    Heartbeat,
    /// Sequenced batch of sync messages
    Data {
        seq: MessageSeq,
        messages: Vec<SyncMessage>,
    },
}

impl Packet {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Packet::ClientHello => "ClientHello",
            Packet::ServerWelcome { .. } => "ServerWelcome",
            Packet::Heartbeat => "Heartbeat",
            Packet::Data { .. } => "Data",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.ser(&mut writer);
        writer.to_bytes()
    }

    /// Decodes a received payload. Trailing garbage is treated as malformed
    /// rather than ignored.
    pub fn read(payload: &[u8]) -> Result<Self, SerdeErr> {
        let mut reader = ByteReader::new(payload);
        let packet = Self::de(&mut reader)?;
        if reader.remaining() > 0 {
            return Err(SerdeErr);
        }
        Ok(packet)
    }
}

impl Serde for Packet {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            Packet::ClientHello => 0u8.ser(writer),
            Packet::ServerWelcome { controller } => {
                1u8.ser(writer);
                controller.ser(writer);
            }
            Packet::Heartbeat => 2u8.ser(writer),
            Packet::Data { seq, messages } => {
                3u8.ser(writer);
                seq.ser(writer);
                messages.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(Packet::ClientHello),
            1 => Ok(Packet::ServerWelcome {
                controller: EntityId::de(reader)?,
            }),
            2 => Ok(Packet::Heartbeat),
            3 => Ok(Packet::Data {
                seq: MessageSeq::de(reader)?,
                messages: Vec::de(reader)?,
            }),
            _ => Err(SerdeErr),
        }
    }
}
