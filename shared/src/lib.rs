//! # Replica Shared
//! Common functionality shared between replica-server & replica-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod backends;
mod connection;
mod messages;
mod protocol;
mod registry;
mod sequence_buffer;
mod serde;
mod store;
mod transport;
mod types;
mod value;
mod wrapping_number;

pub use backends::Timer;
pub use connection::{BaseConnection, ConnectionConfig};
pub use messages::{Packet, ProtocolError, SyncMessage};
pub use protocol::{LifecycleHook, Protocol, ProtocolBuilder};
pub use registry::{EntityType, RegistryError, TypeRegistry};
pub use sequence_buffer::{SequenceBuffer, SequenceError};
pub use serde::{ByteReader, ByteWriter, Serde, SerdeErr};
pub use store::{find_dangling_reference, Entity, EntityStore, StoreError};
pub use transport::{
    ChannelClientTransport, ChannelServerTransport, ClientTransport, RecvError, SendError,
    ServerTransport,
};
pub use types::{ChangeVersion, ConnectionId, EntityId, HostType, MessageSeq};
pub use value::Value;
pub use wrapping_number::{sequence_greater_than, sequence_less_than};
