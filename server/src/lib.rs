//! # Replica Server
//! The authoritative peer of the replica engine: owns the simulation state,
//! accepts client sessions, and syncs entity spawns, field updates and
//! despawns to every connected client.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use replica_shared::{
        ChannelServerTransport, ConnectionConfig, ConnectionId, Entity, EntityId, EntityStore,
        EntityType, Protocol, RegistryError, ServerTransport, StoreError, Value,
    };
}

mod connection;
mod error;
mod events;
mod rpc;
mod server;

pub use connection::{ClientConnection, SessionState};
pub use error::ServerError;
pub use events::Events;
pub use rpc::{RpcContext, RpcHandler, WorldHandle};
pub use server::{Server, ServerConfig};
