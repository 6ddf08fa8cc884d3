//! # Replica Client
//! A cross-platform client that can mirror state replicated from a
//! replica-server.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod shared {
    pub use replica_shared::{
        ChannelClientTransport, ClientTransport, ConnectionConfig, Entity, EntityId, EntityStore,
        EntityType, Protocol, RegistryError, StoreError, Value,
    };
}

mod client;
mod connection;
mod error;
mod events;
mod update_waitlist;

pub use client::{Client, ClientConfig};
pub use connection::ConnectionState;
pub use error::ClientError;
pub use events::Events;
