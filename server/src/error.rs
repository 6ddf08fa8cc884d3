use thiserror::Error;

use replica_shared::{ConnectionId, ProtocolError, RegistryError, StoreError};

/// Errors surfaced by the server, either synchronously from API calls or
/// asynchronously through the per-tick event batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A client violated the wire protocol; the offending input was dropped
    #[error("Protocol violation from {connection}: {source}")]
    Protocol {
        connection: ConnectionId,
        source: ProtocolError,
    },
}
