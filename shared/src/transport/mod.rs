mod channel;
mod error;

pub use channel::{ChannelClientTransport, ChannelServerTransport};
pub use error::{RecvError, SendError};

use crate::types::ConnectionId;

/// Server-side transport collaborator. Implementations own the socket (or
/// whatever stands in for one) and must preserve per-connection delivery
/// order, or at worst reorder within the engine's reorder-buffer bound.
pub trait ServerTransport {
    /// Next newly-connected client, if any
    fn accept(&mut self) -> Option<ConnectionId>;

    /// Next buffered inbound packet, if any. Non-blocking.
    fn receive(&mut self) -> Result<Option<(ConnectionId, Vec<u8>)>, RecvError>;

    /// Sends one packet to the given client
    fn send(&mut self, connection: ConnectionId, payload: &[u8]) -> Result<(), SendError>;

    /// Connections the transport has observed closing since the last call
    fn take_disconnected(&mut self) -> Vec<ConnectionId>;
}

/// Client-side transport collaborator, already bound to the server address.
pub trait ClientTransport {
    /// Sends one packet to the server
    fn send(&mut self, payload: &[u8]) -> Result<(), SendError>;

    /// Next buffered inbound packet, if any. Non-blocking; an error means
    /// the link is gone.
    fn receive(&mut self) -> Result<Option<Vec<u8>>, RecvError>;
}
