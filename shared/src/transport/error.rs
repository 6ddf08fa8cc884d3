use thiserror::Error;

/// The transport could not send a packet; for connection-oriented
/// transports this usually means the peer is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Transport failed to send packet")]
pub struct SendError;

/// The transport's receive path failed; treated as a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Transport failed to receive packet")]
pub struct RecvError;
