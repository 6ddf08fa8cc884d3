use replica_shared::ConnectionId;

use crate::error::ServerError;

/// Per-tick batch of server happenings, returned by `process()` and drained
/// by the application.
#[derive(Default)]
pub struct Events {
    connects: Vec<ConnectionId>,
    disconnects: Vec<ConnectionId>,
    errors: Vec<ServerError>,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.connects.is_empty() && self.disconnects.is_empty() && self.errors.is_empty()
    }

    /// Connections that completed their handshake this tick
    pub fn take_connects(&mut self) -> Vec<ConnectionId> {
        std::mem::take(&mut self.connects)
    }

    /// Connections torn down this tick (timeout or transport disconnect)
    pub fn take_disconnects(&mut self) -> Vec<ConnectionId> {
        std::mem::take(&mut self.disconnects)
    }

    /// Recoverable errors absorbed by the sync engine this tick
    pub fn take_errors(&mut self) -> Vec<ServerError> {
        std::mem::take(&mut self.errors)
    }

    pub(crate) fn push_connect(&mut self, connection: ConnectionId) {
        self.connects.push(connection);
    }

    pub(crate) fn push_disconnect(&mut self, connection: ConnectionId) {
        self.disconnects.push(connection);
    }

    pub(crate) fn push_error(&mut self, error: ServerError) {
        self.errors.push(error);
    }
}
