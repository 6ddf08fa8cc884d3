use replica_shared::EntityId;

use crate::error::ClientError;

/// Per-tick batch of client happenings, returned by `process()` and drained
/// by the application. Lifecycle hooks fire during `process()` itself; these
/// batches are the polling alternative.
#[derive(Default)]
pub struct Events {
    connection: Option<EntityId>,
    disconnection: bool,
    spawns: Vec<EntityId>,
    despawns: Vec<EntityId>,
    updates: Vec<(EntityId, Vec<String>)>,
    errors: Vec<ClientError>,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.connection.is_none()
            && !self.disconnection
            && self.spawns.is_empty()
            && self.despawns.is_empty()
            && self.updates.is_empty()
            && self.errors.is_empty()
    }

    /// The Controller entity assigned by the server, if the handshake
    /// completed this tick
    pub fn take_connection(&mut self) -> Option<EntityId> {
        self.connection.take()
    }

    /// Whether the session ended this tick (server timeout, transport loss,
    /// or too many protocol violations)
    pub fn take_disconnection(&mut self) -> bool {
        std::mem::take(&mut self.disconnection)
    }

    /// Entities mirrored into the local store this tick
    pub fn take_spawns(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.spawns)
    }

    /// Entities removed from the local store this tick
    pub fn take_despawns(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.despawns)
    }

    /// (entity, changed field names) pairs applied this tick
    pub fn take_updates(&mut self) -> Vec<(EntityId, Vec<String>)> {
        std::mem::take(&mut self.updates)
    }

    /// Recoverable errors absorbed by the sync engine this tick
    pub fn take_errors(&mut self) -> Vec<ClientError> {
        std::mem::take(&mut self.errors)
    }

    pub(crate) fn set_connection(&mut self, controller: EntityId) {
        self.connection = Some(controller);
    }

    pub(crate) fn set_disconnection(&mut self) {
        self.disconnection = true;
    }

    pub(crate) fn push_spawn(&mut self, id: EntityId) {
        self.spawns.push(id);
    }

    pub(crate) fn push_despawn(&mut self, id: EntityId) {
        self.despawns.push(id);
    }

    pub(crate) fn push_update(&mut self, id: EntityId, fields: Vec<String>) {
        self.updates.push((id, fields));
    }

    pub(crate) fn push_error(&mut self, error: ClientError) {
        self.errors.push(error);
    }
}
