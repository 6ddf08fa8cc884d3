use std::collections::{HashMap, HashSet};

use replica_shared::{
    sequence_greater_than, BaseConnection, ChangeVersion, ConnectionConfig, ConnectionId,
    EntityId, HostType, MessageSeq,
};

/// Session lifecycle for one connected client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted by the transport, Controller not yet spawned
    Handshaking,
    /// Handshake complete; deltas flow every tick
    Active,
    /// Being torn down this tick
    Draining,
    Closed,
}

/// Everything the server tracks per connected client: the shared connection
/// base (ordering, liveness, error accounting), the owned Controller, which
/// entities this client has been told about, and per-entity version
/// watermarks that drive delta computation.
pub struct ClientConnection {
    id: ConnectionId,
    state: SessionState,
    base: BaseConnection,
    controller: Option<EntityId>,
    known_entities: HashSet<EntityId>,
    watermarks: HashMap<EntityId, ChangeVersion>,
    last_rpc_seq: Option<MessageSeq>,
}

impl ClientConnection {
    pub fn new(id: ConnectionId, config: &ConnectionConfig) -> Self {
        Self {
            id,
            state: SessionState::Handshaking,
            base: BaseConnection::new(config, HostType::Server),
            controller: None,
            known_entities: HashSet::new(),
            watermarks: HashMap::new(),
            last_rpc_seq: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub fn controller(&self) -> Option<EntityId> {
        self.controller
    }

    pub fn set_controller(&mut self, controller: EntityId) {
        self.controller = Some(controller);
    }

    pub fn base(&self) -> &BaseConnection {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseConnection {
        &mut self.base
    }

    // Entity knowledge & watermarks

    pub fn is_entity_known(&self, id: EntityId) -> bool {
        self.known_entities.contains(&id)
    }

    pub fn mark_known(&mut self, id: EntityId) {
        self.known_entities.insert(id);
    }

    pub fn forget_entity(&mut self, id: EntityId) {
        self.known_entities.remove(&id);
        self.watermarks.remove(&id);
    }

    /// Entities this client knows about that are no longer in `live`,
    /// i.e. pending despawn messages. Ascending id order.
    pub fn known_not_in<'a>(
        &'a self,
        live: impl Fn(EntityId) -> bool + 'a,
    ) -> Vec<EntityId> {
        let mut gone: Vec<EntityId> = self
            .known_entities
            .iter()
            .copied()
            .filter(|id| !live(*id))
            .collect();
        gone.sort();
        gone
    }

    /// Highest store version already sent to this client for the entity
    pub fn watermark(&self, id: EntityId) -> ChangeVersion {
        self.watermarks.get(&id).copied().unwrap_or(0)
    }

    pub fn set_watermark(&mut self, id: EntityId, version: ChangeVersion) {
        self.watermarks.insert(id, version);
    }

    // RPC ordering

    /// Accepts an RPC sequence number if it is fresh; duplicates and stale
    /// numbers return false and must not be applied.
    pub fn accept_rpc_seq(&mut self, seq: MessageSeq) -> bool {
        match self.last_rpc_seq {
            None => {
                self.last_rpc_seq = Some(seq);
                true
            }
            Some(last) if sequence_greater_than(seq, last) => {
                self.last_rpc_seq = Some(seq);
                true
            }
            Some(_) => false,
        }
    }
}
