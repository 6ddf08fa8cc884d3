use replica_shared::{
    BaseConnection, ConnectionConfig, EntityId, HostType, MessageSeq, Timer,
};

/// Where the client currently stands with its server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected, or torn down after a disconnect
    Disconnected,
    /// Hello sent, welcome not yet received; the hello is re-sent on a timer
    AwaitingWelcome,
    /// Handshake complete, mirror live
    Connected,
}

/// The client's half of the session: packet sequencing, liveness, handshake
/// retry, and the RPC sequence counter.
pub struct ServerConnection {
    state: ConnectionState,
    base: BaseConnection,
    handshake_timer: Timer,
    next_rpc_seq: MessageSeq,
    controller: Option<EntityId>,
}

impl ServerConnection {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            base: BaseConnection::new(config, HostType::Client),
            handshake_timer: Timer::new(config.handshake_retry),
            next_rpc_seq: 0,
            controller: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    pub fn base(&self) -> &BaseConnection {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseConnection {
        &mut self.base
    }

    /// The Controller the server assigned in its welcome packet
    pub fn controller(&self) -> Option<EntityId> {
        self.controller
    }

    pub fn set_controller(&mut self, controller: EntityId) {
        self.controller = Some(controller);
    }

    pub fn clear_controller(&mut self) {
        self.controller = None;
    }

    /// True when the hello packet should be re-sent; resets the retry timer.
    pub fn should_retry_handshake(&mut self) -> bool {
        if self.state != ConnectionState::AwaitingWelcome {
            return false;
        }
        if self.handshake_timer.ringing() {
            self.handshake_timer.reset();
            return true;
        }
        false
    }

    pub fn reset_handshake_timer(&mut self) {
        self.handshake_timer.reset();
    }

    /// Sequence number for the next outbound RPC call. Wraps; the server
    /// compares with wrapping sequence math.
    pub fn next_rpc_seq(&mut self) -> MessageSeq {
        let seq = self.next_rpc_seq;
        self.next_rpc_seq = self.next_rpc_seq.wrapping_add(1);
        seq
    }
}
