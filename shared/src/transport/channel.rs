use std::collections::{HashMap, VecDeque};

use smol::{
    channel,
    channel::{Receiver, Sender, TryRecvError},
};

use super::{ClientTransport, RecvError, SendError, ServerTransport};
use crate::types::ConnectionId;

/// In-memory loopback transport. Each `open_client` call produces the client
/// half of a new link; delivery is ordered and reliable, which is the
/// strongest guarantee the engine's transport contract allows it to assume.
pub struct ChannelServerTransport {
    inbound_sender: Sender<(ConnectionId, Vec<u8>)>,
    inbound: Receiver<(ConnectionId, Vec<u8>)>,
    outbound: HashMap<ConnectionId, Sender<Vec<u8>>>,
    pending_accepts: VecDeque<ConnectionId>,
    disconnected: Vec<ConnectionId>,
    next_connection_id: u64,
}

impl ChannelServerTransport {
    pub fn new() -> Self {
        let (inbound_sender, inbound) = channel::unbounded();
        Self {
            inbound_sender,
            inbound,
            outbound: HashMap::new(),
            pending_accepts: VecDeque::new(),
            disconnected: Vec::new(),
            next_connection_id: 1,
        }
    }

    /// Opens a new loopback link and returns the client half
    pub fn open_client(&mut self) -> ChannelClientTransport {
        let connection = ConnectionId::new(self.next_connection_id);
        self.next_connection_id += 1;

        let (to_client, from_server) = channel::unbounded();
        self.outbound.insert(connection, to_client);
        self.pending_accepts.push_back(connection);

        ChannelClientTransport {
            connection,
            sender: self.inbound_sender.clone(),
            receiver: from_server,
        }
    }
}

impl Default for ChannelServerTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerTransport for ChannelServerTransport {
    fn accept(&mut self) -> Option<ConnectionId> {
        self.pending_accepts.pop_front()
    }

    fn receive(&mut self) -> Result<Option<(ConnectionId, Vec<u8>)>, RecvError> {
        match self.inbound.try_recv() {
            Ok(packet) => Ok(Some(packet)),
            // the server keeps a sender clone, so the channel never closes
            Err(TryRecvError::Empty) => Ok(None),
            Err(_) => Err(RecvError),
        }
    }

    fn send(&mut self, connection: ConnectionId, payload: &[u8]) -> Result<(), SendError> {
        let Some(sender) = self.outbound.get(&connection) else {
            return Err(SendError);
        };
        if sender.send_blocking(payload.to_vec()).is_err() {
            // client half dropped its receiver
            self.outbound.remove(&connection);
            self.disconnected.push(connection);
            return Err(SendError);
        }
        Ok(())
    }

    fn take_disconnected(&mut self) -> Vec<ConnectionId> {
        std::mem::take(&mut self.disconnected)
    }
}

/// Client half of a loopback link. Dropping it closes the link; the server
/// observes the disconnect on its next send to this connection.
pub struct ChannelClientTransport {
    connection: ConnectionId,
    sender: Sender<(ConnectionId, Vec<u8>)>,
    receiver: Receiver<Vec<u8>>,
}

impl ChannelClientTransport {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection
    }
}

impl ClientTransport for ChannelClientTransport {
    fn send(&mut self, payload: &[u8]) -> Result<(), SendError> {
        self.sender
            .send_blocking((self.connection, payload.to_vec()))
            .map_err(|_| SendError)
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, RecvError> {
        match self.receiver.try_recv() {
            Ok(payload) => Ok(Some(payload)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(_) => Err(RecvError),
        }
    }
}
