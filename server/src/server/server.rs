use std::collections::HashMap;

use log::{debug, info, warn};

use replica_shared::{
    ConnectionId, Entity, EntityId, EntityStore, Packet, Protocol, ProtocolError, RegistryError,
    ServerTransport, SyncMessage, Value,
};

use crate::{
    connection::{ClientConnection, SessionState},
    error::ServerError,
    events::Events,
    rpc::{RpcContext, RpcTable, WorldHandle},
    server::server_config::ServerConfig,
};

/// The authoritative peer. Owns the entity store and one session per
/// connected client; each `process()` call drains the transport, applies
/// inbound RPC calls, enforces liveness, and sends every Active client the
/// minimal spawn/update/despawn batch it needs to converge.
pub struct Server {
    config: ServerConfig,
    protocol: Protocol,
    transport: Box<dyn ServerTransport>,
    store: EntityStore,
    connections: HashMap<ConnectionId, ClientConnection>,
    rpc: RpcTable,
    events: Events,
}

impl Server {
    /// Create a new Server. Fails if the configured Controller type is not
    /// registered, since no client could ever connect.
    pub fn new(
        config: ServerConfig,
        protocol: Protocol,
        transport: impl ServerTransport + 'static,
    ) -> Result<Self, ServerError> {
        protocol.registry().resolve(&config.controller_type)?;
        Ok(Self {
            config,
            protocol,
            transport: Box::new(transport),
            store: EntityStore::new(),
            connections: HashMap::new(),
            rpc: RpcTable::new(),
            events: Events::new(),
        })
    }

    // Entities

    /// Creates an entity and fires its on-spawn hook. It becomes visible to
    /// every Active client on the next `process()` tick.
    pub fn spawn(
        &mut self,
        type_name: &str,
        initial_fields: &[(&str, Value)],
    ) -> Result<EntityId, ServerError> {
        WorldHandle::new(&mut self.store, &mut self.protocol).spawn(type_name, initial_fields)
    }

    /// Despawns an entity. Fails with a dangling-reference error while any
    /// other entity's field still points at it.
    pub fn despawn(&mut self, id: EntityId) -> Result<(), ServerError> {
        WorldHandle::new(&mut self.store, &mut self.protocol).despawn(id)
    }

    /// Writes a field; identical values are a no-op and produce no delta
    /// traffic. Returns whether the value actually changed.
    pub fn set_field(
        &mut self,
        id: EntityId,
        field: &str,
        value: Value,
    ) -> Result<bool, ServerError> {
        Ok(self.store.set_field(id, field, value)?)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.store.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.store.iter()
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    // Connections

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn session_state(&self, connection: ConnectionId) -> Option<SessionState> {
        self.connections.get(&connection).map(|c| c.state())
    }

    /// The Controller entity owned by a connection, once its handshake has
    /// completed
    pub fn controller_of(&self, connection: ConnectionId) -> Option<EntityId> {
        self.connections
            .get(&connection)
            .and_then(|c| c.controller())
    }

    // RPC

    /// Registers the handler invoked when a client calls `method` on an
    /// entity of `type_name`. The method must be declared by the schema.
    pub fn on_rpc(
        &mut self,
        type_name: &str,
        method: &str,
        handler: impl FnMut(&mut WorldHandle, RpcContext, &[Value]) + 'static,
    ) -> Result<(), ServerError> {
        let entity_type = self.protocol.registry().resolve(type_name)?;
        if !entity_type.has_method(method) {
            return Err(ServerError::Registry(RegistryError::UnknownMethod {
                type_name: type_name.to_owned(),
                method: method.to_owned(),
            }));
        }
        self.rpc.register(type_name, method, Box::new(handler));
        Ok(())
    }

    // Tick

    /// Must be called regularly from the application's update loop.
    /// Non-blocking: drains whatever the transport has buffered, applies
    /// inbound RPC calls, enforces liveness, sends outbound deltas, and
    /// returns the tick's events.
    pub fn process(&mut self) -> Events {
        self.accept_connections();
        self.receive_packets();
        self.check_liveness();
        self.send_deltas();
        std::mem::replace(&mut self.events, Events::new())
    }

    fn accept_connections(&mut self) {
        while let Some(connection_id) = self.transport.accept() {
            info!("accepted connection {connection_id}");
            self.connections.insert(
                connection_id,
                ClientConnection::new(connection_id, &self.config.connection),
            );
        }
    }

    fn receive_packets(&mut self) {
        loop {
            match self.transport.receive() {
                Ok(Some((connection_id, payload))) => self.handle_packet(connection_id, &payload),
                Ok(None) => break,
                Err(_) => {
                    warn!("transport receive failed, stopping this tick's drain");
                    break;
                }
            }
        }
        for connection_id in self.transport.take_disconnected() {
            info!("transport reported {connection_id} disconnected");
            self.drain_connection(connection_id);
        }
    }

    fn handle_packet(&mut self, connection_id: ConnectionId, payload: &[u8]) {
        let Some(connection) = self.connections.get_mut(&connection_id) else {
            debug!("dropping packet from unknown connection {connection_id}");
            return;
        };
        // any packet, even a malformed one, proves the peer is alive
        connection.base_mut().mark_heard();

        let packet = match Packet::read(payload) {
            Ok(packet) => packet,
            Err(_) => {
                self.record_protocol_error(connection_id, ProtocolError::Malformed);
                return;
            }
        };

        match packet {
            Packet::ClientHello => self.complete_handshake(connection_id),
            Packet::Heartbeat => {
                if let Some(connection) = self.connections.get_mut(&connection_id) {
                    connection.base_mut().clear_protocol_errors();
                }
            }
            Packet::ServerWelcome { .. } => self.record_protocol_error(
                connection_id,
                ProtocolError::UnexpectedPacket {
                    kind: "ServerWelcome",
                },
            ),
            Packet::Data { seq, messages } => self.handle_data(connection_id, seq, messages),
        }
    }

    /// Handshaking → Active: spawn the Controller, acknowledge with the
    /// welcome packet. The full-state snapshot goes out as ordinary spawn
    /// messages in this same tick's delta pass, since a fresh session knows
    /// no entities yet.
    fn complete_handshake(&mut self, connection_id: ConnectionId) {
        let state = match self.connections.get(&connection_id) {
            Some(connection) => connection.state(),
            None => return,
        };
        match state {
            SessionState::Handshaking => {
                let controller = {
                    let mut world = WorldHandle::new(&mut self.store, &mut self.protocol);
                    match world.spawn(&self.config.controller_type, &[]) {
                        Ok(id) => id,
                        Err(error) => {
                            warn!("failed to spawn controller for {connection_id}: {error}");
                            self.events.push_error(error);
                            return;
                        }
                    }
                };
                if let Some(connection) = self.connections.get_mut(&connection_id) {
                    connection.set_controller(controller);
                    connection.set_state(SessionState::Active);
                }
                info!("connection {connection_id} completed handshake, controller is {controller}");
                self.send_to(connection_id, &Packet::ServerWelcome { controller });
                self.events.push_connect(connection_id);
            }
            SessionState::Active => {
                // hello retransmit: the welcome was lost or is still in
                // flight, so re-acknowledge with the existing controller
                if let Some(controller) = self
                    .connections
                    .get(&connection_id)
                    .and_then(|connection| connection.controller())
                {
                    self.send_to(connection_id, &Packet::ServerWelcome { controller });
                }
            }
            SessionState::Draining | SessionState::Closed => {}
        }
    }

    fn handle_data(
        &mut self,
        connection_id: ConnectionId,
        seq: replica_shared::MessageSeq,
        messages: Vec<SyncMessage>,
    ) {
        let state = match self.connections.get(&connection_id) {
            Some(connection) => connection.state(),
            None => return,
        };
        if state != SessionState::Active {
            self.record_protocol_error(
                connection_id,
                ProtocolError::UnexpectedPacket { kind: "Data" },
            );
            return;
        }
        let batches = {
            let Some(connection) = self.connections.get_mut(&connection_id) else {
                return;
            };
            connection.base_mut().clear_protocol_errors();
            connection.base_mut().receive_data(seq, messages)
        };
        for batch in batches {
            for message in batch {
                self.apply_client_message(connection_id, message);
            }
        }
    }

    fn apply_client_message(&mut self, connection_id: ConnectionId, message: SyncMessage) {
        match message {
            SyncMessage::RpcCall {
                target,
                method,
                args,
                seq,
            } => self.apply_rpc(connection_id, target, method, args, seq),
            other => self.record_protocol_error(
                connection_id,
                ProtocolError::UnexpectedMessage {
                    kind: other.kind_label(),
                },
            ),
        }
    }

    /// Invokes an RPC call synchronously, so its mutations are picked up by
    /// this same tick's delta computation.
    fn apply_rpc(
        &mut self,
        connection_id: ConnectionId,
        target: EntityId,
        method: String,
        args: Vec<Value>,
        seq: replica_shared::MessageSeq,
    ) {
        {
            let Some(connection) = self.connections.get_mut(&connection_id) else {
                return;
            };
            if !connection.accept_rpc_seq(seq) {
                debug!("dropping duplicate rpc seq {seq} from {connection_id}");
                return;
            }
        }

        let (type_name, declared) = match self.store.get(target) {
            Some(entity) => (
                entity.type_name().to_owned(),
                entity.entity_type().has_method(&method),
            ),
            None => {
                // an in-flight call racing a despawn is expected traffic
                warn!(
                    "rpc `{method}` from {connection_id} addressed to missing entity {target}, dropping"
                );
                return;
            }
        };
        if !declared {
            self.record_protocol_error(
                connection_id,
                ProtocolError::RpcUnknownMethod { type_name, method },
            );
            return;
        }

        let Some(handler) = self.rpc.get_mut(&type_name, &method) else {
            warn!("no handler registered for {type_name}.{method}, dropping rpc from {connection_id}");
            return;
        };
        let context = RpcContext {
            connection: connection_id,
            target,
        };
        let mut world = WorldHandle::new(&mut self.store, &mut self.protocol);
        handler(&mut world, context, &args);
    }

    fn record_protocol_error(&mut self, connection_id: ConnectionId, error: ProtocolError) {
        warn!("protocol violation from {connection_id}: {error}");
        self.events.push_error(ServerError::Protocol {
            connection: connection_id,
            source: error,
        });
        let exceeded = match self.connections.get_mut(&connection_id) {
            Some(connection) => connection.base_mut().record_protocol_error(),
            None => false,
        };
        if exceeded {
            warn!("connection {connection_id} exceeded its protocol error limit, closing");
            self.drain_connection(connection_id);
        }
    }

    fn check_liveness(&mut self) {
        let timed_out: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|(_, connection)| connection.base().timed_out())
            .map(|(id, _)| *id)
            .collect();
        for connection_id in timed_out {
            info!("connection {connection_id} timed out");
            self.drain_connection(connection_id);
        }
    }

    /// Draining → Closed: despawn the Controller (firing its hook exactly
    /// once), then remove the session.
    fn drain_connection(&mut self, connection_id: ConnectionId) {
        let Some(mut connection) = self.connections.remove(&connection_id) else {
            return;
        };
        connection.set_state(SessionState::Draining);

        if let Some(controller) = connection.controller() {
            let result = WorldHandle::new(&mut self.store, &mut self.protocol).despawn(controller);
            if let Err(error) = result {
                // a lingering reference to the controller is an application
                // bug, but the session must not leak the entity
                warn!("controller {controller} of {connection_id} could not despawn cleanly: {error}");
                self.events.push_error(error);
                self.protocol.invoke_on_despawn(&mut self.store, controller);
                self.store.force_remove(controller);
            }
        }

        connection.set_state(SessionState::Closed);
        info!("connection {connection_id} closed");
        self.events.push_disconnect(connection_id);
    }

    /// One data packet per Active connection per tick: spawns for entities
    /// the client has never seen, field deltas past its watermark for those
    /// it has, despawns for entities that no longer exist. Ordered
    /// spawns → updates → despawns so intra-batch causality holds.
    fn send_deltas(&mut self) {
        let store_version = self.store.version();
        let entity_ids = self.store.ids();

        let mut connection_ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        // avoid servicing the same client first every tick
        fastrand::shuffle(&mut connection_ids);

        for connection_id in connection_ids {
            let mut packet = None;
            {
                let Some(connection) = self.connections.get_mut(&connection_id) else {
                    continue;
                };
                if connection.state() != SessionState::Active {
                    continue;
                }

                let mut spawns = Vec::new();
                let mut updates = Vec::new();
                for id in &entity_ids {
                    let Some(entity) = self.store.get(*id) else {
                        continue;
                    };
                    if connection.is_entity_known(*id) {
                        let fields = entity.changed_since(connection.watermark(*id));
                        if !fields.is_empty() {
                            updates.push(SyncMessage::Update { id: *id, fields });
                        }
                    } else {
                        spawns.push(SyncMessage::Spawn {
                            id: *id,
                            type_name: entity.type_name().to_owned(),
                            fields: entity.snapshot(),
                        });
                        connection.mark_known(*id);
                    }
                    connection.set_watermark(*id, store_version);
                }

                let mut messages = spawns;
                messages.append(&mut updates);
                for id in connection.known_not_in(|id| self.store.contains(id)) {
                    connection.forget_entity(id);
                    messages.push(SyncMessage::Despawn { id });
                }

                if messages.is_empty() {
                    if connection.base().should_send_heartbeat() {
                        packet = Some(Packet::Heartbeat);
                    }
                } else {
                    let seq = connection.base_mut().next_outgoing_seq();
                    packet = Some(Packet::Data { seq, messages });
                }
            }
            if let Some(packet) = packet {
                self.send_to(connection_id, &packet);
            }
        }
    }

    fn send_to(&mut self, connection_id: ConnectionId, packet: &Packet) {
        let payload = packet.to_bytes();
        if self.transport.send(connection_id, &payload).is_err() {
            debug!("send to {connection_id} failed; transport will report the disconnect");
        }
        if let Some(connection) = self.connections.get_mut(&connection_id) {
            connection.base_mut().mark_sent();
        }
    }
}
