use log::{debug, info, warn};

use replica_shared::{
    find_dangling_reference, ClientTransport, Entity, EntityId, EntityStore, Packet, Protocol,
    ProtocolError, RegistryError, StoreError, SyncMessage, Value,
};

use crate::{
    client::client_config::ClientConfig,
    connection::{ConnectionState, ServerConnection},
    error::ClientError,
    events::Events,
    update_waitlist::UpdateWaitlist,
};

/// The mirroring peer. Owns a local entity store that converges toward the
/// server's authoritative state; each `process()` call drains the transport,
/// applies inbound spawn/update/despawn messages in order, and flushes any
/// RPC calls queued since the last tick.
pub struct Client {
    protocol: Protocol,
    transport: Box<dyn ClientTransport>,
    store: EntityStore,
    connection: ServerConnection,
    waitlist: UpdateWaitlist,
    outgoing: Vec<SyncMessage>,
    events: Events,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        protocol: Protocol,
        transport: impl ClientTransport + 'static,
    ) -> Self {
        let waitlist = UpdateWaitlist::new(config.connection.waitlist_ttl);
        Self {
            protocol,
            transport: Box::new(transport),
            store: EntityStore::new(),
            connection: ServerConnection::new(&config.connection),
            waitlist,
            outgoing: Vec::new(),
            events: Events::new(),
        }
    }

    // Connection

    /// Starts the handshake. The hello packet is re-sent on a timer until
    /// the server's welcome arrives.
    pub fn connect(&mut self) {
        if self.connection.state() != ConnectionState::Disconnected {
            debug!("connect() called while already connecting or connected");
            return;
        }
        self.connection.set_state(ConnectionState::AwaitingWelcome);
        self.connection.base_mut().mark_heard();
        self.connection.reset_handshake_timer();
        info!("sending hello");
        self.send_packet(&Packet::ClientHello);
    }

    /// Tears the session down locally. The server notices through its own
    /// liveness timeout; there is no goodbye packet.
    pub fn disconnect(&mut self) {
        self.teardown();
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.state() == ConnectionState::Connected
    }

    /// The Controller entity the server assigned to this client
    pub fn controller(&self) -> Option<EntityId> {
        self.connection.controller()
    }

    // Entities

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.store.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.store.iter()
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Writes a field the schema declares local. Replicated fields are
    /// server-authoritative and rejected here.
    pub fn set_local_field(
        &mut self,
        id: EntityId,
        field: &str,
        value: Value,
    ) -> Result<bool, ClientError> {
        let entity = self
            .store
            .get(id)
            .ok_or(ClientError::Store(StoreError::NotFound { id }))?;
        let entity_type = entity.entity_type().clone();
        match entity_type.field_index(field) {
            Some(index) if entity_type.field_is_local(index) => {
                Ok(self.store.set_field(id, field, value)?)
            }
            Some(_) => Err(ClientError::FieldNotLocal {
                id,
                type_name: entity_type.name().to_owned(),
                field: field.to_owned(),
            }),
            None => Err(ClientError::Store(StoreError::UnknownField {
                type_name: entity_type.name().to_owned(),
                field: field.to_owned(),
            })),
        }
    }

    // RPC

    /// Queues a method call on a mirrored entity, normally this client's
    /// Controller. Fire-and-forget: no return value comes back. The call
    /// goes out with this tick's data packet.
    pub fn call_rpc(
        &mut self,
        target: EntityId,
        method: &str,
        args: &[Value],
    ) -> Result<(), ClientError> {
        if self.connection.state() != ConnectionState::Connected {
            return Err(ClientError::NotConnected);
        }
        let entity = self
            .store
            .get(target)
            .ok_or(ClientError::Store(StoreError::NotFound { id: target }))?;
        if !entity.entity_type().has_method(method) {
            return Err(ClientError::Registry(RegistryError::UnknownMethod {
                type_name: entity.type_name().to_owned(),
                method: method.to_owned(),
            }));
        }
        let seq = self.connection.next_rpc_seq();
        self.outgoing.push(SyncMessage::RpcCall {
            target,
            method: method.to_owned(),
            args: args.to_vec(),
            seq,
        });
        Ok(())
    }

    // Tick

    /// Must be called regularly from the application's update loop.
    /// Non-blocking: drains whatever the transport has buffered, applies it
    /// in sequence order, enforces liveness, flushes queued RPC calls, and
    /// returns the tick's events.
    pub fn process(&mut self) -> Events {
        if self.connection.state() != ConnectionState::Disconnected {
            self.receive_packets();
        }
        if self.connection.should_retry_handshake() {
            debug!("welcome still pending, re-sending hello");
            self.send_packet(&Packet::ClientHello);
        }
        if self.connection.state() != ConnectionState::Disconnected
            && self.connection.base().timed_out()
        {
            info!("server went silent, tearing down the mirror");
            self.teardown();
        }
        for id in self.waitlist.expire() {
            warn!("dropping buffered updates for {id}, its spawn never arrived");
        }
        self.send_outgoing();
        std::mem::replace(&mut self.events, Events::new())
    }

    fn receive_packets(&mut self) {
        loop {
            match self.transport.receive() {
                Ok(Some(payload)) => {
                    self.handle_packet(&payload);
                    if self.connection.state() == ConnectionState::Disconnected {
                        return;
                    }
                }
                Ok(None) => return,
                Err(_) => {
                    info!("transport closed, tearing down the mirror");
                    self.teardown();
                    return;
                }
            }
        }
    }

    fn handle_packet(&mut self, payload: &[u8]) {
        // any packet, even a malformed one, proves the server is alive
        self.connection.base_mut().mark_heard();

        let packet = match Packet::read(payload) {
            Ok(packet) => packet,
            Err(_) => {
                self.record_protocol_error(ProtocolError::Malformed);
                return;
            }
        };

        match packet {
            Packet::ServerWelcome { controller } => self.handle_welcome(controller),
            Packet::Heartbeat => self.connection.base_mut().clear_protocol_errors(),
            Packet::ClientHello => self.record_protocol_error(ProtocolError::UnexpectedPacket {
                kind: "ClientHello",
            }),
            Packet::Data { seq, messages } => self.handle_data(seq, messages),
        }
    }

    fn handle_welcome(&mut self, controller: EntityId) {
        match self.connection.state() {
            ConnectionState::AwaitingWelcome => {
                self.connection.set_state(ConnectionState::Connected);
                self.connection.set_controller(controller);
                info!("connected, controller is {controller}");
                self.events.set_connection(controller);
            }
            ConnectionState::Connected => {
                // welcome retransmit after our hello retry crossed it in
                // flight
                debug!("ignoring duplicate welcome");
            }
            ConnectionState::Disconnected => {}
        }
    }

    fn handle_data(&mut self, seq: replica_shared::MessageSeq, messages: Vec<SyncMessage>) {
        if self.connection.state() != ConnectionState::Connected {
            self.record_protocol_error(ProtocolError::UnexpectedPacket { kind: "Data" });
            return;
        }
        self.connection.base_mut().clear_protocol_errors();
        let batches = self.connection.base_mut().receive_data(seq, messages);
        for batch in batches {
            for message in batch {
                self.apply_message(message);
                if self.connection.state() == ConnectionState::Disconnected {
                    return;
                }
            }
        }
    }

    fn apply_message(&mut self, message: SyncMessage) {
        match message {
            SyncMessage::Spawn {
                id,
                type_name,
                fields,
            } => self.apply_spawn(id, type_name, fields),
            SyncMessage::Update { id, fields } => self.apply_update(id, fields),
            SyncMessage::Despawn { id } => self.apply_despawn(id),
            other => self.record_protocol_error(ProtocolError::UnexpectedMessage {
                kind: other.kind_label(),
            }),
        }
    }

    fn apply_spawn(&mut self, id: EntityId, type_name: String, fields: Vec<(String, Value)>) {
        let entity_type = match self.protocol.registry().resolve(&type_name) {
            Ok(entity_type) => entity_type,
            Err(_) => {
                self.record_protocol_error(ProtocolError::SpawnUnknownType { id, type_name });
                return;
            }
        };
        if let Err(error) = self.store.insert_mirrored(id, &entity_type, &fields) {
            let violation = match error {
                StoreError::IdInUse { id } => ProtocolError::SpawnIdInUse { id },
                StoreError::UnknownField { field, .. } => {
                    ProtocolError::UndeclaredField { id, field }
                }
                other => {
                    warn!("spawn of {id} failed: {other}");
                    self.events.push_error(other.into());
                    return;
                }
            };
            self.record_protocol_error(violation);
            return;
        }

        // updates that raced ahead of this spawn
        if let Some(buffered) = self.waitlist.take(id) {
            debug!("applying {} buffered field(s) to {id}", buffered.len());
            for (field, value) in buffered {
                if let Err(error) = self.store.set_field(id, &field, value) {
                    warn!("buffered update for {id} no longer applies: {error}");
                }
            }
        }

        self.protocol.invoke_on_spawn(&mut self.store, id);
        self.events.push_spawn(id);
    }

    fn apply_update(&mut self, id: EntityId, fields: Vec<(String, Value)>) {
        if !self.store.contains(id) {
            debug!("buffering update for not-yet-spawned {id}");
            self.waitlist.buffer(id, fields);
            return;
        }
        let mut changed = Vec::new();
        for (field, value) in fields {
            match self.store.set_field(id, &field, value) {
                Ok(true) => changed.push(field),
                Ok(false) => {}
                Err(StoreError::UnknownField { field, .. }) => {
                    self.record_protocol_error(ProtocolError::UndeclaredField { id, field });
                }
                Err(error) => {
                    warn!("update of {id}.{field} failed: {error}");
                    self.events.push_error(error.into());
                }
            }
        }
        if !changed.is_empty() {
            self.events.push_update(id, changed);
        }
    }

    /// The server is authoritative, so the mirror removes the entity even
    /// when local application code still references it. That stale
    /// reference is surfaced as a recoverable error for the application to
    /// repair.
    fn apply_despawn(&mut self, id: EntityId) {
        self.waitlist.discard(id);
        if !self.store.contains(id) {
            debug!("despawn for unknown {id}, dropping");
            return;
        }
        if let Some((referencer, field)) = find_dangling_reference(&self.store, id) {
            self.events
                .push_error(ClientError::Store(StoreError::DanglingReference {
                    target: id,
                    referencer,
                    field,
                }));
        }
        self.protocol.invoke_on_despawn(&mut self.store, id);
        self.store.force_remove(id);
        self.events.push_despawn(id);
    }

    fn record_protocol_error(&mut self, error: ProtocolError) {
        warn!("protocol violation from server: {error}");
        self.events.push_error(ClientError::Protocol(error));
        if self.connection.base_mut().record_protocol_error() {
            warn!("server exceeded the protocol error limit, disconnecting");
            self.teardown();
        }
    }

    /// Fires on-despawn for every mirrored entity in ascending id order,
    /// then empties the store and reports the disconnection.
    fn teardown(&mut self) {
        if self.connection.state() == ConnectionState::Disconnected {
            return;
        }
        self.connection.set_state(ConnectionState::Disconnected);
        self.connection.clear_controller();
        self.waitlist.clear();
        self.outgoing.clear();
        for id in self.store.ids() {
            self.protocol.invoke_on_despawn(&mut self.store, id);
            self.store.force_remove(id);
            self.events.push_despawn(id);
        }
        self.events.set_disconnection();
    }

    fn send_outgoing(&mut self) {
        if self.connection.state() != ConnectionState::Connected {
            return;
        }
        if self.outgoing.is_empty() {
            if self.connection.base().should_send_heartbeat() {
                self.send_packet(&Packet::Heartbeat);
            }
            return;
        }
        let messages = std::mem::take(&mut self.outgoing);
        let seq = self.connection.base_mut().next_outgoing_seq();
        self.send_packet(&Packet::Data { seq, messages });
    }

    fn send_packet(&mut self, packet: &Packet) {
        if self.transport.send(&packet.to_bytes()).is_err() {
            debug!("send failed; the receive path will observe the disconnect");
        }
        self.connection.base_mut().mark_sent();
    }
}
