use std::time::Duration;

use replica_client::{Client, ClientConfig, Events as ClientEvents};
use replica_server::{Events as ServerEvents, Server, ServerConfig};
use replica_shared::{ChannelServerTransport, ConnectionConfig, Protocol};

use crate::helpers::test_protocol::CONTROLLER;

/// Short intervals so liveness and heartbeat behavior is testable in
/// milliseconds rather than seconds.
pub fn fast_config() -> ConnectionConfig {
    ConnectionConfig {
        liveness_timeout: Duration::from_millis(100),
        heartbeat_interval: Duration::from_millis(20),
        handshake_retry: Duration::from_millis(10),
        protocol_error_limit: 3,
        reorder_buffer_limit: 8,
        waitlist_ttl: Duration::from_millis(100),
    }
}

/// A server and one fully-handshaken client over the loopback channel
/// transport. The client already mirrors the server's state, including its
/// Controller.
pub fn connected_pair(server_protocol: Protocol, client_protocol: Protocol) -> (Server, Client) {
    let mut transport = ChannelServerTransport::new();
    let client_transport = transport.open_client();

    let mut server_config = ServerConfig::new(CONTROLLER);
    server_config.connection = fast_config();
    let mut server =
        Server::new(server_config, server_protocol, transport).expect("Controller is registered");

    let client_config = ClientConfig {
        connection: fast_config(),
    };
    let mut client = Client::new(client_config, client_protocol, client_transport);
    client.connect();

    server.process();
    let mut events = client.process();
    assert!(
        events.take_connection().is_some(),
        "handshake should complete in one exchange over loopback"
    );
    (server, client)
}

/// One full exchange: the server's tick, then the client's.
pub fn tick(server: &mut Server, client: &mut Client) -> (ServerEvents, ClientEvents) {
    let server_events = server.process();
    let client_events = client.process();
    (server_events, client_events)
}
