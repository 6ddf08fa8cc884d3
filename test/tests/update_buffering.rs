//! Update-before-spawn handling at the client: fields that arrive ahead of
//! their entity's spawn are buffered and flushed when the spawn lands, or
//! dropped once their TTL lapses.

use std::time::Duration;

use replica_client::{Client, ClientConfig};
use replica_shared::{
    ChannelServerTransport, ConnectionConfig, ConnectionId, EntityId, Packet, ServerTransport,
    SyncMessage, Value,
};
use replica_test::{fast_config, test_protocol, PLAYER};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Drives a client with hand-built packets so the update can be staged
/// ahead of its spawn.
fn raw_client(config: ConnectionConfig) -> (ChannelServerTransport, Client, ConnectionId) {
    init();
    let mut transport = ChannelServerTransport::new();
    let client_transport = transport.open_client();
    let mut client = Client::new(
        ClientConfig { connection: config },
        test_protocol(),
        client_transport,
    );
    client.connect();

    let connection = transport.accept().expect("link was opened");
    let controller = EntityId::new(1);
    transport
        .send(connection, &Packet::ServerWelcome { controller }.to_bytes())
        .unwrap();
    (transport, client, connection)
}

#[test]
fn update_before_spawn_is_buffered_then_applied() {
    let (mut transport, mut client, connection) = raw_client(fast_config());
    let player = EntityId::new(2);

    let early_update = Packet::Data {
        seq: 0,
        messages: vec![SyncMessage::Update {
            id: player,
            fields: vec![("x".to_owned(), Value::Int(5))],
        }],
    };
    let spawn = Packet::Data {
        seq: 1,
        messages: vec![SyncMessage::Spawn {
            id: player,
            type_name: PLAYER.to_owned(),
            fields: vec![("x".to_owned(), Value::Int(0)), ("y".to_owned(), Value::Int(7))],
        }],
    };
    transport.send(connection, &early_update.to_bytes()).unwrap();
    transport.send(connection, &spawn.to_bytes()).unwrap();
    let mut events = client.process();

    assert!(events.take_connection().is_some());
    assert_eq!(events.take_spawns(), vec![player]);
    assert!(events.take_errors().is_empty());

    // the buffered field supersedes the spawn's value; untouched fields keep it
    let mirrored = client.entity(player).expect("spawn was applied");
    assert_eq!(mirrored.field("x"), Some(&Value::Int(5)));
    assert_eq!(mirrored.field("y"), Some(&Value::Int(7)));
}

#[test]
fn buffered_update_expires_when_its_spawn_never_comes() {
    let (mut transport, mut client, connection) = raw_client(ConnectionConfig {
        waitlist_ttl: Duration::ZERO,
        ..fast_config()
    });
    let player = EntityId::new(2);

    let early_update = Packet::Data {
        seq: 0,
        messages: vec![SyncMessage::Update {
            id: player,
            fields: vec![("x".to_owned(), Value::Int(5))],
        }],
    };
    transport.send(connection, &early_update.to_bytes()).unwrap();
    // the zero TTL expires the buffer within this same tick
    client.process();
    assert!(client.entity(player).is_none());

    let spawn = Packet::Data {
        seq: 1,
        messages: vec![SyncMessage::Spawn {
            id: player,
            type_name: PLAYER.to_owned(),
            fields: vec![("x".to_owned(), Value::Int(0)), ("y".to_owned(), Value::Int(0))],
        }],
    };
    transport.send(connection, &spawn.to_bytes()).unwrap();
    client.process();

    // the expired field must not resurface on the late spawn
    assert_eq!(
        client.entity(player).unwrap().field("x"),
        Some(&Value::Int(0))
    );
}
