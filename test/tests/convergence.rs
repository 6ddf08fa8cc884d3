//! End-to-end convergence over the loopback transport: spawns, field
//! deltas, no-op write suppression, and despawns all reaching the client
//! mirror.

use replica_shared::Value;
use replica_test::{connected_pair, test_protocol, test_protocol_with_hooks, HookLog, PLAYER};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn client_mirrors_spawn_update_despawn() {
    init();
    let log = HookLog::new();
    let (mut server, mut client) =
        connected_pair(test_protocol(), test_protocol_with_hooks(&log));

    // the handshake already mirrored the Controller
    assert_eq!(log.count("controller_spawn"), 1);

    let player = server
        .spawn(PLAYER, &[("x", Value::Int(0)), ("y", Value::Int(0))])
        .unwrap();
    server.process();
    let mut events = client.process();

    assert_eq!(events.take_spawns(), vec![player]);
    assert_eq!(log.count("player_spawn"), 1);
    let mirrored = client.entity(player).expect("player is mirrored");
    assert_eq!(mirrored.field("x"), Some(&Value::Int(0)));
    assert_eq!(mirrored.field("y"), Some(&Value::Int(0)));

    // only the changed field travels
    assert!(server.set_field(player, "x", Value::Int(5)).unwrap());
    server.process();
    let mut events = client.process();
    assert_eq!(events.take_updates(), vec![(player, vec!["x".to_owned()])]);
    assert_eq!(
        client.entity(player).unwrap().field("x"),
        Some(&Value::Int(5))
    );

    server.despawn(player).unwrap();
    server.process();
    let mut events = client.process();
    assert_eq!(events.take_despawns(), vec![player]);
    assert_eq!(log.count("player_despawn"), 1);
    assert!(client.entity(player).is_none());
}

#[test]
fn identical_write_produces_no_delta_traffic() {
    init();
    let (mut server, mut client) = connected_pair(test_protocol(), test_protocol());

    let player = server
        .spawn(PLAYER, &[("x", Value::Int(5)), ("y", Value::Int(0))])
        .unwrap();
    server.process();
    client.process();

    assert!(!server.set_field(player, "x", Value::Int(5)).unwrap());
    server.process();
    let mut events = client.process();
    assert!(events.take_updates().is_empty());
    assert!(events.take_spawns().is_empty());
}

#[test]
fn late_joiner_receives_full_snapshot() {
    init();
    let mut transport = replica_shared::ChannelServerTransport::new();
    let client_transport = transport.open_client();

    let mut server_config = replica_server::ServerConfig::new(replica_test::CONTROLLER);
    server_config.connection = replica_test::fast_config();
    let mut server =
        replica_server::Server::new(server_config, test_protocol(), transport).unwrap();

    let a = server
        .spawn(PLAYER, &[("x", Value::Int(1)), ("y", Value::Int(2))])
        .unwrap();
    let b = server
        .spawn(PLAYER, &[("x", Value::Int(3)), ("y", Value::Int(4))])
        .unwrap();
    // the session is accepted but stays Handshaking until the hello arrives
    server.process();

    let client_config = replica_client::ClientConfig {
        connection: replica_test::fast_config(),
    };
    let mut client = replica_client::Client::new(client_config, test_protocol(), client_transport);
    client.connect();
    server.process();
    let mut events = client.process();

    assert!(events.take_connection().is_some());
    let spawns = events.take_spawns();
    assert!(spawns.contains(&a) && spawns.contains(&b));
    assert_eq!(
        client.entity(a).unwrap().field("y"),
        Some(&Value::Int(2))
    );
    assert_eq!(
        client.entity(b).unwrap().field("x"),
        Some(&Value::Int(3))
    );
}

#[test]
fn spawning_an_unregistered_type_fails() {
    init();
    let (mut server, _client) = connected_pair(test_protocol(), test_protocol());
    assert!(server.spawn("Ghost", &[]).is_err());
}
