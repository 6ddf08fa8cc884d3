//! Session teardown: liveness timeouts, transport loss, heartbeat
//! keepalive, and the ascending-id hook order of a client mirror teardown.

use std::time::Duration;

use replica_shared::Value;
use replica_test::{connected_pair, test_protocol, test_protocol_with_hooks, HookLog, PLAYER};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn silent_client_times_out_and_controller_despawns_once() {
    init();
    let log = HookLog::new();
    let (mut server, client) =
        connected_pair(test_protocol_with_hooks(&log), test_protocol());
    assert_eq!(log.count("controller_spawn"), 1);

    // keep the client alive but silent past the liveness timeout
    std::thread::sleep(Duration::from_millis(150));
    let mut events = server.process();

    assert_eq!(events.take_disconnects().len(), 1);
    assert_eq!(server.connection_count(), 0);
    assert_eq!(server.entities().count(), 0, "the Controller must not leak");
    assert_eq!(log.count("controller_despawn"), 1);

    // another tick must not re-fire anything
    let mut events = server.process();
    assert!(events.take_disconnects().is_empty());
    assert_eq!(log.count("controller_despawn"), 1);

    drop(client);
}

#[test]
fn transport_loss_drains_the_connection() {
    init();
    let log = HookLog::new();
    let (mut server, client) =
        connected_pair(test_protocol_with_hooks(&log), test_protocol());

    drop(client);
    let mut disconnects = Vec::new();
    for _ in 0..10 {
        std::thread::sleep(Duration::from_millis(25));
        let mut events = server.process();
        disconnects.extend(events.take_disconnects());
        if !disconnects.is_empty() {
            break;
        }
    }

    assert_eq!(disconnects.len(), 1);
    assert_eq!(server.connection_count(), 0);
    assert_eq!(log.count("controller_despawn"), 1);
}

#[test]
fn heartbeats_keep_an_idle_connection_alive() {
    init();
    let (mut server, mut client) = connected_pair(test_protocol(), test_protocol());

    // idle for twice the liveness timeout; heartbeats carry the session
    for _ in 0..8 {
        std::thread::sleep(Duration::from_millis(25));
        let (mut server_events, mut client_events) = replica_test::tick(&mut server, &mut client);
        assert!(server_events.take_disconnects().is_empty());
        assert!(!client_events.take_disconnection());
    }

    assert!(client.is_connected());
    assert_eq!(server.connection_count(), 1);
}

#[test]
fn client_teardown_fires_despawns_in_ascending_id_order() {
    init();
    let log = HookLog::new();
    let (mut server, mut client) =
        connected_pair(test_protocol(), test_protocol_with_hooks(&log));

    let controller = client.controller().unwrap();
    let a = server
        .spawn(PLAYER, &[("x", Value::Int(0)), ("y", Value::Int(0))])
        .unwrap();
    let b = server
        .spawn(PLAYER, &[("x", Value::Int(1)), ("y", Value::Int(1))])
        .unwrap();
    server.process();
    client.process();
    assert_eq!(client.store().len(), 3);

    // server gone: the client's next tick observes the closed transport
    drop(server);
    let mut events = client.process();

    assert!(events.take_disconnection());
    assert_eq!(events.take_despawns(), vec![controller, a, b]);
    assert!(client.store().is_empty());
    assert!(!client.is_connected());
    assert_eq!(log.count("controller_despawn"), 1);
    assert_eq!(log.ids_for("player_despawn"), vec![a, b]);
}
