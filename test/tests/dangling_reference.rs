//! Reference validation: the server refuses to despawn a referenced entity,
//! while the client mirror follows the authoritative despawn and surfaces a
//! stale local reference as a recoverable error.

use replica_client::ClientError;
use replica_server::ServerError;
use replica_shared::{StoreError, Value};
use replica_test::{connected_pair, test_protocol, PLAYER};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn server_refuses_despawn_while_referenced() {
    init();
    let (mut server, client) = connected_pair(test_protocol(), test_protocol());

    let player = server
        .spawn(PLAYER, &[("x", Value::Int(0)), ("y", Value::Int(0))])
        .unwrap();
    let controller = client.controller().unwrap();
    server
        .set_field(controller, "pawn", Value::EntityRef(player))
        .unwrap();

    let error = server.despawn(player).unwrap_err();
    assert_eq!(
        error,
        ServerError::Store(StoreError::DanglingReference {
            target: player,
            referencer: controller,
            field: "pawn".to_owned(),
        })
    );
    assert!(server.entity(player).is_some(), "rejected despawn is a no-op");

    // null the reference first, then the despawn goes through
    server.set_field(controller, "pawn", Value::Null).unwrap();
    server.despawn(player).unwrap();
    assert!(server.entity(player).is_none());
}

#[test]
fn client_mirror_follows_despawn_past_stale_local_reference() {
    init();
    let (mut server, mut client) = connected_pair(test_protocol(), test_protocol());

    let a = server
        .spawn(PLAYER, &[("x", Value::Int(0)), ("y", Value::Int(0))])
        .unwrap();
    let b = server
        .spawn(PLAYER, &[("x", Value::Int(1)), ("y", Value::Int(1))])
        .unwrap();
    server.process();
    client.process();

    // client-side-only state pointing at `b`
    client
        .set_local_field(a, "focus", Value::EntityRef(b))
        .unwrap();

    server.despawn(b).unwrap();
    server.process();
    let mut events = client.process();

    assert!(
        client.entity(b).is_none(),
        "the server is authoritative, the mirror must remove b"
    );
    assert!(client.is_connected());
    let errors = events.take_errors();
    assert_eq!(
        errors,
        vec![ClientError::Store(StoreError::DanglingReference {
            target: b,
            referencer: a,
            field: "focus".to_owned(),
        })]
    );
}

#[test]
fn replicated_fields_reject_client_writes() {
    init();
    let (mut server, mut client) = connected_pair(test_protocol(), test_protocol());

    let player = server
        .spawn(PLAYER, &[("x", Value::Int(0)), ("y", Value::Int(0))])
        .unwrap();
    server.process();
    client.process();

    assert!(matches!(
        client.set_local_field(player, "x", Value::Int(9)),
        Err(ClientError::FieldNotLocal { .. })
    ));
    // the local field itself is writable and never replicated back
    assert!(client
        .set_local_field(player, "focus", Value::Bool(true))
        .unwrap());
}
