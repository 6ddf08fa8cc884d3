//! RPC dispatch: same-tick visibility of handler mutations, schema
//! validation on both peers, and at-most-once application under duplicated
//! packets and duplicated call sequence numbers.

use std::{cell::RefCell, rc::Rc};

use replica_client::ClientError;
use replica_server::{Server, ServerConfig, ServerError};
use replica_shared::{
    ChannelServerTransport, ClientTransport, Packet, SyncMessage, Value,
};
use replica_test::{connected_pair, fast_config, test_protocol, CONTROLLER, MOVE_METHOD, PLAYER};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn handler_mutations_arrive_in_the_same_tick() {
    init();
    let (mut server, mut client) = connected_pair(test_protocol(), test_protocol());

    let player = server
        .spawn(PLAYER, &[("x", Value::Int(0)), ("y", Value::Int(0))])
        .unwrap();
    let controller = client.controller().unwrap();
    server
        .set_field(controller, "pawn", Value::EntityRef(player))
        .unwrap();

    server
        .on_rpc(CONTROLLER, MOVE_METHOD, |world, context, args| {
            let Some(Value::EntityRef(pawn)) = world
                .entity(context.target)
                .and_then(|entity| entity.field("pawn").cloned())
            else {
                return;
            };
            let (Some(Value::Int(dx)), Some(Value::Int(dy))) =
                (args.first().cloned(), args.get(1).cloned())
            else {
                return;
            };
            let Some(Value::Int(x)) = world.entity(pawn).and_then(|e| e.field("x").cloned())
            else {
                return;
            };
            let Some(Value::Int(y)) = world.entity(pawn).and_then(|e| e.field("y").cloned())
            else {
                return;
            };
            world.set_field(pawn, "x", Value::Int(x + dx)).unwrap();
            world.set_field(pawn, "y", Value::Int(y + dy)).unwrap();
        })
        .unwrap();

    // sync the player and the pawn reference down first
    server.process();
    client.process();

    client
        .call_rpc(controller, MOVE_METHOD, &[Value::Int(1), Value::Int(0)])
        .unwrap();
    // client tick flushes the call, the server tick both applies it and
    // emits the resulting update
    client.process();
    server.process();
    let mut events = client.process();

    assert_eq!(events.take_updates(), vec![(player, vec!["x".to_owned()])]);
    assert_eq!(
        client.entity(player).unwrap().field("x"),
        Some(&Value::Int(1))
    );
}

#[test]
fn undeclared_method_is_rejected_on_both_peers() {
    init();
    let (mut server, mut client) = connected_pair(test_protocol(), test_protocol());
    let controller = client.controller().unwrap();

    assert!(matches!(
        client.call_rpc(controller, "teleport", &[]),
        Err(ClientError::Registry(_))
    ));
    assert!(matches!(
        server.on_rpc(CONTROLLER, "teleport", |_, _, _| {}),
        Err(ServerError::Registry(_))
    ));
}

#[test]
fn rpc_requires_a_connection() {
    init();
    let (_server, mut client) = connected_pair(test_protocol(), test_protocol());
    let controller = client.controller().unwrap();
    client.disconnect();
    assert_eq!(
        client.call_rpc(controller, MOVE_METHOD, &[]),
        Err(ClientError::NotConnected)
    );
}

/// Drives the server with hand-built packets so packet replay and sequence
/// replay can be staged exactly.
#[test]
fn duplicated_calls_apply_at_most_once() {
    init();
    let mut transport = ChannelServerTransport::new();
    let mut wire = transport.open_client();

    let mut config = ServerConfig::new(CONTROLLER);
    config.connection = fast_config();
    let mut server = Server::new(config, test_protocol(), transport).unwrap();

    let calls = Rc::new(RefCell::new(0u32));
    let counter = Rc::clone(&calls);
    server
        .on_rpc(CONTROLLER, MOVE_METHOD, move |_, _, _| {
            *counter.borrow_mut() += 1;
        })
        .unwrap();

    wire.send(&Packet::ClientHello.to_bytes()).unwrap();
    server.process();
    let controller = loop {
        let payload = wire.receive().unwrap().expect("welcome is queued");
        if let Packet::ServerWelcome { controller } = Packet::read(&payload).unwrap() {
            break controller;
        }
    };

    let call = |rpc_seq| SyncMessage::RpcCall {
        target: controller,
        method: MOVE_METHOD.to_owned(),
        args: vec![],
        seq: rpc_seq,
    };

    // the same packet twice: the duplicate packet seq is dropped outright
    let first = Packet::Data {
        seq: 0,
        messages: vec![call(0)],
    };
    wire.send(&first.to_bytes()).unwrap();
    wire.send(&first.to_bytes()).unwrap();
    server.process();
    assert_eq!(*calls.borrow(), 1);

    // a fresh packet replaying an already-applied call seq
    let replay = Packet::Data {
        seq: 1,
        messages: vec![call(0)],
    };
    wire.send(&replay.to_bytes()).unwrap();
    server.process();
    assert_eq!(*calls.borrow(), 1);

    // the next call seq goes through
    let next = Packet::Data {
        seq: 2,
        messages: vec![call(1)],
    };
    wire.send(&next.to_bytes()).unwrap();
    server.process();
    assert_eq!(*calls.borrow(), 2);
}

#[test]
fn call_to_an_undeclared_method_is_a_protocol_error() {
    init();
    let mut transport = ChannelServerTransport::new();
    let mut wire = transport.open_client();

    let mut config = ServerConfig::new(CONTROLLER);
    config.connection = fast_config();
    let mut server = Server::new(config, test_protocol(), transport).unwrap();

    wire.send(&Packet::ClientHello.to_bytes()).unwrap();
    server.process();
    let controller = loop {
        let payload = wire.receive().unwrap().expect("welcome is queued");
        if let Packet::ServerWelcome { controller } = Packet::read(&payload).unwrap() {
            break controller;
        }
    };

    let bad = Packet::Data {
        seq: 0,
        messages: vec![SyncMessage::RpcCall {
            target: controller,
            method: "teleport".to_owned(),
            args: vec![],
            seq: 0,
        }],
    };
    wire.send(&bad.to_bytes()).unwrap();
    let mut events = server.process();
    let errors = events.take_errors();
    assert!(
        errors
            .iter()
            .any(|error| matches!(error, ServerError::Protocol { .. })),
        "expected a protocol error, got {errors:?}"
    );
}
