use replica_shared::{EntityType, Protocol};

use crate::helpers::hook_log::HookLog;

pub const PLAYER: &str = "Player";
pub const CONTROLLER: &str = "Controller";
pub const MOVE_METHOD: &str = "move";

/// Replicated `x`/`y` plus a local-only `focus` field the client may write
pub fn player_type() -> EntityType {
    EntityType::new(PLAYER)
        .with_field("x")
        .with_field("y")
        .with_local_field("focus")
}

/// One replicated `pawn` reference and the `move` RPC method
pub fn controller_type() -> EntityType {
    EntityType::new(CONTROLLER)
        .with_field("pawn")
        .with_method(MOVE_METHOD)
}

pub fn test_protocol() -> Protocol {
    Protocol::builder()
        .add_type(player_type())
        .add_type(controller_type())
        .build()
        .expect("fixture types are distinct")
}

/// Same protocol with every lifecycle hook wired into `log`, labelled
/// `player_spawn`, `player_despawn`, `controller_spawn`, `controller_despawn`.
pub fn test_protocol_with_hooks(log: &HookLog) -> Protocol {
    Protocol::builder()
        .add_type(player_type())
        .add_type(controller_type())
        .on_spawn(PLAYER, log.recorder("player_spawn"))
        .on_despawn(PLAYER, log.recorder("player_despawn"))
        .on_spawn(CONTROLLER, log.recorder("controller_spawn"))
        .on_despawn(CONTROLLER, log.recorder("controller_despawn"))
        .build()
        .expect("fixture types are distinct")
}
