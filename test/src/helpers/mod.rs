mod hook_log;
mod pair;
mod test_protocol;

pub use hook_log::HookLog;
pub use pair::{connected_pair, fast_config, tick};
pub use test_protocol::{
    controller_type, player_type, test_protocol, test_protocol_with_hooks, CONTROLLER, MOVE_METHOD,
    PLAYER,
};
