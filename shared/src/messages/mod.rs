mod error;
mod packet;
mod sync_message;

pub use error::ProtocolError;
pub use packet::Packet;
pub use sync_message::SyncMessage;
