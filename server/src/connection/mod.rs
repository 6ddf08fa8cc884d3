mod connection;

pub use connection::{ClientConnection, SessionState};
