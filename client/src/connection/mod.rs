mod connection;

pub use connection::ConnectionState;
pub(crate) use connection::ServerConnection;
