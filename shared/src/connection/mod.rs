mod base_connection;
mod connection_config;

pub use base_connection::BaseConnection;
pub use connection_config::ConnectionConfig;
