use replica_shared::ConnectionConfig;

/// Contains Config properties which will be used by the Client.
#[derive(Clone, Default)]
pub struct ClientConfig {
    /// Used to configure the connection with the Server
    pub connection: ConnectionConfig,
}
