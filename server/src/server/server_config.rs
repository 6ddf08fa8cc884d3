use replica_shared::ConnectionConfig;

/// Contains Config properties which will be used by the Server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Type constructed as the Controller entity for each new connection.
    /// Must name a registered type.
    pub controller_type: String,
    /// Used to configure the connections with Clients
    pub connection: ConnectionConfig,
}

impl ServerConfig {
    pub fn new(controller_type: impl Into<String>) -> Self {
        Self {
            controller_type: controller_type.into(),
            connection: ConnectionConfig::default(),
        }
    }
}
