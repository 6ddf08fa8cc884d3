use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by a connection on either
/// peer.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// A peer silent for longer than this is considered gone
    pub liveness_timeout: Duration,
    /// Interval at which a Heartbeat packet is sent if nothing else was
    pub heartbeat_interval: Duration,
    /// Client-side: interval at which the hello packet is re-sent until the
    /// server's welcome arrives
    pub handshake_retry: Duration,
    /// Consecutive protocol violations tolerated before the connection is
    /// torn down
    pub protocol_error_limit: u32,
    /// Out-of-order data packets held back before the gap is declared lost
    /// and reception skips forward
    pub reorder_buffer_limit: usize,
    /// Client-side: how long an update for a not-yet-spawned entity is
    /// buffered before being dropped
    pub waitlist_ttl: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: Duration::from_secs(10),
            heartbeat_interval: Duration::from_secs(3),
            handshake_retry: Duration::from_secs(1),
            protocol_error_limit: 8,
            reorder_buffer_limit: 64,
            waitlist_ttl: Duration::from_secs(10),
        }
    }
}
