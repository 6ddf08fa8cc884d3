use std::fmt;

/// Wrapping sequence number attached to ordered data packets and RPC calls.
pub type MessageSeq = u16;

/// Monotonic store-wide mutation counter, stamped onto each field as it
/// changes. Per-connection watermarks against this counter drive delta
/// computation.
pub type ChangeVersion = u64;

/// Identifies one entity within its owning store. Never reused for the
/// lifetime of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Identifies one client connection on the server. Assigned by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Which peer of a connection this process is. Used to label log output from
/// code shared by both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

impl HostType {
    pub fn label(&self) -> &'static str {
        match self {
            HostType::Server => "server",
            HostType::Client => "client",
        }
    }
}
