use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) fn next() -> Self {
        ConnectionId(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn serial(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection {}", self.0)
    }
}

/// Handle to a session owned by a connection.
///
/// Indices are never reused, so a handle to a freed session stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId {
    connection: ConnectionId,
    index: u32,
}

impl SessionId {
    pub(crate) fn new(connection: ConnectionId, index: u32) -> Self {
        SessionId { connection, index }
    }

    /// The owning connection
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub(crate) fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session {}:{}", self.connection.0, self.index)
    }
}

/// Handle to a link owned by a session of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId {
    connection: ConnectionId,
    index: u32,
}

impl LinkId {
    pub(crate) fn new(connection: ConnectionId, index: u32) -> Self {
        LinkId { connection, index }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub(crate) fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link {}:{}", self.connection.0, self.index)
    }
}
