use crate::codec::Data;
use crate::endpoint::Condition;
use crate::link::Role;

/// Fields of the peer's OPEN performative.
///
/// Capabilities and properties stay encoded; the connection decodes them
/// only when asked.
#[derive(Debug, Clone, Default)]
pub struct RemoteOpen {
    pub container_id: String,
    pub hostname: Option<String>,
    /// Milliseconds; zero or absent means no timeout
    pub idle_timeout: Option<u32>,
    pub offered_capabilities: Data,
    pub desired_capabilities: Data,
    pub properties: Data,
}

impl RemoteOpen {
    pub fn new(container_id: impl Into<String>) -> Self {
        RemoteOpen {
            container_id: container_id.into(),
            ..RemoteOpen::default()
        }
    }
}

/// Inbound performatives that move remote endpoint state
#[derive(Debug, Clone)]
pub enum Frame {
    Open(RemoteOpen),

    Begin {
        /// Channel the frame arrived on
        channel: u16,
        /// Our channel, when the peer is answering our BEGIN
        remote_channel: Option<u16>,
    },

    Attach {
        channel: u16,
        handle: u32,
        name: String,
        /// The peer's role
        role: Role,
        source: Option<String>,
        target: Option<String>,
    },

    Detach {
        channel: u16,
        handle: u32,
        error: Option<Condition>,
    },

    End {
        channel: u16,
        error: Option<Condition>,
    },

    Close {
        error: Option<Condition>,
    },
}

impl Frame {
    /// Performative name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Open(_) => "OPEN",
            Frame::Begin { .. } => "BEGIN",
            Frame::Attach { .. } => "ATTACH",
            Frame::Detach { .. } => "DETACH",
            Frame::End { .. } => "END",
            Frame::Close { .. } => "CLOSE",
        }
    }
}
