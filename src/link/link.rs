use crate::endpoint::{Endpoint, Lifecycle, LinkId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Sender,
    Receiver,
}

impl Role {
    /// The role the peer's end of the same link has
    pub fn opposite(self) -> Role {
        match self {
            Role::Sender => Role::Receiver,
            Role::Receiver => Role::Sender,
        }
    }
}

/// Settings for a new sender or receiver
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// Explicit link name; generated from the connection when unset
    pub name: Option<String>,

    /// Source address
    pub source: Option<String>,

    /// Target address
    pub target: Option<String>,
}

impl LinkOptions {
    pub fn new() -> Self {
        LinkOptions::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn source(mut self, address: impl Into<String>) -> Self {
        self.source = Some(address.into());
        self
    }

    pub fn target(mut self, address: impl Into<String>) -> Self {
        self.target = Some(address.into());
        self
    }
}

/// Leaf endpoint; lives inside its connection's link table
#[derive(Debug, Clone)]
pub struct Link {
    id: LinkId,
    session: SessionId,
    role: Role,
    name: String,
    lifecycle: Lifecycle,

    /// Handle we attach with
    handle: u32,

    /// Handle the peer attached with
    remote_handle: Option<u32>,

    source: Option<String>,
    target: Option<String>,
    remote_source: Option<String>,
    remote_target: Option<String>,
}

impl Link {
    pub(crate) fn new(
        id: LinkId,
        session: SessionId,
        role: Role,
        name: String,
        handle: u32,
        options: LinkOptions,
    ) -> Self {
        Link {
            id,
            session,
            role,
            name,
            lifecycle: Lifecycle::new(),
            handle,
            remote_handle: None,
            source: options.source,
            target: options.target,
            remote_source: None,
            remote_target: None,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    /// The owning session
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_sender(&self) -> bool {
        self.role == Role::Sender
    }

    pub fn is_receiver(&self) -> bool {
        self.role == Role::Receiver
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> u32 {
        self.handle
    }

    pub fn remote_handle(&self) -> Option<u32> {
        self.remote_handle
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn remote_source(&self) -> Option<&str> {
        self.remote_source.as_deref()
    }

    pub fn remote_target(&self) -> Option<&str> {
        self.remote_target.as_deref()
    }

    /// Record the peer's ATTACH details
    pub(crate) fn set_remote(&mut self, handle: u32, source: Option<String>, target: Option<String>) {
        self.remote_handle = Some(handle);
        self.remote_source = source;
        self.remote_target = target;
    }
}

impl Endpoint for Link {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn label(&self) -> String {
        format!("{} {:?} '{}'", self.id, self.role, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ConnectionId;

    fn test_link(role: Role) -> Link {
        let conn = ConnectionId::next();
        Link::new(
            LinkId::new(conn, 0),
            SessionId::new(conn, 0),
            role,
            "c1/0".to_string(),
            0,
            LinkOptions::new().target("queue.a"),
        )
    }

    #[test]
    fn test_role_predicates() {
        let sender = test_link(Role::Sender);
        assert!(sender.is_sender());
        assert!(!sender.is_receiver());
        assert_eq!(sender.role().opposite(), Role::Receiver);
    }

    #[test]
    fn test_terminus() {
        let mut link = test_link(Role::Receiver);
        assert_eq!(link.target(), Some("queue.a"));
        assert_eq!(link.source(), None);

        link.set_remote(7, Some("queue.a".to_string()), None);
        assert_eq!(link.remote_handle(), Some(7));
        assert_eq!(link.remote_source(), Some("queue.a"));
    }
}
