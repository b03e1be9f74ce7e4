use crate::endpoint::{ConnectionId, Endpoint, Lifecycle, LinkId, SessionId};

/// Mid-level endpoint; lives inside its connection's session table
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    lifecycle: Lifecycle,

    /// Channel we send BEGIN on
    channel: u16,

    /// Channel the peer sent BEGIN on
    remote_channel: Option<u16>,

    /// Links in creation order
    links: Vec<LinkId>,

    /// Next local link handle
    next_handle: u32,
}

impl Session {
    pub(crate) fn new(id: SessionId, channel: u16) -> Self {
        Session {
            id,
            lifecycle: Lifecycle::new(),
            channel,
            remote_channel: None,
            links: Vec::new(),
            next_handle: 0,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The owning connection
    pub fn connection(&self) -> ConnectionId {
        self.id.connection()
    }

    pub fn channel(&self) -> u16 {
        self.channel
    }

    pub fn remote_channel(&self) -> Option<u16> {
        self.remote_channel
    }

    pub(crate) fn set_remote_channel(&mut self, channel: u16) {
        self.remote_channel = Some(channel);
    }

    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub(crate) fn add_link(&mut self, link: LinkId) -> u32 {
        self.links.push(link);
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    pub(crate) fn remove_link(&mut self, link: LinkId) {
        self.links.retain(|l| *l != link);
    }
}

impl Endpoint for Session {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn label(&self) -> String {
        format!("{} (channel {})", self.id, self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointState;

    #[test]
    fn test_new_session() {
        let conn = ConnectionId::next();
        let session = Session::new(SessionId::new(conn, 0), 4);
        assert_eq!(session.connection(), conn);
        assert_eq!(session.channel(), 4);
        assert_eq!(session.remote_channel(), None);
        assert_eq!(session.state(), EndpointState::initial());
        assert!(session.links().is_empty());
    }

    #[test]
    fn test_link_handles_increase() {
        let conn = ConnectionId::next();
        let mut session = Session::new(SessionId::new(conn, 0), 0);
        assert_eq!(session.add_link(LinkId::new(conn, 0)), 0);
        assert_eq!(session.add_link(LinkId::new(conn, 1)), 1);

        session.remove_link(LinkId::new(conn, 0));
        assert_eq!(session.links(), &[LinkId::new(conn, 1)]);
        // Handles are not recycled after removal
        assert_eq!(session.add_link(LinkId::new(conn, 2)), 2);
    }
}
