use std::collections::HashMap;
use crate::endpoint::{Endpoint, EndpointState, LinkId, SessionId};
use crate::link::{Link, Role};
use crate::session::Session;

/// Lazy walk over sessions in creation order, filtered by a state mask.
///
/// Cheap to recreate; each call to `Connection::each_session` starts from
/// the head again.
pub struct Sessions<'a> {
    order: &'a [SessionId],
    sessions: &'a HashMap<u32, Session>,
    mask: EndpointState,
    pos: usize,
}

impl<'a> Sessions<'a> {
    pub(super) fn new(
        order: &'a [SessionId],
        sessions: &'a HashMap<u32, Session>,
        mask: EndpointState,
    ) -> Self {
        Sessions { order, sessions, mask, pos: 0 }
    }
}

impl<'a> Iterator for Sessions<'a> {
    type Item = &'a Session;

    fn next(&mut self) -> Option<&'a Session> {
        while let Some(id) = self.order.get(self.pos) {
            self.pos += 1;
            if let Some(session) = self.sessions.get(&id.index()) {
                if session.state().matches(self.mask) {
                    return Some(session);
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.order.len() - self.pos))
    }
}

/// Lazy walk over links in creation order, filtered by state mask and
/// optionally by role
pub struct Links<'a> {
    order: &'a [LinkId],
    links: &'a HashMap<u32, Link>,
    mask: EndpointState,
    role: Option<Role>,
    pos: usize,
}

impl<'a> Links<'a> {
    pub(super) fn new(
        order: &'a [LinkId],
        links: &'a HashMap<u32, Link>,
        mask: EndpointState,
        role: Option<Role>,
    ) -> Self {
        Links { order, links, mask, role, pos: 0 }
    }
}

impl<'a> Iterator for Links<'a> {
    type Item = &'a Link;

    fn next(&mut self) -> Option<&'a Link> {
        while let Some(id) = self.order.get(self.pos) {
            self.pos += 1;
            let Some(link) = self.links.get(&id.index()) else {
                continue;
            };
            if self.role.is_some_and(|role| role != link.role()) {
                continue;
            }
            if link.state().matches(self.mask) {
                return Some(link);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.order.len() - self.pos))
    }
}

#[cfg(test)]
mod tests {
    use crate::connection::Connection;
    use crate::endpoint::{Endpoint, EndpointState};
    use crate::link::LinkOptions;

    #[test]
    fn test_empty_connection() {
        let conn = Connection::new();
        assert!(conn.each_session(EndpointState::ANY).next().is_none());
        assert!(conn.each_link(EndpointState::ANY).next().is_none());
        assert!(conn.senders().next().is_none());
    }

    #[test]
    fn test_single_child() {
        let mut conn = Connection::new();
        let session = conn.open_session().unwrap();
        let ids: Vec<_> = conn.each_session(EndpointState::ANY).map(|s| s.id()).collect();
        assert_eq!(ids, vec![session]);
    }

    #[test]
    fn test_mask_filter() {
        let mut conn = Connection::new();
        let a = conn.open_session().unwrap();
        let b = conn.open_session().unwrap();
        conn.session_mut(a).unwrap().close(None);

        let active: Vec<_> = conn.each_session(EndpointState::LOCAL_ACTIVE).map(|s| s.id()).collect();
        assert_eq!(active, vec![b]);

        let closed: Vec<_> = conn
            .each_session(EndpointState::LOCAL_CLOSED | EndpointState::REMOTE_UNINIT)
            .map(|s| s.id())
            .collect();
        assert_eq!(closed, vec![a]);
    }

    #[test]
    fn test_restartable() {
        let mut conn = Connection::new();
        conn.open_session().unwrap();
        conn.open_session().unwrap();
        assert_eq!(conn.each_session(EndpointState::ANY).count(), 2);
        assert_eq!(conn.each_session(EndpointState::ANY).count(), 2);
    }

    #[test]
    fn test_role_selection() {
        let mut conn = Connection::new();
        let session = conn.open_session().unwrap();
        let s1 = conn.open_sender(session, LinkOptions::new()).unwrap();
        let r1 = conn.open_receiver(session, LinkOptions::new()).unwrap();
        let s2 = conn.open_sender(session, LinkOptions::new()).unwrap();

        let senders: Vec<_> = conn.senders().map(|l| l.id()).collect();
        let receivers: Vec<_> = conn.receivers().map(|l| l.id()).collect();
        assert_eq!(senders, vec![s1, s2]);
        assert_eq!(receivers, vec![r1]);

        let all: Vec<_> = conn.session_links(session, EndpointState::ANY).unwrap().map(|l| l.id()).collect();
        assert_eq!(all, vec![s1, r1, s2]);
    }
}
