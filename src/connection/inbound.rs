use log::{debug, trace, warn};
use crate::connection::Connection;
use crate::endpoint::{Condition, Endpoint, LinkId, SessionId};
use crate::link::{LinkOptions, Role};
use crate::transport::{Frame, RemoteOpen};
use crate::{Error, Result};

impl Connection {
    /// Apply one inbound performative to remote endpoint state.
    ///
    /// Frames that break AMQP ordering rules are rejected with
    /// `Error::Protocol` and leave all state untouched.
    pub fn process(&mut self, frame: Frame) -> Result<()> {
        trace!("{} processing {}", self.id, frame.name());
        let result = match frame {
            Frame::Open(open) => self.remote_open(open),
            Frame::Close { error } => self.remote_close(error),
            Frame::Begin { channel, remote_channel } => self.remote_begin(channel, remote_channel),
            Frame::End { channel, error } => self.remote_end(channel, error),
            Frame::Attach { channel, handle, name, role, source, target } => {
                self.remote_attach(channel, handle, name, role, source, target)
            }
            Frame::Detach { channel, handle, error } => self.remote_detach(channel, handle, error),
        };
        if let Err(e) = &result {
            warn!("{} rejected inbound frame: {}", self.id, e);
        }
        result
    }

    /// Apply frames in arrival order, stopping at the first rejected one
    pub fn process_all<I>(&mut self, frames: I) -> Result<()>
    where
        I: IntoIterator<Item = Frame>,
    {
        for frame in frames {
            self.process(frame)?;
        }
        Ok(())
    }

    fn remote_open(&mut self, open: RemoteOpen) -> Result<()> {
        self.lifecycle.open_remote()?;
        debug!(
            "{} opened by peer container {} (idle timeout {:?} ms)",
            self.id, open.container_id, open.idle_timeout
        );
        if let Some(transport) = self.transport.as_mut() {
            transport.set_remote_idle_timeout(open.idle_timeout);
        }
        self.remote = Some(open);
        Ok(())
    }

    fn remote_close(&mut self, error: Option<Condition>) -> Result<()> {
        self.lifecycle.close_remote(error)?;
        debug!("{} closed by peer ({})", self.id, self.lifecycle.state());
        Ok(())
    }

    fn require_remote_open(&self, what: &str) -> Result<()> {
        if !self.lifecycle.state().is_remote_active() {
            return Err(Error::protocol(format!(
                "{} received while connection is {}",
                what,
                self.lifecycle.state()
            )));
        }
        Ok(())
    }

    /// Session the peer has begun on `channel` and not yet ended
    fn session_on_remote_channel(&self, channel: u16) -> Option<SessionId> {
        self.session_order.iter().copied().find(|id| {
            self.sessions.get(&id.index()).is_some_and(|s| {
                s.remote_channel() == Some(channel) && s.state().is_remote_active()
            })
        })
    }

    fn remote_begin(&mut self, channel: u16, remote_channel: Option<u16>) -> Result<()> {
        self.require_remote_open("BEGIN")?;
        if self.session_on_remote_channel(channel).is_some() {
            return Err(Error::protocol(format!("BEGIN on channel {} already in use", channel)));
        }

        let id = match remote_channel {
            Some(local) => self.session_order.iter().copied()
                .find(|id| {
                    self.sessions.get(&id.index()).is_some_and(|s| {
                        s.channel() == local && s.state().is_remote_uninit()
                    })
                })
                .ok_or_else(|| Error::protocol(format!(
                    "BEGIN answers channel {} with no session awaiting it",
                    local
                )))?,
            None => self.insert_session()?,
        };

        let session = self.session_mut(id)?;
        session.lifecycle_mut().open_remote()?;
        session.set_remote_channel(channel);
        debug!("{} begun by peer on channel {}", id, channel);
        Ok(())
    }

    fn remote_end(&mut self, channel: u16, error: Option<Condition>) -> Result<()> {
        let id = self.session_on_remote_channel(channel)
            .ok_or_else(|| Error::protocol(format!("END on channel {} with no session", channel)))?;

        self.session_mut(id)?.lifecycle_mut().close_remote(error)?;
        debug!("{} ended by peer", id);
        Ok(())
    }

    /// Link attached by the peer with `handle` and not yet detached
    fn link_on_remote_handle(&self, session: SessionId, handle: u32) -> Result<Option<LinkId>> {
        let links = self.session(session)?.links();
        Ok(links.iter().copied().find(|id| {
            self.links.get(&id.index()).is_some_and(|l| {
                l.remote_handle() == Some(handle) && l.state().is_remote_active()
            })
        }))
    }

    fn remote_attach(
        &mut self,
        channel: u16,
        handle: u32,
        name: String,
        role: Role,
        source: Option<String>,
        target: Option<String>,
    ) -> Result<()> {
        let session = self.session_on_remote_channel(channel)
            .ok_or_else(|| Error::protocol(format!("ATTACH on channel {} with no session", channel)))?;
        if self.link_on_remote_handle(session, handle)?.is_some() {
            return Err(Error::protocol(format!(
                "ATTACH with handle {} already in use on channel {}",
                handle, channel
            )));
        }

        // Our end of the link has the complementary role
        let local_role = role.opposite();
        let existing = self.session(session)?.links().iter().copied().find(|id| {
            self.links.get(&id.index()).is_some_and(|l| {
                l.role() == local_role && l.name() == name && l.state().is_remote_uninit()
            })
        });

        let id = match existing {
            Some(id) => id,
            None => self.insert_link(session, local_role, name, LinkOptions::new())?,
        };

        let link = self.link_mut(id)?;
        link.lifecycle_mut().open_remote()?;
        link.set_remote(handle, source, target);
        debug!("{} attached by peer with handle {}", id, handle);
        Ok(())
    }

    fn remote_detach(&mut self, channel: u16, handle: u32, error: Option<Condition>) -> Result<()> {
        let session = self.session_on_remote_channel(channel)
            .ok_or_else(|| Error::protocol(format!("DETACH on channel {} with no session", channel)))?;
        let id = self.link_on_remote_handle(session, handle)?
            .ok_or_else(|| Error::protocol(format!(
                "DETACH for unattached handle {} on channel {}",
                handle, channel
            )))?;

        self.link_mut(id)?.lifecycle_mut().close_remote(error)?;
        debug!("{} detached by peer", id);
        Ok(())
    }
}
