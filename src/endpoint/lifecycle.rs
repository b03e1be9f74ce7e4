use log::{debug, trace};
use crate::endpoint::{Condition, EndpointState};
use crate::{Error, Result};

/// Local/remote state plus the condition attached to each side
#[derive(Debug, Clone, PartialEq)]
pub struct Lifecycle {
    state: EndpointState,
    local_condition: Option<Condition>,
    remote_condition: Option<Condition>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle {
            state: EndpointState::initial(),
            local_condition: None,
            remote_condition: None,
        }
    }

    pub fn state(&self) -> EndpointState {
        self.state
    }

    pub fn local_condition(&self) -> Option<&Condition> {
        self.local_condition.as_ref()
    }

    pub fn remote_condition(&self) -> Option<&Condition> {
        self.remote_condition.as_ref()
    }

    /// LOCAL_UNINIT -> LOCAL_ACTIVE. Returns false when nothing changed.
    ///
    /// Opening an active endpoint is a no-op, and so is reopening a closed
    /// one: local state never moves backwards.
    pub fn open_local(&mut self) -> bool {
        if !self.state.is_local_uninit() {
            trace!("Ignoring local open in state {}", self.state);
            return false;
        }
        self.state = self.state.with_local(EndpointState::LOCAL_ACTIVE);
        true
    }

    /// Any local state -> LOCAL_CLOSED. Returns false if already closed.
    ///
    /// A supplied condition replaces the local one even on a repeated close.
    pub fn close_local(&mut self, condition: Option<Condition>) -> bool {
        if condition.is_some() {
            self.local_condition = condition;
        }
        if self.state.is_local_closed() {
            trace!("Ignoring local close in state {}", self.state);
            return false;
        }
        self.state = self.state.with_local(EndpointState::LOCAL_CLOSED);
        true
    }

    /// REMOTE_UNINIT -> REMOTE_ACTIVE on the peer's open/begin/attach
    pub fn open_remote(&mut self) -> Result<()> {
        if !self.state.is_remote_uninit() {
            return Err(Error::protocol(format!(
                "Peer opened an endpoint already in state {}",
                self.state
            )));
        }
        self.state = self.state.with_remote(EndpointState::REMOTE_ACTIVE);
        Ok(())
    }

    /// REMOTE_ACTIVE -> REMOTE_CLOSED on the peer's close/end/detach
    pub fn close_remote(&mut self, condition: Option<Condition>) -> Result<()> {
        if !self.state.is_remote_active() {
            return Err(Error::protocol(format!(
                "Peer closed an endpoint in state {}",
                self.state
            )));
        }
        self.remote_condition = condition;
        self.state = self.state.with_remote(EndpointState::REMOTE_CLOSED);
        Ok(())
    }

    /// Neither side is active, so the endpoint may be freed
    pub fn is_settled(&self) -> bool {
        !self.state.is_local_active() && !self.state.is_remote_active()
    }
}

/// Behaviour shared by connections, sessions and links
pub trait Endpoint {
    fn lifecycle(&self) -> &Lifecycle;

    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// Short label for log lines
    fn label(&self) -> String;

    fn state(&self) -> EndpointState {
        self.lifecycle().state()
    }

    fn open(&mut self) {
        if self.lifecycle_mut().open_local() {
            debug!("{} opened locally", self.label());
        }
    }

    fn close(&mut self, condition: Option<Condition>) {
        if self.lifecycle_mut().close_local(condition) {
            debug!("{} closed locally ({})", self.label(), self.state());
        }
    }

    fn local_condition(&self) -> Option<&Condition> {
        self.lifecycle().local_condition()
    }

    fn remote_condition(&self) -> Option<&Condition> {
        self.lifecycle().remote_condition()
    }

    /// The peer's condition if it sent one, otherwise our own
    fn condition(&self) -> Option<&Condition> {
        self.remote_condition().or_else(|| self.local_condition())
    }
}
