use std::collections::{BTreeMap, HashMap};
use log::{debug, trace};
use num_rational::Ratio;
use crate::codec::{AmqpValue, Data};
use crate::connection::config::ConnectionOptions;
use crate::connection::iter::{Links, Sessions};
use crate::endpoint::{ConnectionId, EndpointState, Endpoint, Lifecycle, LinkId, SessionId};
use crate::link::{Link, LinkOptions, Role};
use crate::session::Session;
use crate::transport::{RemoteOpen, Transport};
use crate::{generate_uuid, Error, Result};

/// Options validated and encoded, waiting for `open`
#[derive(Debug, Default)]
struct PendingConfig {
    options: ConnectionOptions,
    offered_capabilities: Option<Data>,
    desired_capabilities: Option<Data>,
    properties: Option<Data>,
}

/// Top-level AMQP endpoint.
///
/// A connection exclusively owns its sessions and links; callers refer to
/// them through `SessionId`/`LinkId` handles that fail with
/// `Error::UnknownEndpoint` once the endpoint is freed or when presented
/// to a different connection.
#[derive(Debug)]
pub struct Connection {
    pub(super) id: ConnectionId,
    pub(super) lifecycle: Lifecycle,

    /// Id of the enclosing container, if created through one
    pub(super) container: Option<String>,

    pending: Option<PendingConfig>,

    container_id: Option<String>,
    hostname: Option<String>,
    user: Option<String>,
    password: Option<String>,
    idle_timeout: Option<u32>,
    offered_capabilities: Data,
    desired_capabilities: Data,
    properties: Data,

    /// Peer's OPEN, once received
    pub(super) remote: Option<RemoteOpen>,

    link_prefix: Option<String>,
    link_counter: u64,

    pub(super) sessions: HashMap<u32, Session>,
    pub(super) session_order: Vec<SessionId>,
    next_session: u32,
    default_session: Option<SessionId>,

    pub(super) links: HashMap<u32, Link>,
    pub(super) link_order: Vec<LinkId>,
    next_link: u32,

    pub(super) transport: Option<Transport>,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    /// Create a connection detached from any container or transport
    pub fn new() -> Self {
        let id = ConnectionId::next();
        trace!("Created {}", id);

        Connection {
            id,
            lifecycle: Lifecycle::new(),
            container: None,
            pending: None,
            container_id: None,
            hostname: None,
            user: None,
            password: None,
            idle_timeout: None,
            offered_capabilities: Data::new(),
            desired_capabilities: Data::new(),
            properties: Data::new(),
            remote: None,
            link_prefix: None,
            link_counter: 0,
            sessions: HashMap::new(),
            session_order: Vec::new(),
            next_session: 0,
            default_session: None,
            links: HashMap::new(),
            link_order: Vec::new(),
            next_link: 0,
            transport: None,
        }
    }

    /// Create a connection inside a container whose id is the fallback
    /// container id
    pub(crate) fn in_container(container_id: impl Into<String>) -> Self {
        let mut connection = Connection::new();
        connection.container = Some(container_id.into());
        connection
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Validate and stage options; they take effect on the next `open`.
    ///
    /// Capabilities and properties are encoded here so that `open` itself
    /// cannot fail. Staging again replaces earlier staged options.
    pub fn configure(&mut self, options: ConnectionOptions) -> Result<()> {
        options.validate()?;

        let offered_capabilities = options.offered_capabilities.as_deref()
            .map(encode_symbols)
            .transpose()?;
        let desired_capabilities = options.desired_capabilities.as_deref()
            .map(encode_symbols)
            .transpose()?;
        let properties = options.properties.as_ref()
            .map(|props| {
                let mut data = Data::new();
                data.put(&AmqpValue::Map(props.clone()))?;
                Ok::<_, Error>(data)
            })
            .transpose()?;

        self.pending = Some(PendingConfig {
            options,
            offered_capabilities,
            desired_capabilities,
            properties,
        });
        Ok(())
    }

    /// Stage `options` and open
    pub fn open_with(&mut self, options: ConnectionOptions) -> Result<()> {
        if !self.lifecycle.state().is_local_uninit() {
            debug!("{} already opened, ignoring options", self.id);
            return Ok(());
        }
        self.configure(options)?;
        self.open();
        Ok(())
    }

    /// Move staged configuration into the live fields
    fn apply_pending(&mut self) {
        let pending = self.pending.take().unwrap_or_default();
        let idle_timeout = pending.options.idle_timeout_millis();
        let options = pending.options;

        let container_id = options.container_id
            .or_else(|| self.container_id.take())
            .or_else(|| self.container.clone())
            .unwrap_or_else(generate_uuid);
        debug!("{} using container id {}", self.id, container_id);
        self.container_id = Some(container_id);

        if options.hostname.is_some() {
            self.hostname = options.hostname;
        }
        if options.user.is_some() {
            self.user = options.user;
            self.password = options.password;
        }
        if let Some(millis) = idle_timeout {
            self.idle_timeout = Some(millis);
        }
        if let Some(data) = pending.offered_capabilities {
            self.offered_capabilities = data;
        }
        if let Some(data) = pending.desired_capabilities {
            self.desired_capabilities = data;
        }
        if let Some(data) = pending.properties {
            self.properties = data;
        }
        if options.link_prefix.is_some() {
            self.link_prefix = options.link_prefix;
        }

        self.push_idle_timeout();
    }

    fn push_idle_timeout(&mut self) {
        if let (Some(transport), Some(millis)) = (self.transport.as_mut(), self.idle_timeout) {
            transport.set_idle_timeout(Some(millis));
        }
    }

    /// Local container id; resolved when the connection opens
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Authenticated peer identity for incoming connections, otherwise the
    /// configured user
    pub fn user(&self) -> Option<&str> {
        self.transport.as_ref()
            .and_then(Transport::authenticated_user)
            .or(self.user.as_deref())
    }

    /// Whether a password was configured. The password itself is never
    /// handed back.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn remote_container_id(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.container_id.as_str())
    }

    pub fn remote_hostname(&self) -> Option<&str> {
        self.remote.as_ref().and_then(|r| r.hostname.as_deref())
    }

    /// Raw encoded slot for our offered capabilities
    pub fn offered_capabilities_data(&self) -> &Data {
        &self.offered_capabilities
    }

    pub fn desired_capabilities_data(&self) -> &Data {
        &self.desired_capabilities
    }

    pub fn properties_data(&self) -> &Data {
        &self.properties
    }

    pub fn offered_capabilities(&self) -> Result<Option<Vec<String>>> {
        decode_symbols(&self.offered_capabilities)
    }

    pub fn desired_capabilities(&self) -> Result<Option<Vec<String>>> {
        decode_symbols(&self.desired_capabilities)
    }

    pub fn properties(&self) -> Result<Option<BTreeMap<String, AmqpValue>>> {
        decode_properties(&self.properties)
    }

    /// Decoded from the peer's OPEN on every call
    pub fn remote_offered_capabilities(&self) -> Result<Option<Vec<String>>> {
        match &self.remote {
            Some(remote) => decode_symbols(&remote.offered_capabilities),
            None => Ok(None),
        }
    }

    /// Decoded from the peer's OPEN on every call
    pub fn remote_desired_capabilities(&self) -> Result<Option<Vec<String>>> {
        match &self.remote {
            Some(remote) => decode_symbols(&remote.desired_capabilities),
            None => Ok(None),
        }
    }

    /// Decoded from the peer's OPEN on every call
    pub fn remote_properties(&self) -> Result<Option<BTreeMap<String, AmqpValue>>> {
        match &self.remote {
            Some(remote) => decode_properties(&remote.properties),
            None => Ok(None),
        }
    }

    /// Peer's idle timeout in seconds, exact.
    ///
    /// `None` without a bound transport or when the peer advertised none.
    pub fn idle_timeout(&self) -> Option<Ratio<u64>> {
        let millis = self.transport.as_ref()?.remote_idle_timeout()?;
        if millis == 0 {
            return None;
        }
        Some(Ratio::new(u64::from(millis), 1000))
    }

    /// Our advertised idle timeout in milliseconds
    pub fn local_idle_timeout(&self) -> Option<u32> {
        self.idle_timeout
    }

    pub fn bind(&mut self, transport: Transport) -> Result<()> {
        if self.transport.is_some() {
            return Err(Error::invalid_state(format!("{} already has a transport", self.id)));
        }
        self.transport = Some(transport);
        self.push_idle_timeout();
        // The peer's OPEN may have arrived before the transport
        if let (Some(transport), Some(remote)) = (self.transport.as_mut(), self.remote.as_ref()) {
            if remote.idle_timeout.is_some() {
                transport.set_remote_idle_timeout(remote.idle_timeout);
            }
        }
        debug!("{} bound to transport", self.id);
        Ok(())
    }

    pub fn unbind(&mut self) -> Option<Transport> {
        let transport = self.transport.take();
        if transport.is_some() {
            debug!("{} unbound from transport", self.id);
        }
        transport
    }

    pub fn transport(&self) -> Option<&Transport> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut Transport> {
        self.transport.as_mut()
    }

    fn link_prefix(&self) -> &str {
        self.link_prefix.as_deref()
            .or(self.container_id.as_deref())
            .or(self.container.as_deref())
            .unwrap_or_default()
    }

    /// Next link name: `<prefix>/<hex counter>`.
    ///
    /// The counter only moves forward, so names are never repeated on
    /// this connection even after links are freed.
    pub fn generate_link_name(&mut self) -> String {
        let name = format!("{}/{:x}", self.link_prefix(), self.link_counter);
        self.link_counter += 1;
        name
    }

    /// Create a session, open it locally and return its handle
    pub fn open_session(&mut self) -> Result<SessionId> {
        let id = self.insert_session()?;
        if let Some(session) = self.sessions.get_mut(&id.index()) {
            session.open();
        }
        Ok(id)
    }

    /// The connection's default session, created and opened on first use
    pub fn default_session(&mut self) -> Result<SessionId> {
        if let Some(id) = self.default_session {
            return Ok(id);
        }
        let id = self.open_session()?;
        self.default_session = Some(id);
        Ok(id)
    }

    /// Add a session in its initial state on the lowest free channel
    pub(super) fn insert_session(&mut self) -> Result<SessionId> {
        let channel = (0..=u16::MAX)
            .find(|ch| self.sessions.values().all(|s| s.channel() != *ch))
            .ok_or_else(|| Error::invalid_state(format!("{} has no free channels", self.id)))?;

        let id = SessionId::new(self.id, self.next_session);
        self.next_session += 1;
        self.sessions.insert(id.index(), Session::new(id, channel));
        self.session_order.push(id);
        debug!("Created {} on channel {}", id, channel);
        Ok(id)
    }

    pub fn session(&self, id: SessionId) -> Result<&Session> {
        self.check_owner(id.connection(), &id)?;
        self.sessions.get(&id.index())
            .ok_or_else(|| Error::unknown_endpoint(format!("{} has been freed", id)))
    }

    pub fn session_mut(&mut self, id: SessionId) -> Result<&mut Session> {
        self.check_owner(id.connection(), &id)?;
        self.sessions.get_mut(&id.index())
            .ok_or_else(|| Error::unknown_endpoint(format!("{} has been freed", id)))
    }

    pub fn link(&self, id: LinkId) -> Result<&Link> {
        self.check_owner(id.connection(), &id)?;
        self.links.get(&id.index())
            .ok_or_else(|| Error::unknown_endpoint(format!("{} has been freed", id)))
    }

    pub fn link_mut(&mut self, id: LinkId) -> Result<&mut Link> {
        self.check_owner(id.connection(), &id)?;
        self.links.get_mut(&id.index())
            .ok_or_else(|| Error::unknown_endpoint(format!("{} has been freed", id)))
    }

    fn check_owner(&self, owner: ConnectionId, what: &dyn std::fmt::Display) -> Result<()> {
        if owner != self.id {
            return Err(Error::unknown_endpoint(format!(
                "{} belongs to {}, not {}",
                what, owner, self.id
            )));
        }
        Ok(())
    }

    /// Create and open a sending link on `session`
    pub fn open_sender(&mut self, session: SessionId, options: LinkOptions) -> Result<LinkId> {
        self.open_link(session, Role::Sender, options)
    }

    /// Create and open a receiving link on `session`
    pub fn open_receiver(&mut self, session: SessionId, options: LinkOptions) -> Result<LinkId> {
        self.open_link(session, Role::Receiver, options)
    }

    fn open_link(&mut self, session: SessionId, role: Role, mut options: LinkOptions) -> Result<LinkId> {
        self.session(session)?;
        let name = match options.name.take() {
            Some(name) => {
                if self.link_name_in_use(role, &name) {
                    return Err(Error::invalid_state(format!(
                        "A {:?} link named '{}' already exists",
                        role, name
                    )));
                }
                name
            }
            // Skip counter values the caller already took as explicit names
            None => loop {
                let name = self.generate_link_name();
                if !self.link_name_in_use(role, &name) {
                    break name;
                }
            },
        };

        let id = self.insert_link(session, role, name, options)?;
        if let Some(link) = self.links.get_mut(&id.index()) {
            link.open();
        }
        Ok(id)
    }

    fn link_name_in_use(&self, role: Role, name: &str) -> bool {
        self.links.values().any(|l| l.role() == role && l.name() == name)
    }

    /// Add a link in its initial state to `session`
    pub(super) fn insert_link(
        &mut self,
        session: SessionId,
        role: Role,
        name: String,
        options: LinkOptions,
    ) -> Result<LinkId> {
        let id = LinkId::new(self.id, self.next_link);
        let handle = self.session_mut(session)?.add_link(id);
        self.next_link += 1;

        debug!("Created {} {:?} '{}' on {} with handle {}", id, role, name, session, handle);
        self.links.insert(id.index(), Link::new(id, session, role, name, handle, options));
        self.link_order.push(id);
        Ok(id)
    }

    /// Sessions in creation order whose state matches `mask`
    pub fn each_session(&self, mask: EndpointState) -> Sessions<'_> {
        Sessions::new(&self.session_order, &self.sessions, mask)
    }

    /// Links of every session in creation order whose state matches `mask`
    pub fn each_link(&self, mask: EndpointState) -> Links<'_> {
        Links::new(&self.link_order, &self.links, mask, None)
    }

    /// Links of one session in creation order whose state matches `mask`
    pub fn session_links(&self, session: SessionId, mask: EndpointState) -> Result<Links<'_>> {
        let session = self.session(session)?;
        Ok(Links::new(session.links(), &self.links, mask, None))
    }

    pub fn senders(&self) -> Links<'_> {
        Links::new(&self.link_order, &self.links, EndpointState::ANY, Some(Role::Sender))
    }

    pub fn receivers(&self) -> Links<'_> {
        Links::new(&self.link_order, &self.links, EndpointState::ANY, Some(Role::Receiver))
    }

    /// Destroy a link whose sides are both closed or never opened
    pub fn free_link(&mut self, id: LinkId) -> Result<()> {
        let link = self.link(id)?;
        if !link.lifecycle().is_settled() {
            return Err(Error::invalid_state(format!(
                "Cannot free {} in state {}",
                id,
                link.state()
            )));
        }
        let session = link.session();

        if let Some(owner) = self.sessions.get_mut(&session.index()) {
            owner.remove_link(id);
        }
        self.links.remove(&id.index());
        self.link_order.retain(|l| *l != id);
        debug!("Freed {}", id);
        Ok(())
    }

    /// Destroy a settled session together with all of its links
    pub fn free_session(&mut self, id: SessionId) -> Result<()> {
        let session = self.session(id)?;
        if !session.lifecycle().is_settled() {
            return Err(Error::invalid_state(format!(
                "Cannot free {} in state {}",
                id,
                session.state()
            )));
        }
        let links = session.links().to_vec();

        for link in &links {
            self.links.remove(&link.index());
        }
        self.link_order.retain(|l| !links.contains(l));
        self.sessions.remove(&id.index());
        self.session_order.retain(|s| *s != id);
        if self.default_session == Some(id) {
            self.default_session = None;
        }
        debug!("Freed {} and {} links", id, links.len());
        Ok(())
    }
}

impl Endpoint for Connection {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn label(&self) -> String {
        self.id.to_string()
    }

    /// Apply staged configuration and go LOCAL_ACTIVE; no-op unless
    /// LOCAL_UNINIT
    fn open(&mut self) {
        if !self.lifecycle.state().is_local_uninit() {
            trace!("{} open ignored in state {}", self.id, self.lifecycle.state());
            return;
        }
        self.apply_pending();
        self.lifecycle.open_local();
        debug!("{} opened locally", self.id);
    }
}

fn encode_symbols(symbols: &[String]) -> Result<Data> {
    let mut data = Data::new();
    let array = symbols.iter().cloned().map(AmqpValue::Symbol).collect();
    data.put(&AmqpValue::Array(array))?;
    Ok(data)
}

/// Capabilities are a single symbol or an array/list of symbols
fn decode_symbols(data: &Data) -> Result<Option<Vec<String>>> {
    let value = match data.get()? {
        None | Some(AmqpValue::Null) => return Ok(None),
        Some(value) => value,
    };

    match value {
        AmqpValue::Symbol(symbol) => Ok(Some(vec![symbol])),
        AmqpValue::Array(items) | AmqpValue::List(items) => items
            .into_iter()
            .map(|item| match item {
                AmqpValue::Symbol(symbol) => Ok(symbol),
                other => Err(Error::decode(format!(
                    "Capability must be a symbol, got {}",
                    other.type_name()
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        other => Err(Error::decode(format!(
            "Capabilities must be symbols, got {}",
            other.type_name()
        ))),
    }
}

fn decode_properties(data: &Data) -> Result<Option<BTreeMap<String, AmqpValue>>> {
    match data.get()? {
        None | Some(AmqpValue::Null) => Ok(None),
        Some(AmqpValue::Map(map)) => Ok(Some(map)),
        Some(other) => Err(Error::decode(format!(
            "Properties must be a map, got {}",
            other.type_name()
        ))),
    }
}
