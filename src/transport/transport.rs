/// Connection-facing view of the I/O transport.
///
/// The byte-level work (framing, sockets, SASL exchange) happens elsewhere;
/// this records what the endpoint layer needs to know about it.
#[derive(Debug, Clone, Default)]
pub struct Transport {
    /// Idle timeout we advertise, milliseconds
    idle_timeout: Option<u32>,

    /// Idle timeout the peer advertised in its OPEN, milliseconds
    remote_idle_timeout: Option<u32>,

    /// Identity established by the SASL layer for incoming connections
    authenticated_user: Option<String>,
}

impl Transport {
    pub fn new() -> Self {
        Transport::default()
    }

    pub fn idle_timeout(&self) -> Option<u32> {
        self.idle_timeout
    }

    pub fn set_idle_timeout(&mut self, millis: Option<u32>) {
        self.idle_timeout = millis;
    }

    pub fn remote_idle_timeout(&self) -> Option<u32> {
        self.remote_idle_timeout
    }

    pub fn set_remote_idle_timeout(&mut self, millis: Option<u32>) {
        self.remote_idle_timeout = millis;
    }

    pub fn authenticated_user(&self) -> Option<&str> {
        self.authenticated_user.as_deref()
    }

    pub fn set_authenticated_user(&mut self, user: impl Into<String>) {
        self.authenticated_user = Some(user.into());
    }
}
