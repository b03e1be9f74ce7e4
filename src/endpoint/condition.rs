use std::collections::BTreeMap;
use std::fmt;
use crate::codec::AmqpValue;

/// Standard AMQP 1.0 error condition names
pub mod names {
    pub const INTERNAL_ERROR: &str = "amqp:internal-error";
    pub const NOT_FOUND: &str = "amqp:not-found";
    pub const UNAUTHORIZED_ACCESS: &str = "amqp:unauthorized-access";
    pub const DECODE_ERROR: &str = "amqp:decode-error";
    pub const RESOURCE_LIMIT_EXCEEDED: &str = "amqp:resource-limit-exceeded";
    pub const NOT_ALLOWED: &str = "amqp:not-allowed";
    pub const INVALID_FIELD: &str = "amqp:invalid-field";
    pub const NOT_IMPLEMENTED: &str = "amqp:not-implemented";
    pub const RESOURCE_LOCKED: &str = "amqp:resource-locked";
    pub const PRECONDITION_FAILED: &str = "amqp:precondition-failed";
    pub const RESOURCE_DELETED: &str = "amqp:resource-deleted";
    pub const ILLEGAL_STATE: &str = "amqp:illegal-state";
    pub const FRAME_SIZE_TOO_SMALL: &str = "amqp:frame-size-too-small";

    pub const CONNECTION_FORCED: &str = "amqp:connection:forced";
    pub const FRAMING_ERROR: &str = "amqp:connection:framing-error";
    pub const CONNECTION_REDIRECT: &str = "amqp:connection:redirect";

    pub const WINDOW_VIOLATION: &str = "amqp:session:window-violation";
    pub const ERRANT_LINK: &str = "amqp:session:errant-link";
    pub const HANDLE_IN_USE: &str = "amqp:session:handle-in-use";
    pub const UNATTACHED_HANDLE: &str = "amqp:session:unattached-handle";

    pub const DETACH_FORCED: &str = "amqp:link:detach-forced";
    pub const TRANSFER_LIMIT_EXCEEDED: &str = "amqp:link:transfer-limit-exceeded";
    pub const MESSAGE_SIZE_EXCEEDED: &str = "amqp:link:message-size-exceeded";
    pub const LINK_REDIRECT: &str = "amqp:link:redirect";
    pub const STOLEN: &str = "amqp:link:stolen";
}

/// A protocol-level error attached to one side of an endpoint.
///
/// Conditions are data: they are never raised, only stored and inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    name: String,
    description: String,
    info: Option<BTreeMap<String, AmqpValue>>,
}

impl Condition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Condition {
            name: name.into(),
            description: description.into(),
            info: None,
        }
    }

    /// Attach extra diagnostic information
    pub fn with_info(mut self, info: BTreeMap<String, AmqpValue>) -> Self {
        self.info = Some(info);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn info(&self) -> Option<&BTreeMap<String, AmqpValue>> {
        self.info.as_ref()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let cond = Condition::new(names::CONNECTION_FORCED, "broker shutting down");
        assert_eq!(cond.to_string(), "amqp:connection:forced: broker shutting down");

        let bare = Condition::new(names::NOT_FOUND, "");
        assert_eq!(bare.to_string(), "amqp:not-found");
    }

    #[test]
    fn test_info() {
        let mut info = BTreeMap::new();
        info.insert("address".to_string(), AmqpValue::from("queue.a"));
        let cond = Condition::new(names::NOT_FOUND, "no such queue").with_info(info);

        let address = cond.info().and_then(|i| i.get("address")).and_then(AmqpValue::as_str);
        assert_eq!(address, Some("queue.a"));
    }
}
