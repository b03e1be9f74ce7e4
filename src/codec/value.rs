use std::collections::BTreeMap;
use chrono::{DateTime, Utc};

/// AMQP 1.0 typed values understood by the endpoint layer
#[derive(Debug, Clone, PartialEq)]
pub enum AmqpValue {
    Null,
    Boolean(bool),
    Uint(u32),
    Ulong(u64),
    Int(i32),
    Long(i64),
    Double(f64),
    /// Millisecond precision on the wire
    Timestamp(DateTime<Utc>),
    Binary(Vec<u8>),
    String(String),
    Symbol(String),
    List(Vec<AmqpValue>),
    /// Homogeneous sequence; every element shares one constructor
    Array(Vec<AmqpValue>),
    /// Keys travel as symbols
    Map(BTreeMap<String, AmqpValue>),
}

// AMQP 1.0 format codes (part 1, section 1.6)
pub mod codes {
    pub const NULL: u8 = 0x40;
    pub const BOOLEAN: u8 = 0x56;
    pub const BOOLEAN_TRUE: u8 = 0x41;
    pub const BOOLEAN_FALSE: u8 = 0x42;
    pub const UINT0: u8 = 0x43;
    pub const SMALL_UINT: u8 = 0x52;
    pub const UINT: u8 = 0x70;
    pub const ULONG0: u8 = 0x44;
    pub const SMALL_ULONG: u8 = 0x53;
    pub const ULONG: u8 = 0x80;
    pub const SMALL_INT: u8 = 0x54;
    pub const INT: u8 = 0x71;
    pub const SMALL_LONG: u8 = 0x55;
    pub const LONG: u8 = 0x81;
    pub const DOUBLE: u8 = 0x82;
    pub const TIMESTAMP: u8 = 0x83;
    pub const VBIN8: u8 = 0xa0;
    pub const VBIN32: u8 = 0xb0;
    pub const STR8: u8 = 0xa1;
    pub const STR32: u8 = 0xb1;
    pub const SYM8: u8 = 0xa3;
    pub const SYM32: u8 = 0xb3;
    pub const LIST0: u8 = 0x45;
    pub const LIST8: u8 = 0xc0;
    pub const LIST32: u8 = 0xd0;
    pub const MAP8: u8 = 0xc1;
    pub const MAP32: u8 = 0xd1;
    pub const ARRAY8: u8 = 0xe0;
    pub const ARRAY32: u8 = 0xf0;
}

impl AmqpValue {
    /// Build a symbol value
    pub fn symbol(value: impl Into<String>) -> Self {
        AmqpValue::Symbol(value.into())
    }

    /// Build a string value
    pub fn string(value: impl Into<String>) -> Self {
        AmqpValue::String(value.into())
    }

    /// Extract string or symbol contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AmqpValue::String(s) | AmqpValue::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract symbol contents only
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            AmqpValue::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AmqpValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Widen any integer variant that fits in a u64
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AmqpValue::Uint(n) => Some(u64::from(*n)),
            AmqpValue::Ulong(n) => Some(*n),
            AmqpValue::Int(n) => u64::try_from(*n).ok(),
            AmqpValue::Long(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Elements of a list or an array
    pub fn as_sequence(&self) -> Option<&[AmqpValue]> {
        match self {
            AmqpValue::List(items) | AmqpValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, AmqpValue>> {
        match self {
            AmqpValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key in a map value
    pub fn get(&self, key: &str) -> Option<&AmqpValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AmqpValue::Null)
    }

    /// Name of the AMQP type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AmqpValue::Null => "null",
            AmqpValue::Boolean(_) => "boolean",
            AmqpValue::Uint(_) => "uint",
            AmqpValue::Ulong(_) => "ulong",
            AmqpValue::Int(_) => "int",
            AmqpValue::Long(_) => "long",
            AmqpValue::Double(_) => "double",
            AmqpValue::Timestamp(_) => "timestamp",
            AmqpValue::Binary(_) => "binary",
            AmqpValue::String(_) => "string",
            AmqpValue::Symbol(_) => "symbol",
            AmqpValue::List(_) => "list",
            AmqpValue::Array(_) => "array",
            AmqpValue::Map(_) => "map",
        }
    }
}

impl From<&str> for AmqpValue {
    fn from(value: &str) -> Self {
        AmqpValue::String(value.to_string())
    }
}

impl From<String> for AmqpValue {
    fn from(value: String) -> Self {
        AmqpValue::String(value)
    }
}

impl From<bool> for AmqpValue {
    fn from(value: bool) -> Self {
        AmqpValue::Boolean(value)
    }
}

impl From<u32> for AmqpValue {
    fn from(value: u32) -> Self {
        AmqpValue::Uint(value)
    }
}

impl From<u64> for AmqpValue {
    fn from(value: u64) -> Self {
        AmqpValue::Ulong(value)
    }
}

impl From<i64> for AmqpValue {
    fn from(value: i64) -> Self {
        AmqpValue::Long(value)
    }
}

impl<T: Into<AmqpValue>> From<Option<T>> for AmqpValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AmqpValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(AmqpValue::symbol("ANONYMOUS-RELAY").as_str(), Some("ANONYMOUS-RELAY"));
        assert_eq!(AmqpValue::string("x").as_symbol(), None);
        assert_eq!(AmqpValue::Int(-1).as_u64(), None);
        assert_eq!(AmqpValue::Uint(7).as_u64(), Some(7));
        assert!(AmqpValue::from(None::<&str>).is_null());
    }

    #[test]
    fn test_map_lookup() {
        let mut map = BTreeMap::new();
        map.insert("product".to_string(), AmqpValue::from("broker"));
        let value = AmqpValue::Map(map);

        assert_eq!(value.get("product").and_then(AmqpValue::as_str), Some("broker"));
        assert!(value.get("version").is_none());
    }
}
