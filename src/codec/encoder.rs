use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use crate::codec::value::{codes, AmqpValue};
use crate::{ByteBuffer, Error, Result};

pub struct Encoder {
    buffer: ByteBuffer,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Encoder {
            buffer: ByteBuffer::with_capacity(256),
        }
    }

    /// Encode a value using its most compact constructor
    pub fn encode(&mut self, value: &AmqpValue) -> Result<()> {
        match value {
            AmqpValue::Null => self.buffer.write_u8(codes::NULL),
            AmqpValue::Boolean(true) => self.buffer.write_u8(codes::BOOLEAN_TRUE),
            AmqpValue::Boolean(false) => self.buffer.write_u8(codes::BOOLEAN_FALSE),
            AmqpValue::Uint(0) => self.buffer.write_u8(codes::UINT0),
            AmqpValue::Uint(n) if *n <= 0xff => {
                self.buffer.write_u8(codes::SMALL_UINT);
                self.buffer.write_u8(*n as u8);
            }
            AmqpValue::Ulong(0) => self.buffer.write_u8(codes::ULONG0),
            AmqpValue::Ulong(n) if *n <= 0xff => {
                self.buffer.write_u8(codes::SMALL_ULONG);
                self.buffer.write_u8(*n as u8);
            }
            AmqpValue::Int(n) if i8::try_from(*n).is_ok() => {
                self.buffer.write_u8(codes::SMALL_INT);
                self.buffer.write_u8(*n as i8 as u8);
            }
            AmqpValue::Long(n) if i8::try_from(*n).is_ok() => {
                self.buffer.write_u8(codes::SMALL_LONG);
                self.buffer.write_u8(*n as i8 as u8);
            }
            AmqpValue::Binary(bytes) if bytes.len() <= 0xff => {
                self.buffer.write_u8(codes::VBIN8);
                self.write_variable8(bytes);
            }
            AmqpValue::String(s) if s.len() <= 0xff => {
                self.buffer.write_u8(codes::STR8);
                self.write_variable8(s.as_bytes());
            }
            AmqpValue::Symbol(s) if s.len() <= 0xff => {
                self.buffer.write_u8(codes::SYM8);
                self.write_variable8(s.as_bytes());
            }
            AmqpValue::List(items) if items.is_empty() => self.buffer.write_u8(codes::LIST0),
            AmqpValue::List(items) => self.encode_list(items)?,
            AmqpValue::Map(map) => self.encode_map(map)?,
            AmqpValue::Array(items) => self.encode_array(items)?,
            other => {
                let code = wide_constructor(other)?;
                self.buffer.write_u8(code);
                self.write_body(code, other)?;
            }
        }
        Ok(())
    }

    fn write_variable8(&mut self, bytes: &[u8]) {
        self.buffer.write_u8(bytes.len() as u8);
        self.buffer.write_bytes(bytes);
    }

    fn write_variable32(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.write_u32_be(length_u32(bytes.len())?);
        self.buffer.write_bytes(bytes);
        Ok(())
    }

    fn write_timestamp(&mut self, ts: &DateTime<Utc>) {
        self.buffer.write_i64_be(ts.timestamp_millis());
    }

    /// Write the value body for a fixed constructor (no format code)
    fn write_body(&mut self, code: u8, value: &AmqpValue) -> Result<()> {
        match (code, value) {
            (codes::NULL, AmqpValue::Null) => {}
            (codes::BOOLEAN, AmqpValue::Boolean(b)) => self.buffer.write_u8(u8::from(*b)),
            (codes::UINT, AmqpValue::Uint(n)) => self.buffer.write_u32_be(*n),
            (codes::ULONG, AmqpValue::Ulong(n)) => self.buffer.write_u64_be(*n),
            (codes::INT, AmqpValue::Int(n)) => self.buffer.write_i32_be(*n),
            (codes::LONG, AmqpValue::Long(n)) => self.buffer.write_i64_be(*n),
            (codes::DOUBLE, AmqpValue::Double(d)) => self.buffer.write_f64_be(*d),
            (codes::TIMESTAMP, AmqpValue::Timestamp(ts)) => self.write_timestamp(ts),
            (codes::VBIN32, AmqpValue::Binary(bytes)) => self.write_variable32(bytes)?,
            (codes::STR32, AmqpValue::String(s)) => self.write_variable32(s.as_bytes())?,
            (codes::SYM32, AmqpValue::Symbol(s)) => self.write_variable32(s.as_bytes())?,
            _ => {
                return Err(Error::encode(format!(
                    "Cannot write {} with constructor 0x{:02x}",
                    value.type_name(),
                    code
                )));
            }
        }
        Ok(())
    }

    fn encode_list(&mut self, items: &[AmqpValue]) -> Result<()> {
        let mut inner = Encoder::new();
        for item in items {
            inner.encode(item)?;
        }
        self.write_compound(codes::LIST8, codes::LIST32, items.len(), inner.buffer.as_slice())
    }

    fn encode_map(&mut self, map: &BTreeMap<String, AmqpValue>) -> Result<()> {
        let mut inner = Encoder::new();
        for (key, value) in map {
            inner.encode(&AmqpValue::Symbol(key.clone()))?;
            inner.encode(value)?;
        }
        self.write_compound(codes::MAP8, codes::MAP32, map.len() * 2, inner.buffer.as_slice())
    }

    /// Write a list or map: size covers the count field plus the elements
    fn write_compound(&mut self, small: u8, large: u8, count: usize, body: &[u8]) -> Result<()> {
        if count <= 0xff && body.len() < 0xff {
            self.buffer.write_u8(small);
            self.buffer.write_u8((body.len() + 1) as u8);
            self.buffer.write_u8(count as u8);
        } else {
            self.buffer.write_u8(large);
            self.buffer.write_u32_be(length_u32(body.len() + 4)?);
            self.buffer.write_u32_be(length_u32(count)?);
        }
        self.buffer.write_bytes(body);
        Ok(())
    }

    fn encode_array(&mut self, items: &[AmqpValue]) -> Result<()> {
        let constructor = match items.first() {
            Some(first) => array_constructor(first)?,
            None => codes::NULL,
        };

        let mut inner = Encoder::new();
        inner.buffer.write_u8(constructor);
        for item in items {
            if array_constructor(item)? != constructor {
                return Err(Error::encode(format!(
                    "Array elements must share one type, found {} among 0x{:02x}",
                    item.type_name(),
                    constructor
                )));
            }
            inner.write_body(constructor, item)?;
        }
        self.write_compound(codes::ARRAY8, codes::ARRAY32, items.len(), inner.buffer.as_slice())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_vec()
    }
}

/// Fixed-width constructor used when compact forms don't apply
fn wide_constructor(value: &AmqpValue) -> Result<u8> {
    let code = match value {
        AmqpValue::Null => codes::NULL,
        AmqpValue::Boolean(_) => codes::BOOLEAN,
        AmqpValue::Uint(_) => codes::UINT,
        AmqpValue::Ulong(_) => codes::ULONG,
        AmqpValue::Int(_) => codes::INT,
        AmqpValue::Long(_) => codes::LONG,
        AmqpValue::Double(_) => codes::DOUBLE,
        AmqpValue::Timestamp(_) => codes::TIMESTAMP,
        AmqpValue::Binary(_) => codes::VBIN32,
        AmqpValue::String(_) => codes::STR32,
        AmqpValue::Symbol(_) => codes::SYM32,
        AmqpValue::List(_) | AmqpValue::Array(_) | AmqpValue::Map(_) => {
            return Err(Error::encode(format!(
                "No fixed constructor for {}",
                value.type_name()
            )));
        }
    };
    Ok(code)
}

fn array_constructor(value: &AmqpValue) -> Result<u8> {
    wide_constructor(value)
        .map_err(|_| Error::encode(format!("Arrays of {} are not supported", value.type_name())))
}

fn length_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::encode(format!("Length {} exceeds u32", len)))
}

/// Encode a single value into a fresh byte vector
pub fn encode(value: &AmqpValue) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}
