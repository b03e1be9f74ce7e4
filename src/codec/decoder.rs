use std::collections::BTreeMap;
use chrono::DateTime;
use crate::codec::value::{codes, AmqpValue};
use crate::{ByteBuffer, Error, Result};

/// Deepest nesting of lists, maps and arrays accepted from a peer
pub const MAX_NESTING_DEPTH: usize = 64;

/// Largest array of bodiless elements (null, true, uint0, ...) accepted.
/// Such elements take no bytes, so the compound size cannot bound them.
pub const MAX_EMPTY_ELEMENTS: usize = 1024;

pub struct Decoder<'a> {
    buffer: &'a mut ByteBuffer,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buffer: &'a mut ByteBuffer) -> Self {
        Decoder { buffer, depth: 0 }
    }

    /// Check if decoder has remaining data to decode
    pub fn has_remaining(&self) -> bool {
        self.buffer.remaining() > 0
    }

    pub fn decode(&mut self) -> Result<AmqpValue> {
        let code = self.buffer.read_u8()?;
        self.decode_body(code)
    }

    fn decode_body(&mut self, code: u8) -> Result<AmqpValue> {
        let value = match code {
            codes::NULL => AmqpValue::Null,
            codes::BOOLEAN_TRUE => AmqpValue::Boolean(true),
            codes::BOOLEAN_FALSE => AmqpValue::Boolean(false),
            codes::BOOLEAN => match self.buffer.read_u8()? {
                0 => AmqpValue::Boolean(false),
                1 => AmqpValue::Boolean(true),
                other => {
                    return Err(Error::decode(format!("Invalid boolean byte: 0x{:02x}", other)));
                }
            },
            codes::UINT0 => AmqpValue::Uint(0),
            codes::SMALL_UINT => AmqpValue::Uint(u32::from(self.buffer.read_u8()?)),
            codes::UINT => AmqpValue::Uint(self.buffer.read_u32_be()?),
            codes::ULONG0 => AmqpValue::Ulong(0),
            codes::SMALL_ULONG => AmqpValue::Ulong(u64::from(self.buffer.read_u8()?)),
            codes::ULONG => AmqpValue::Ulong(self.buffer.read_u64_be()?),
            codes::SMALL_INT => AmqpValue::Int(i32::from(self.buffer.read_u8()? as i8)),
            codes::INT => AmqpValue::Int(self.buffer.read_i32_be()?),
            codes::SMALL_LONG => AmqpValue::Long(i64::from(self.buffer.read_u8()? as i8)),
            codes::LONG => AmqpValue::Long(self.buffer.read_i64_be()?),
            codes::DOUBLE => AmqpValue::Double(self.buffer.read_f64_be()?),
            codes::TIMESTAMP => self.decode_timestamp()?,
            codes::VBIN8 | codes::VBIN32 => {
                let len = self.read_width(code == codes::VBIN8)?;
                AmqpValue::Binary(self.buffer.read_bytes(len)?)
            }
            codes::STR8 | codes::STR32 => {
                let len = self.read_width(code == codes::STR8)?;
                AmqpValue::String(self.read_utf8(len, "string")?)
            }
            codes::SYM8 | codes::SYM32 => {
                let len = self.read_width(code == codes::SYM8)?;
                AmqpValue::Symbol(self.read_utf8(len, "symbol")?)
            }
            codes::LIST0 => AmqpValue::List(Vec::new()),
            codes::LIST8 | codes::LIST32 => {
                AmqpValue::List(self.nested(|d| d.decode_list(code == codes::LIST8))?)
            }
            codes::MAP8 | codes::MAP32 => self.nested(|d| d.decode_map(code == codes::MAP8))?,
            codes::ARRAY8 | codes::ARRAY32 => self.nested(|d| d.decode_array(code == codes::ARRAY8))?,
            _ => return Err(Error::decode(format!("Unknown format code: 0x{:02x}", code))),
        };
        Ok(value)
    }

    /// Run `f` one compound level deeper
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Error::decode(format!(
                "Nesting deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Read a one-byte or four-byte size field
    fn read_width(&mut self, small: bool) -> Result<usize> {
        if small {
            Ok(usize::from(self.buffer.read_u8()?))
        } else {
            Ok(self.buffer.read_u32_be()? as usize)
        }
    }

    fn read_utf8(&mut self, len: usize, what: &str) -> Result<String> {
        let bytes = self.buffer.read_bytes(len)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::decode(format!("Invalid UTF-8 in {}: {}", what, e)))
    }

    fn decode_timestamp(&mut self) -> Result<AmqpValue> {
        let millis = self.buffer.read_i64_be()?;
        DateTime::from_timestamp_millis(millis)
            .map(AmqpValue::Timestamp)
            .ok_or_else(|| Error::decode(format!("Timestamp out of range: {}", millis)))
    }

    /// Read size and count of a compound, returning (count, end offset)
    fn read_compound_header(&mut self, small: bool) -> Result<(usize, usize)> {
        let size = self.read_width(small)?;
        let start = self.buffer.position();
        if !self.buffer.has_remaining(size) {
            return Err(Error::decode(format!(
                "Compound of {} bytes exceeds remaining {}",
                size,
                self.buffer.remaining()
            )));
        }
        let count = self.read_width(small)?;
        Ok((count, start + size))
    }

    /// Every element with a body takes at least one byte before `end`
    fn check_count(&self, count: usize, end: usize, what: &str) -> Result<()> {
        let available = end.saturating_sub(self.buffer.position());
        if count > available {
            return Err(Error::decode(format!(
                "{} claims {} elements in {} bytes",
                what, count, available
            )));
        }
        Ok(())
    }

    fn expect_end(&self, end: usize, what: &str) -> Result<()> {
        if self.buffer.position() != end {
            return Err(Error::decode(format!(
                "{} size mismatch: ended at {}, expected {}",
                what,
                self.buffer.position(),
                end
            )));
        }
        Ok(())
    }

    fn decode_list(&mut self, small: bool) -> Result<Vec<AmqpValue>> {
        let (count, end) = self.read_compound_header(small)?;
        self.check_count(count, end, "List")?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.decode()?);
        }
        self.expect_end(end, "List")?;
        Ok(items)
    }

    fn decode_map(&mut self, small: bool) -> Result<AmqpValue> {
        let (count, end) = self.read_compound_header(small)?;
        if count % 2 != 0 {
            return Err(Error::decode(format!("Map with odd element count {}", count)));
        }
        self.check_count(count, end, "Map")?;

        let mut map = BTreeMap::new();
        for _ in 0..count / 2 {
            let key = match self.decode()? {
                AmqpValue::Symbol(key) | AmqpValue::String(key) => key,
                other => {
                    return Err(Error::decode(format!(
                        "Map key must be a symbol or string, got {}",
                        other.type_name()
                    )));
                }
            };
            let value = self.decode()?;
            map.insert(key, value);
        }
        self.expect_end(end, "Map")?;
        Ok(AmqpValue::Map(map))
    }

    fn decode_array(&mut self, small: bool) -> Result<AmqpValue> {
        let (count, end) = self.read_compound_header(small)?;
        let constructor = self.buffer.read_u8()?;
        if is_bodiless(constructor) {
            if count > MAX_EMPTY_ELEMENTS {
                return Err(Error::decode(format!(
                    "Array of {} bodiless 0x{:02x} elements exceeds {}",
                    count, constructor, MAX_EMPTY_ELEMENTS
                )));
            }
        } else {
            self.check_count(count, end, "Array")?;
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.decode_body(constructor)?);
        }
        self.expect_end(end, "Array")?;
        Ok(AmqpValue::Array(items))
    }
}

/// Constructors whose encoding has no bytes after the format code
fn is_bodiless(code: u8) -> bool {
    matches!(
        code,
        codes::NULL
            | codes::BOOLEAN_TRUE
            | codes::BOOLEAN_FALSE
            | codes::UINT0
            | codes::ULONG0
            | codes::LIST0
    )
}

/// Decode exactly one value, rejecting trailing bytes
pub fn decode(bytes: &[u8]) -> Result<AmqpValue> {
    let mut buffer = ByteBuffer::new(bytes.to_vec());
    let mut decoder = Decoder::new(&mut buffer);
    let value = decoder.decode()?;
    if decoder.has_remaining() {
        return Err(Error::decode(format!(
            "{} trailing bytes after value",
            buffer.remaining()
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    #[test]
    fn test_decode_symbol_array() {
        let bytes = [0xe0, 13, 2, 0xb3, 0, 0, 0, 1, b'a', 0, 0, 0, 2, b'b', b'c'];
        assert_eq!(
            decode(&bytes).unwrap(),
            AmqpValue::Array(vec![AmqpValue::symbol("a"), AmqpValue::symbol("bc")])
        );
    }

    #[test]
    fn test_decode_sym8_array() {
        // Peers commonly use the compact symbol constructor inside arrays
        let bytes = [0xe0, 6, 2, 0xa3, 1, b'x', 1, b'y'];
        assert_eq!(
            decode(&bytes).unwrap(),
            AmqpValue::Array(vec![AmqpValue::symbol("x"), AmqpValue::symbol("y")])
        );
    }

    #[test]
    fn test_nested_properties() {
        let mut inner = BTreeMap::new();
        inner.insert("ts".to_string(), AmqpValue::Timestamp(DateTime::from_timestamp_millis(1_700_000_000_123).unwrap()));
        inner.insert("big".to_string(), AmqpValue::Ulong(u64::MAX));
        let mut map = BTreeMap::new();
        map.insert("nested".to_string(), AmqpValue::Map(inner));
        map.insert("tags".to_string(), AmqpValue::List(vec![AmqpValue::Int(-70000), AmqpValue::Null]));
        map.insert("blob".to_string(), AmqpValue::Binary(vec![0u8; 400]));
        let value = AmqpValue::Map(map);

        assert_eq!(decode(&encode(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn test_unknown_code() {
        assert!(matches!(decode(&[0x00]), Err(Error::Decode(_))));
        assert!(matches!(decode(&[0xff]), Err(Error::Decode(_))));
    }

    #[test]
    fn test_truncated_input() {
        // str8 claims 5 bytes but only 2 follow
        assert!(matches!(decode(&[0xa1, 5, b'h', b'i']), Err(Error::Decode(_))));
        // list8 size runs past the end
        assert!(matches!(decode(&[0xc0, 10, 1, 0x40]), Err(Error::Decode(_))));
    }

    #[test]
    fn test_trailing_bytes() {
        assert!(matches!(decode(&[0x40, 0x40]), Err(Error::Decode(_))));
    }

    #[test]
    fn test_invalid_map() {
        // odd count
        assert!(matches!(decode(&[0xc1, 2, 1, 0x40]), Err(Error::Decode(_))));
        // integer key
        assert!(matches!(decode(&[0xc1, 4, 2, 0x52, 1, 0x40]), Err(Error::Decode(_))));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(decode(&[0xa3, 2, 0xc3, 0x28]), Err(Error::Decode(_))));
    }

    #[test]
    fn test_array_count_beyond_size() {
        // array32 of nulls claiming u32::MAX elements in 10 bytes
        let bytes = [0xf0, 0, 0, 0, 5, 0xff, 0xff, 0xff, 0xff, 0x40];
        assert!(matches!(decode(&bytes), Err(Error::Decode(_))));

        // uint elements need 4 bytes each, none are present
        assert!(matches!(decode(&[0xe0, 2, 200, 0x70]), Err(Error::Decode(_))));

        // list8 claiming more elements than its size allows
        assert!(matches!(decode(&[0xc0, 2, 50, 0x40]), Err(Error::Decode(_))));
    }

    #[test]
    fn test_small_array_of_nulls() {
        let bytes = [0xf0, 0, 0, 0, 5, 0, 0, 0, 3, 0x40];
        assert_eq!(
            decode(&bytes).unwrap(),
            AmqpValue::Array(vec![AmqpValue::Null; 3])
        );
    }

    fn nested_lists(levels: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(levels * 9 + 1);
        for level in (0..levels).rev() {
            // Each level wraps a 9-byte header per inner level plus the null
            let size = (level * 9 + 1 + 4) as u32;
            bytes.push(codes::LIST32);
            bytes.extend_from_slice(&size.to_be_bytes());
            bytes.extend_from_slice(&1u32.to_be_bytes());
        }
        bytes.push(codes::NULL);
        bytes
    }

    #[test]
    fn test_nesting_limit() {
        assert!(decode(&nested_lists(MAX_NESTING_DEPTH)).is_ok());
        assert!(matches!(
            decode(&nested_lists(MAX_NESTING_DEPTH + 1)),
            Err(Error::Decode(_))
        ));
        assert!(matches!(decode(&nested_lists(200_000)), Err(Error::Decode(_))));
    }
}
